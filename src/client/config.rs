use std::time::Duration;

use crate::connection::Connection;
use crate::error::RqliteDbError;

/// URL scheme used to reach the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Read consistency level passed through on query requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadConsistency {
    None,
    Weak,
    Strong,
}

impl ReadConsistency {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReadConsistency::None => "none",
            ReadConsistency::Weak => "weak",
            ReadConsistency::Strong => "strong",
        }
    }
}

/// Options for connecting to a cluster node.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Basic-auth credentials, sent on every request when both are set.
    pub user: Option<String>,
    pub password: Option<String>,
    /// Total per-request timeout; `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Maximum leader redirects to follow per request; `None` is unlimited.
    pub max_redirects: Option<usize>,
    /// Resolve converters by declared column type.
    pub parse_decltypes: bool,
    /// Resolve converters by bracketed column-name hints.
    pub parse_colnames: bool,
    /// Skip TLS certificate verification (self-signed test clusters).
    pub accept_invalid_certs: bool,
    /// Give this connection its own registry instead of the shared default.
    pub private_registry: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: "localhost".to_string(),
            port: 4001,
            user: None,
            password: None,
            connect_timeout: None,
            max_redirects: None,
            parse_decltypes: false,
            parse_colnames: false,
            accept_invalid_certs: false,
            private_registry: false,
        }
    }
}

impl ConnectOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = Some(max_redirects);
        self
    }

    #[must_use]
    pub fn with_parse_decltypes(mut self, enabled: bool) -> Self {
        self.parse_decltypes = enabled;
        self
    }

    #[must_use]
    pub fn with_parse_colnames(mut self, enabled: bool) -> Self {
        self.parse_colnames = enabled;
        self
    }

    #[must_use]
    pub fn with_accept_invalid_certs(mut self, enabled: bool) -> Self {
        self.accept_invalid_certs = enabled;
        self
    }

    #[must_use]
    pub fn with_private_registry(mut self, enabled: bool) -> Self {
        self.private_registry = enabled;
        self
    }

    /// Open a connection with these options.
    ///
    /// # Errors
    ///
    /// Returns `RqliteDbError::ConfigError` when the underlying HTTP client
    /// cannot be built.
    pub fn connect(self) -> Result<Connection, RqliteDbError> {
        Connection::connect(self)
    }
}
