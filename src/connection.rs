use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::client::{ConnectOptions, Transport};
use crate::conversion::{TypeRegistry, default_registry};
use crate::cursor::Cursor;
use crate::error::RqliteDbError;
use crate::types::Params;

/// A logical connection to the cluster.
///
/// One connection owns one transport and allows one outstanding request at a
/// time; concurrent callers should open separate connections. Cloning the
/// handle shares the underlying transport.
///
/// ```rust,no_run
/// use rqlite_client::prelude::*;
///
/// # async fn demo() -> Result<(), RqliteDbError> {
/// let conn = ConnectOptions::new("localhost", 4001).connect()?;
/// let mut cursor = conn.cursor();
/// cursor
///     .execute(
///         "insert into t(name) values (?)",
///         Some(vec![SqlValue::Text("foo".into())].into()),
///     )
///     .await?;
/// assert_eq!(cursor.rowcount(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Connection {
    transport: Arc<Mutex<Transport>>,
    registry: Arc<RwLock<TypeRegistry>>,
    parse_decltypes: bool,
    parse_colnames: bool,
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Open a connection with the given options.
    ///
    /// # Errors
    ///
    /// Returns `RqliteDbError::ConfigError` when the transport cannot be
    /// built.
    pub fn connect(options: ConnectOptions) -> Result<Self, RqliteDbError> {
        let transport = Transport::connect(&options)?;
        let registry = if options.private_registry {
            Arc::new(RwLock::new(TypeRegistry::default()))
        } else {
            default_registry()
        };
        Ok(Self {
            transport: Arc::new(Mutex::new(transport)),
            registry,
            parse_decltypes: options.parse_decltypes,
            parse_colnames: options.parse_colnames,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A new cursor over this connection.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.clone())
    }

    /// Convenience: execute on a fresh cursor and return it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Cursor::execute`].
    pub async fn execute(
        &self,
        sql: &str,
        params: Option<Params>,
    ) -> Result<Cursor, RqliteDbError> {
        let mut cursor = self.cursor();
        cursor.execute(sql, params).await?;
        Ok(cursor)
    }

    /// No-op: the remote store auto-commits every statement.
    pub fn commit(&self) {}

    /// No-op: the remote store auto-commits every statement.
    pub fn rollback(&self) {}

    /// Close the connection. Further operations on it (or on its cursors)
    /// fail with an operational error.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn transport(&self) -> Arc<Mutex<Transport>> {
        self.transport.clone()
    }

    pub(crate) fn registry(&self) -> Arc<RwLock<TypeRegistry>> {
        self.registry.clone()
    }

    pub(crate) fn parse_decltypes(&self) -> bool {
        self.parse_decltypes
    }

    pub(crate) fn parse_colnames(&self) -> bool {
        self.parse_colnames
    }
}
