use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::binder::{bind, bind_batch, is_read_command, sql_command};
use crate::client::ReadConsistency;
use crate::connection::Connection;
use crate::conversion::read_registry;
use crate::error::RqliteDbError;
use crate::results::decode::{
    DecodeContext, ResponseEnvelope, decode_envelope, envelope_from_response,
};
use crate::results::{ColumnDescriptor, Row};
use crate::schema::{DecltypeCache, table_from_select};
use crate::types::Params;

/// Per-call execution options, passed through to the cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Queue the write for asynchronous application (fire-and-forget).
    pub queue: bool,
    /// Wait for the write to be applied before responding.
    pub wait: bool,
    /// Read consistency level for query requests.
    pub consistency: Option<ReadConsistency>,
}

impl ExecuteOptions {
    #[must_use]
    pub fn with_queue(mut self, queue: bool) -> Self {
        self.queue = queue;
        self
    }

    #[must_use]
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    #[must_use]
    pub fn with_consistency(mut self, consistency: ReadConsistency) -> Self {
        self.consistency = Some(consistency);
        self
    }
}

/// A cursor over one connection.
///
/// Executing materializes the full result set; the `fetch*` methods then
/// walk it without further requests.
#[derive(Debug)]
pub struct Cursor {
    connection: Connection,
    /// Default row count for `fetchmany` when no size is given.
    pub arraysize: usize,
    description: Option<Vec<ColumnDescriptor>>,
    rownumber: usize,
    rowcount: i64,
    lastrowid: Option<i64>,
    rows: Option<Vec<Row>>,
    decltype_cache: DecltypeCache,
}

impl Cursor {
    pub(crate) fn new(connection: Connection) -> Self {
        Self {
            connection,
            arraysize: 1,
            description: None,
            rownumber: 0,
            rowcount: -1,
            lastrowid: None,
            rows: None,
            decltype_cache: DecltypeCache::new(),
        }
    }

    /// The connection this cursor operates on.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Execute a statement with optional parameters.
    ///
    /// # Errors
    ///
    /// Returns a `ProgrammingError` for placeholder/parameter mismatches, a
    /// `DatabaseError` for failures reported by the cluster, and an
    /// `OperationalError` for transport failures that survived the retry
    /// policy or a closed connection.
    pub async fn execute(
        &mut self,
        sql: &str,
        params: Option<Params>,
    ) -> Result<&mut Self, RqliteDbError> {
        self.execute_with(sql, params, ExecuteOptions::default())
            .await
    }

    /// Execute a statement with explicit execution options.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Cursor::execute`].
    pub async fn execute_with(
        &mut self,
        sql: &str,
        params: Option<Params>,
        options: ExecuteOptions,
    ) -> Result<&mut Self, RqliteDbError> {
        self.ensure_open()?;

        let payload = {
            let registry = self.connection.registry();
            let guard = read_registry(&registry);
            bind(sql, params.as_ref(), &guard)?
        };
        let command = sql_command(sql)?;

        let envelope = if is_read_command(&command) {
            self.request_query(&payload, options.consistency).await?
        } else {
            self.request_execute(std::slice::from_ref(&payload), options)
                .await?
        };

        self.load_result(&command, sql, &envelope).await?;
        Ok(self)
    }

    /// Execute the same statement once per parameter set, as a single
    /// multi-statement request. A binding failure for any set aborts the
    /// whole batch before anything is sent.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Cursor::execute`].
    pub async fn executemany(
        &mut self,
        sql: &str,
        param_sets: Vec<Params>,
    ) -> Result<(), RqliteDbError> {
        self.executemany_with(sql, param_sets, ExecuteOptions::default())
            .await
    }

    /// `executemany` with explicit execution options.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Cursor::execute`].
    pub async fn executemany_with(
        &mut self,
        sql: &str,
        param_sets: Vec<Params>,
        options: ExecuteOptions,
    ) -> Result<(), RqliteDbError> {
        self.ensure_open()?;

        let payloads = {
            let registry = self.connection.registry();
            let guard = read_registry(&registry);
            bind_batch(sql, &param_sets, &guard)?
        };

        let envelope = self.request_execute(&payloads, options).await?;
        let result_set = {
            let registry = self.connection.registry();
            let guard = read_registry(&registry);
            let ctx = DecodeContext {
                registry: &guard,
                parse_decltypes: self.connection.parse_decltypes(),
                parse_colnames: self.connection.parse_colnames(),
                supplemental_types: None,
            };
            decode_envelope(&envelope, &ctx)?
        };

        self.description = None;
        self.rows = Some(Vec::new());
        self.rownumber = 0;
        self.rowcount = result_set.rows_affected;
        Ok(())
    }

    /// Fetch the next row, or `None` when the result set is exhausted.
    pub fn fetchone(&mut self) -> Option<Row> {
        let rows = self.rows.as_ref()?;
        let row = rows.get(self.rownumber)?.clone();
        self.rownumber += 1;
        Some(row)
    }

    /// Fetch up to `size` rows (default [`Cursor::arraysize`]).
    pub fn fetchmany(&mut self, size: Option<usize>) -> Vec<Row> {
        let want = size.unwrap_or(self.arraysize);
        let mut out = Vec::with_capacity(want);
        for _ in 0..want {
            match self.fetchone() {
                Some(row) => out.push(row),
                None => break,
            }
        }
        out
    }

    /// Fetch all remaining rows. A second call returns an empty collection.
    pub fn fetchall(&mut self) -> Vec<Row> {
        let mut out = Vec::new();
        while let Some(row) = self.fetchone() {
            out.push(row);
        }
        out
    }

    /// Rows affected for UPDATE/DELETE and result-set-less statements,
    /// number of materialized rows otherwise; -1 before the first execute.
    #[must_use]
    pub fn rowcount(&self) -> i64 {
        self.rowcount
    }

    /// The last inserted row id, updated by INSERT statements.
    #[must_use]
    pub fn lastrowid(&self) -> Option<i64> {
        self.lastrowid
    }

    /// Column metadata of the current result set, or `None` for
    /// affects-only statements.
    #[must_use]
    pub fn description(&self) -> Option<&[ColumnDescriptor]> {
        self.description.as_deref()
    }

    /// Drop the materialized result set. The cursor can execute again.
    pub fn close(&mut self) {
        self.rows = None;
    }

    /// Input size hints are intentionally unimplemented.
    ///
    /// # Errors
    ///
    /// Always returns `RqliteDbError::NotSupported`.
    pub fn setinputsizes(&self, _sizes: &[usize]) -> Result<(), RqliteDbError> {
        Err(RqliteDbError::NotSupported("setinputsizes".into()))
    }

    /// Output size hints are intentionally unimplemented.
    ///
    /// # Errors
    ///
    /// Always returns `RqliteDbError::NotSupported`.
    pub fn setoutputsize(&self, _size: usize, _column: Option<usize>) -> Result<(), RqliteDbError> {
        Err(RqliteDbError::NotSupported("setoutputsize".into()))
    }

    fn ensure_open(&self) -> Result<(), RqliteDbError> {
        if self.connection.is_closed() {
            return Err(RqliteDbError::OperationalError(
                "connection is closed".into(),
            ));
        }
        Ok(())
    }

    async fn request_query(
        &self,
        payload: &JsonValue,
        consistency: Option<ReadConsistency>,
    ) -> Result<ResponseEnvelope, RqliteDbError> {
        let transport = self.connection.transport();
        let mut transport = transport.lock().await;
        let mut url = transport.url_for("/db/query")?;
        if let Some(level) = consistency {
            url.query_pairs_mut().append_pair("level", level.as_str());
        }
        let (method, body) = match payload {
            JsonValue::String(sql) => {
                url.query_pairs_mut().append_pair("q", sql);
                (Method::GET, None)
            }
            parameterized => (
                Method::POST,
                Some(JsonValue::Array(vec![parameterized.clone()])),
            ),
        };
        let response = transport.fetch_response(method, url, body.as_ref()).await?;
        drop(transport);
        envelope_from_response(response).await
    }

    async fn request_execute(
        &self,
        payloads: &[JsonValue],
        options: ExecuteOptions,
    ) -> Result<ResponseEnvelope, RqliteDbError> {
        let transport = self.connection.transport();
        let mut transport = transport.lock().await;
        let mut url = transport.url_for("/db/execute")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_key_only("transaction");
            if options.queue {
                pairs.append_key_only("queue");
            }
            if options.wait {
                pairs.append_key_only("wait");
            }
        }
        let body = JsonValue::Array(payloads.to_vec());
        let response = transport
            .fetch_response(Method::POST, url, Some(&body))
            .await?;
        drop(transport);
        envelope_from_response(response).await
    }

    async fn load_result(
        &mut self,
        command: &str,
        sql: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<(), RqliteDbError> {
        let supplemental = self.supplemental_types(command, sql, envelope).await?;

        let result_set = {
            let registry = self.connection.registry();
            let guard = read_registry(&registry);
            let ctx = DecodeContext {
                registry: &guard,
                parse_decltypes: self.connection.parse_decltypes(),
                parse_colnames: self.connection.parse_colnames(),
                supplemental_types: supplemental.as_deref(),
            };
            decode_envelope(envelope, &ctx)?
        };

        self.rownumber = 0;
        if command == "INSERT" {
            self.lastrowid = result_set.last_insert_id;
        }
        self.rowcount = if matches!(command, "UPDATE" | "DELETE") {
            result_set.rows_affected
        } else if result_set.columns.is_some() {
            // A materialized result set reports its own length, so an empty
            // SELECT reports 0 rather than -1.
            result_set.rows.len() as i64
        } else {
            result_set.rows_affected
        };
        self.description = result_set.columns;
        self.rows = Some(result_set.rows);
        Ok(())
    }

    /// Recover declared types for typeless result columns of a single-table
    /// SELECT from the schema cache, when a type-detection mode is on.
    async fn supplemental_types(
        &mut self,
        command: &str,
        sql: &str,
        envelope: &ResponseEnvelope,
    ) -> Result<Option<std::sync::Arc<std::collections::HashMap<String, String>>>, RqliteDbError>
    {
        if command != "SELECT"
            || !(self.connection.parse_decltypes() || self.connection.parse_colnames())
        {
            return Ok(None);
        }
        let Some(results) = &envelope.results else {
            return Ok(None);
        };
        let needs_types = results.iter().any(|item| {
            item.columns.as_ref().is_some_and(|columns| {
                let types = item.types.as_deref().unwrap_or_default();
                columns
                    .iter()
                    .enumerate()
                    .any(|(idx, _)| types.get(idx).is_none_or(String::is_empty))
            })
        });
        if !needs_types {
            return Ok(None);
        }
        let Some(table) = table_from_select(sql) else {
            return Ok(None);
        };
        let connection = self.connection.clone();
        let types = self
            .decltype_cache
            .table_types(&connection, &table)
            .await?;
        Ok(Some(types))
    }
}
