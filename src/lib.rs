//! DB-API style client for rqlite, the distributed SQLite store.
//!
//! The cluster speaks JSON over HTTP; this crate reproduces the embedded
//! sqlite3 driver's contract on top of that transport: qmark and named
//! parameter binding, adapter/converter registries with declared-type and
//! column-name type detection, duplicate-tolerant rows, and transparent
//! leader-redirect following.
//!
//! ```rust,no_run
//! use rqlite_client::prelude::*;
//!
//! # async fn demo() -> Result<(), RqliteDbError> {
//! let conn = ConnectOptions::new("localhost", 4001)
//!     .with_parse_decltypes(true)
//!     .connect()?;
//! let mut cursor = conn.cursor();
//! cursor
//!     .execute(
//!         "select id, name from t where id = ?",
//!         Some(vec![SqlValue::Int(1)].into()),
//!     )
//!     .await?;
//! for row in cursor.fetchall() {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

mod binder;
pub mod client;
pub mod connection;
pub mod conversion;
pub mod cursor;
pub mod error;
pub mod prelude;
pub mod results;
mod schema;
pub mod types;

pub use client::{ConnectOptions, ReadConsistency, Scheme};
pub use connection::Connection;
pub use conversion::{
    TypeRegistry, WireValue, default_registry, deregister_adapter, deregister_converter,
    register_adapter, register_converter, reset_registry,
};
pub use cursor::{Cursor, ExecuteOptions};
pub use error::RqliteDbError;
pub use results::{ColumnDescriptor, ResultSet, Row};
pub use types::{Params, SqlValue, ToWireValue, ValueKind};
