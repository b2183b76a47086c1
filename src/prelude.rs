//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::client::{ConnectOptions, ReadConsistency, Scheme};
pub use crate::connection::Connection;
pub use crate::conversion::{
    TypeRegistry, WireValue, register_adapter, register_converter, reset_registry,
};
pub use crate::cursor::{Cursor, ExecuteOptions};
pub use crate::error::RqliteDbError;
pub use crate::results::{ColumnDescriptor, ResultSet, Row};
pub use crate::types::{Params, SqlValue, ToWireValue, ValueKind};
