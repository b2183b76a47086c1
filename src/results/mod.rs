// Result model - rows, column metadata, and the response decoder
//
// This module is split into sub-modules:
// - row: ordered, duplicate-tolerant result tuples
// - result_set: decoded statement results and column descriptors
// - decode: JSON response envelope -> ResultSet

pub(crate) mod decode;
pub mod result_set;
pub mod row;

pub use result_set::{ColumnDescriptor, ResultSet};
pub use row::Row;
