use super::row::Row;

/// Metadata for one result column.
///
/// `name` is stripped of a bracketed hint suffix when column-name hinting is
/// enabled; `decl_type` is the declared SQL type as reported by the cluster
/// (or recovered from the schema cache), when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub decl_type: Option<String>,
}

/// A decoded result from one execute/query request.
///
/// `rows_affected` sums the per-statement counters in the response envelope
/// and is -1 when the envelope carried no statement results at all, matching
/// the embedded driver's sentinel.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Column metadata, present only when the response carried a result set.
    pub columns: Option<Vec<ColumnDescriptor>>,
    /// The decoded rows.
    pub rows: Vec<Row>,
    /// Summed rows-affected counters across statement results.
    pub rows_affected: i64,
    /// The last inserted row id, when the envelope reported one.
    pub last_insert_id: Option<i64>,
}
