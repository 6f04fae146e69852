//! Error types for template operations.

use thiserror::Error;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur in template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An edit was requested while no element is selected.
    #[error("No element selected")]
    NoSelection,

    /// A table operation was requested on a non-table element.
    #[error("Element is not a table: {0}")]
    NotATable(String),

    /// A field that the element kind does not carry.
    #[error("Field {field} is not editable on {kind} elements")]
    FieldNotEditable {
        /// Field name.
        field: &'static str,
        /// Element kind.
        kind: String,
    },

    /// A column index past the end of the header list.
    #[error("Column {index} out of range (table has {count} columns)")]
    ColumnOutOfRange {
        /// Requested column index.
        index: usize,
        /// Number of columns in the table.
        count: usize,
    },

    /// A row index past the end of the body rows.
    #[error("Row {index} out of range (table has {count} rows)")]
    RowOutOfRange {
        /// Requested row index.
        index: usize,
        /// Number of body rows in the table.
        count: usize,
    },

    /// A stored table has a row whose length differs from the header count.
    #[error("Table {id} has a row with {cells} cells but {columns} columns")]
    InconsistentTable {
        /// Element id.
        id: String,
        /// Cells in the offending row.
        cells: usize,
        /// Number of headers.
        columns: usize,
    },

    /// Two elements share an id.
    #[error("Duplicate element id: {0}")]
    DuplicateId(String),

    /// Template serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
