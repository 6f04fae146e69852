//! Table sub-model owned by table elements.
//!
//! Every body row always has exactly one cell per header. The column and row
//! operations here are the only mutations the editor performs, and each one
//! updates the header list and all rows together.

use serde::{Deserialize, Serialize};

use crate::{TemplateError, TemplateResult};

/// Content of cells appended by column/row insertion.
pub const NEW_CELL: &str = "New Cell";

/// One table column header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableHeader {
    /// Visible header HTML.
    pub content: String,
    /// Semantic column name, encoded in export markers only.
    #[serde(default)]
    pub name: String,
    /// Semantic column description, encoded in export markers only.
    #[serde(default)]
    pub description: String,
}

impl TableHeader {
    /// Create a header.
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Headers plus body rows of a table element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableData {
    /// Column headers, in order.
    pub headers: Vec<TableHeader>,
    /// Body rows; each row holds one cell per header.
    pub body_rows: Vec<Vec<String>>,
}

impl TableData {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Number of body rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.body_rows.len()
    }

    /// Whether the table has neither headers nor rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body_rows.is_empty()
    }

    /// Whether every row has one cell per header.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let columns = self.headers.len();
        self.body_rows.iter().all(|row| row.len() == columns)
    }

    /// Pad or truncate every row to one cell per header.
    ///
    /// Returns whether any row changed.
    pub fn normalize_rows(&mut self) -> bool {
        let columns = self.headers.len();
        let mut changed = false;
        for row in &mut self.body_rows {
            if row.len() != columns {
                row.resize(columns, String::new());
                changed = true;
            }
        }
        changed
    }

    /// Append a column with positional defaults and a `New Cell` in every row.
    pub fn add_column(&mut self) {
        let n = self.headers.len() + 1;
        self.headers.push(TableHeader::new(
            format!("Header {n}"),
            format!("Column {n} Name"),
            format!("Description for column {n}"),
        ));
        for row in &mut self.body_rows {
            row.push(NEW_CELL.to_string());
        }
    }

    /// Remove the last column.
    ///
    /// Removing the only column clears the whole table, rows included.
    pub fn remove_last_column(&mut self) {
        match self.headers.len() {
            0 => {}
            1 => {
                self.headers.clear();
                self.body_rows.clear();
            }
            _ => {
                self.headers.pop();
                for row in &mut self.body_rows {
                    row.pop();
                }
            }
        }
    }

    /// Append a body row of `New Cell` values.
    pub fn add_row(&mut self) {
        self.body_rows
            .push(vec![NEW_CELL.to_string(); self.headers.len()]);
    }

    /// Remove the last body row, if any.
    pub fn remove_last_row(&mut self) {
        self.body_rows.pop();
    }

    /// Mutable access to a header.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ColumnOutOfRange`] for an unknown column.
    pub fn header_mut(&mut self, column: usize) -> TemplateResult<&mut TableHeader> {
        let count = self.headers.len();
        self.headers
            .get_mut(column)
            .ok_or(TemplateError::ColumnOutOfRange {
                index: column,
                count,
            })
    }

    /// Replace the visible content of a header.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ColumnOutOfRange`] for an unknown column.
    pub fn set_header_content(&mut self, column: usize, content: &str) -> TemplateResult<()> {
        self.header_mut(column)?.content = content.to_string();
        Ok(())
    }

    /// Replace the semantic name of a header.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ColumnOutOfRange`] for an unknown column.
    pub fn set_header_name(&mut self, column: usize, name: &str) -> TemplateResult<()> {
        self.header_mut(column)?.name = name.to_string();
        Ok(())
    }

    /// Replace the semantic description of a header.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::ColumnOutOfRange`] for an unknown column.
    pub fn set_header_description(
        &mut self,
        column: usize,
        description: &str,
    ) -> TemplateResult<()> {
        self.header_mut(column)?.description = description.to_string();
        Ok(())
    }

    /// Replace one body cell.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::RowOutOfRange`] or
    /// [`TemplateError::ColumnOutOfRange`] when the cell does not exist.
    pub fn set_cell(&mut self, row: usize, column: usize, content: &str) -> TemplateResult<()> {
        let rows = self.body_rows.len();
        let cells = self
            .body_rows
            .get_mut(row)
            .ok_or(TemplateError::RowOutOfRange { index: row, count: rows })?;
        let count = cells.len();
        let cell = cells
            .get_mut(column)
            .ok_or(TemplateError::ColumnOutOfRange { index: column, count })?;
        *cell = content.to_string();
        Ok(())
    }
}
