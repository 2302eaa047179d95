use std::fmt;

use crate::datatype::DataType;
use crate::errors::{ReprError, Result};

/// Identifier of a column within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub datatype: DataType,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, datatype: DataType) -> Self {
        ColumnSchema {
            name: name.into(),
            datatype,
        }
    }
}

/// Ordered columns where the first `num_key_columns` make up the primary
/// key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    column_ids: Vec<ColumnId>,
    num_key_columns: usize,
}

impl Schema {
    /// Create a schema with column ids assigned by position.
    pub fn try_new(
        columns: impl IntoIterator<Item = ColumnSchema>,
        num_key_columns: usize,
    ) -> Result<Self> {
        let columns: Vec<_> = columns.into_iter().collect();
        let ids = (0..columns.len() as u32).map(ColumnId).collect();
        Self::try_new_with_ids(columns, ids, num_key_columns)
    }

    pub fn try_new_with_ids(
        columns: Vec<ColumnSchema>,
        column_ids: Vec<ColumnId>,
        num_key_columns: usize,
    ) -> Result<Self> {
        if column_ids.len() != columns.len() {
            return Err(ReprError::ColumnIdCount {
                ids: column_ids.len(),
                columns: columns.len(),
            });
        }
        if num_key_columns > columns.len() {
            return Err(ReprError::InvalidKeyPrefix {
                num_key_columns,
                num_columns: columns.len(),
            });
        }

        Ok(Schema {
            columns,
            column_ids,
            num_key_columns,
        })
    }

    /// Schema with no columns.
    pub fn empty() -> Self {
        Schema {
            columns: Vec::new(),
            column_ids: Vec::new(),
            num_key_columns: 0,
        }
    }

    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    pub fn column_ids(&self) -> &[ColumnId] {
        &self.column_ids
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_key_columns(&self) -> usize {
        self.num_key_columns
    }

    pub fn key_columns(&self) -> &[ColumnSchema] {
        &self.columns[..self.num_key_columns]
    }

    pub fn column_id(&self, idx: usize) -> Option<ColumnId> {
        self.column_ids.get(idx).copied()
    }

    pub fn column_index_by_id(&self, id: ColumnId) -> Option<usize> {
        self.column_ids.iter().position(|c| *c == id)
    }

    pub fn column_by_id(&self, id: ColumnId) -> Option<&ColumnSchema> {
        self.column_index_by_id(id).map(|idx| &self.columns[idx])
    }

    /// Find a column by name, case-insensitive.
    pub fn find_column(&self, name: &str) -> Option<(usize, &ColumnSchema)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }
}
