use crate::errors::{ReprError, Result};
use crate::scalar::ScalarValue;
use crate::schema::Schema;

/// Representation of a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Vec<ScalarValue>,
}

impl Row {
    pub const fn empty() -> Self {
        Row {
            columns: Vec::new(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScalarValue> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<ScalarValue> for Row {
    fn from_iter<T: IntoIterator<Item = ScalarValue>>(iter: T) -> Self {
        Row {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A schema with rows conforming to it.
///
/// Every row pushed is checked against the schema, a block never holds a row
/// with the wrong number or types of values.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBlock {
    schema: Schema,
    rows: Vec<Row>,
}

impl RowBlock {
    pub fn new(schema: Schema) -> Self {
        RowBlock {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn try_new(schema: Schema, rows: impl IntoIterator<Item = Row>) -> Result<Self> {
        let mut block = Self::new(schema);
        for row in rows {
            block.push_row(row)?;
        }
        Ok(block)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.num_columns() {
            return Err(ReprError::RowArity {
                expected: self.schema.num_columns(),
                got: row.len(),
            });
        }

        for (val, col) in row.iter().zip(self.schema.columns()) {
            if !val.is_of_type(&col.datatype) {
                return Err(ReprError::TypeMismatch {
                    column: col.name.clone(),
                    expected: col.datatype.clone(),
                });
            }
        }

        self.rows.push(row);
        Ok(())
    }

    /// Keep at most `n` rows, returning how many were dropped.
    pub fn truncate(&mut self, n: usize) -> usize {
        let dropped = self.rows.len().saturating_sub(n);
        self.rows.truncate(n);
        dropped
    }

    /// Remove the first `n` rows, returning how many were removed.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.rows.len());
        self.rows.drain(..n);
        n
    }
}
