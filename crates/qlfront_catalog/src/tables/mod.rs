pub mod system_auth;

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use qlfront_repr::row::{Row, RowBlock};
use qlfront_repr::schema::Schema;
use tracing::debug;

use crate::errors::{CatalogError, Result, internal};
use crate::metadata::{PermissionsManager, PermissionsSnapshot};
use crate::request::{Condition, QueryRequest};
use crate::vtable::VirtualTable;

/// Table computed from permissions metadata.
///
/// Reads happen in two steps. `extract` runs under the metadata read lock
/// and copies out only the fields the table needs, `rows` formats them after
/// the lock is released.
pub trait SystemTableImpl: Debug + Sync + Send + 'static {
    const KEYSPACE: &'static str;
    const NAME: &'static str;

    /// Fields copied out of the metadata.
    type Extract;

    fn create_schema() -> Result<Schema>;

    fn extract(snapshot: &PermissionsSnapshot) -> Self::Extract;

    /// Every row of the table, with all columns.
    fn rows(extract: Self::Extract) -> Vec<Row>;
}

#[derive(Debug)]
pub struct SystemTable<T: SystemTableImpl> {
    schema: Schema,
    permissions: Arc<PermissionsManager>,
    lock_timeout: Duration,
    _impl: PhantomData<T>,
}

impl<T: SystemTableImpl> SystemTable<T> {
    pub fn try_new(permissions: Arc<PermissionsManager>, lock_timeout: Duration) -> Result<Self> {
        Ok(SystemTable {
            schema: T::create_schema()?,
            permissions,
            lock_timeout,
            _impl: PhantomData,
        })
    }

    /// Map requested column ids to indices into the full schema.
    fn resolve_columns(&self, request: &QueryRequest) -> Result<Vec<usize>> {
        if request.columns.is_empty() {
            return Ok((0..self.schema.num_columns()).collect());
        }
        request
            .columns
            .iter()
            .map(|id| {
                self.schema
                    .column_index_by_id(*id)
                    .ok_or_else(|| CatalogError::UnknownColumn {
                        table: self.qualified_name(),
                        id: *id,
                    })
            })
            .collect()
    }

    fn resolve_conditions<'a>(
        &self,
        request: &'a QueryRequest,
    ) -> Result<Vec<(usize, &'a Condition)>> {
        request
            .conditions
            .iter()
            .map(|cond| {
                let idx = self.schema.column_index_by_id(cond.column).ok_or_else(|| {
                    CatalogError::UnknownColumn {
                        table: self.qualified_name(),
                        id: cond.column,
                    }
                })?;
                let column = &self.schema.columns()[idx];
                for value in cond.values() {
                    if value.is_null() || !value.is_of_type(&column.datatype) {
                        return Err(CatalogError::InvalidCondition {
                            column: column.name.clone(),
                            reason: format!("expected a {} value, got {value}", column.datatype),
                        });
                    }
                }
                Ok((idx, cond))
            })
            .collect()
    }

    /// Schema for the projected columns.
    ///
    /// The key prefix carries over only as far as the projection keeps the
    /// leading key columns in place.
    fn projected_schema(&self, projection: &[usize]) -> Result<Schema> {
        let num_key_columns = projection
            .iter()
            .enumerate()
            .take_while(|(pos, idx)| pos == *idx && **idx < self.schema.num_key_columns())
            .count();

        let columns = projection
            .iter()
            .map(|idx| self.schema.columns()[*idx].clone())
            .collect();
        let ids = projection
            .iter()
            .map(|idx| self.schema.column_ids()[*idx])
            .collect();

        Ok(Schema::try_new_with_ids(columns, ids, num_key_columns)?)
    }
}

impl<T: SystemTableImpl> VirtualTable for SystemTable<T> {
    fn keyspace(&self) -> &str {
        T::KEYSPACE
    }

    fn name(&self) -> &str {
        T::NAME
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create_schema(&self) -> Result<Schema> {
        T::create_schema()
    }

    fn retrieve_data(&self, request: &QueryRequest) -> Result<RowBlock> {
        let projection = self.resolve_columns(request)?;
        let conditions = self.resolve_conditions(request)?;
        let schema = self.projected_schema(&projection)?;

        // Lock is held only for the copy.
        let (version, extract) = self
            .permissions
            .snapshot_with(self.lock_timeout, |s| (s.version, T::extract(s)))?;

        let mut block = RowBlock::new(schema);
        for row in T::rows(extract) {
            if row.len() != self.schema.num_columns() {
                return Err(internal!(
                    "{} produced a row with {} columns, expected {}",
                    T::NAME,
                    row.len(),
                    self.schema.num_columns()
                ));
            }

            if !conditions
                .iter()
                .all(|(idx, cond)| cond.matches(&row.columns[*idx]))
            {
                continue;
            }

            let projected = projection.iter().map(|idx| row.columns[*idx].clone());
            block.push_row(projected.collect())?;
        }

        debug!(
            table = T::NAME,
            version,
            rows = block.num_rows(),
            "computed virtual table rows"
        );

        Ok(block)
    }
}
