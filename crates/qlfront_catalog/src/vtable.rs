use std::fmt::Debug;

use qlfront_repr::row::RowBlock;
use qlfront_repr::schema::Schema;
use tracing::trace;

use crate::errors::Result;
use crate::request::{PagingState, QueryRequest};

/// A table whose rows are computed from live metadata when read.
pub trait VirtualTable: Debug + Sync + Send {
    fn keyspace(&self) -> &str;

    fn name(&self) -> &str;

    /// `keyspace.name`
    fn qualified_name(&self) -> String {
        format!("{}.{}", self.keyspace(), self.name())
    }

    /// Schema built when the table was constructed.
    fn schema(&self) -> &Schema;

    /// Build the table's schema. Always returns the same schema.
    fn create_schema(&self) -> Result<Schema>;

    /// Compute rows for the current state of the backing metadata.
    ///
    /// Rows are projected to the requested columns in request order and
    /// filtered by every condition. Limit and paging state are not applied
    /// here, see [`retrieve_page`].
    fn retrieve_data(&self, request: &QueryRequest) -> Result<RowBlock>;
}

/// One page of a virtual table read.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub block: RowBlock,
    /// Set when rows remain past this page.
    pub paging_state: Option<PagingState>,
}

/// Read a table, applying the request's paging state and limit.
pub fn retrieve_page(table: &dyn VirtualTable, request: &QueryRequest) -> Result<Page> {
    let mut block = table.retrieve_data(request)?;

    let start = request.paging_state.map(|s| s.next_row).unwrap_or(0);
    let skipped = block.skip(usize::try_from(start).unwrap_or(usize::MAX));

    let paging_state = match request.limit {
        Some(limit) => {
            let dropped = block.truncate(limit);
            // An empty page would hand back the state it was given.
            (dropped > 0 && !block.is_empty()).then(|| PagingState {
                next_row: start + block.num_rows() as u64,
            })
        }
        None => None,
    };

    trace!(
        table = %table.qualified_name(),
        skipped,
        rows = block.num_rows(),
        more = paging_state.is_some(),
        "retrieved page"
    );

    Ok(Page {
        block,
        paging_state,
    })
}
