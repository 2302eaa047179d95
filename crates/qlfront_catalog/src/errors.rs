use qlfront_repr::errors::ReprError;
use qlfront_repr::schema::ColumnId;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column id {id} for table {table}")]
    UnknownColumn { table: String, id: ColumnId },

    #[error("Invalid condition on column '{column}': {reason}")]
    InvalidCondition { column: String, reason: String },

    #[error("Invalid paging state")]
    InvalidPagingState,

    #[error("Role '{0}' already exists")]
    RoleExists(String),

    #[error("Role '{0}' doesn't exist")]
    UnknownRole(String),

    /// Backing metadata couldn't be read, the request may be retried.
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error(transparent)]
    Repr(#[from] ReprError),

    #[error("internal: {0}")]
    Internal(String),
}

impl CatalogError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogError::MetadataUnavailable(_))
    }
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[allow(unused_macros)]
macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::CatalogError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;
