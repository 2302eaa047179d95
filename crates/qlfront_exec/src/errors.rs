use qlfront_catalog::errors::CatalogError;
use qlfront_parser::errors::ParseError;
use qlfront_repr::errors::ReprError;

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Repr(#[from] ReprError),

    /// Row payload doesn't match the captured schema.
    #[error("Failed to decode rows for {table}: {source}")]
    Decode { table: String, source: ReprError },

    #[error("Unknown column '{column}' in table {table}")]
    UnknownColumn { table: String, column: String },

    #[error("Expected {expected} bind values, got {got}")]
    BindCount { expected: usize, got: usize },

    #[error("Table {0} is read only")]
    ReadOnlyTable(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Missing setting for '{0}'")]
    UnknownSetting(String),

    #[error("Invalid value for setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("internal: {0}")]
    Internal(String),
}

impl ExecError {
    /// Whether the statement can be retried as is.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Catalog(e) => e.is_retryable(),
            _ => false,
        }
    }
}

pub type Result<T, E = ExecError> = std::result::Result<T, E>;

#[allow(unused_macros)]
macro_rules! internal {
    ($($arg:tt)*) => {
        crate::errors::ExecError::Internal(std::format!($($arg)*))
    };
}
pub(crate) use internal;
