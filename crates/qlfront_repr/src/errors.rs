use crate::datatype::DataType;

#[derive(Debug, thiserror::Error)]
pub enum ReprError {
    #[error("Schema has {num_columns} columns, cannot use {num_key_columns} as key columns")]
    InvalidKeyPrefix {
        num_key_columns: usize,
        num_columns: usize,
    },

    #[error("Mismatched number of column ids: {ids} ids for {columns} columns")]
    ColumnIdCount { ids: usize, columns: usize },

    #[error("Row has {got} values, schema expects {expected}")]
    RowArity { expected: usize, got: usize },

    #[error("Value for column '{column}' is not of type {expected}")]
    TypeMismatch { column: String, expected: DataType },

    #[error("Row payload truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("Invalid length in row payload: {0}")]
    InvalidLength(i32),

    #[error(
        "Row payload claims {num_rows} rows of {num_columns} columns with {remaining} bytes remaining"
    )]
    InvalidRowCount {
        num_rows: usize,
        num_columns: usize,
        remaining: usize,
    },

    #[error("Row payload has {0} trailing bytes")]
    TrailingBytes(usize),

    #[error("Invalid encoding for {datatype}: {reason}")]
    InvalidValue { datatype: DataType, reason: String },

    #[error("Unknown user-defined type {keyspace}.{name}")]
    UnknownUserType { keyspace: String, name: String },

    #[error("Encoded value of {0} bytes exceeds the limit of i32 max")]
    ValueTooLarge(usize),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl ReprError {
    /// If this error came from decoding a row payload.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            ReprError::Truncated { .. }
                | ReprError::InvalidLength(_)
                | ReprError::InvalidRowCount { .. }
                | ReprError::TrailingBytes(_)
                | ReprError::InvalidValue { .. }
                | ReprError::UnknownUserType { .. }
                | ReprError::Utf8(_)
        )
    }
}

pub type Result<T, E = ReprError> = std::result::Result<T, E>;
