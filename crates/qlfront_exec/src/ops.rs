use std::fmt;

use bytes::Bytes;
use qlfront_catalog::request::{PagingState, QueryRequest};
use qlfront_repr::schema::{ColumnSchema, Schema};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    pub keyspace: String,
    pub name: String,
}

impl TableName {
    pub fn new(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        TableName {
            keyspace: keyspace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.keyspace, self.name)
    }
}

/// Response to a read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadResponse {
    /// Rows in the row wire format.
    pub rows_data: Bytes,
    pub paging_state: Option<PagingState>,
}

/// A read against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOp {
    pub table: TableName,
    /// Full schema of the table read.
    pub table_schema: Schema,
    pub request: QueryRequest,
    response: Option<ReadResponse>,
}

impl ReadOp {
    pub fn new(table: TableName, table_schema: Schema, request: QueryRequest) -> Self {
        ReadOp {
            table,
            table_schema,
            request,
            response: None,
        }
    }

    pub fn complete(&mut self, response: ReadResponse) {
        self.response = Some(response);
    }

    pub fn response(&self) -> Option<&ReadResponse> {
        self.response.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }
}

/// Response to a write, which may return rows (e.g. for conditional
/// writes).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WriteResponse {
    pub column_schemas: Vec<ColumnSchema>,
    pub rows_data: Bytes,
}

/// A write against a table.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOp {
    pub table: TableName,
    response: Option<WriteResponse>,
}

impl WriteOp {
    pub fn new(table: TableName) -> Self {
        WriteOp {
            table,
            response: None,
        }
    }

    pub fn complete(&mut self, response: WriteResponse) {
        self.response = Some(response);
    }

    pub fn response(&self) -> Option<&WriteResponse> {
        self.response.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.response.is_some()
    }
}
