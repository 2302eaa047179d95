use std::sync::Arc;

use bytes::Bytes;
use qlfront_catalog::request::PagingState;
use qlfront_repr::row::RowBlock;
use qlfront_repr::schema::{ColumnSchema, Schema};
use tracing::trace;

use crate::client::ClientContext;
use crate::errors::{ExecError, Result, internal};
use crate::ops::{ReadOp, TableName, WriteOp};

/// Rows returned by a completed operation, still in wire format.
///
/// Rows are decoded on each call to [`RowsResult::materialize`], nothing is
/// cached. A result can be shared and materialized from multiple threads.
#[derive(Debug, Clone)]
pub struct RowsResult {
    table_name: TableName,
    column_schemas: Vec<ColumnSchema>,
    rows_data: Bytes,
    paging_state: Option<PagingState>,
    client: Arc<ClientContext>,
}

impl RowsResult {
    /// Create a result from a completed read.
    ///
    /// Columns are the ones the read requested, resolved against the table's
    /// schema. A read requesting no columns returns every column.
    pub fn from_read_op(op: &ReadOp, client: Arc<ClientContext>) -> Result<Self> {
        let response = op
            .response()
            .ok_or_else(|| internal!("read on {} not completed", op.table))?;

        let column_schemas = if op.request.columns.is_empty() {
            op.table_schema.columns().to_vec()
        } else {
            op.request
                .columns
                .iter()
                .map(|id| {
                    op.table_schema.column_by_id(*id).cloned().ok_or_else(|| {
                        ExecError::UnknownColumn {
                            table: op.table.to_string(),
                            column: id.to_string(),
                        }
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Ok(RowsResult {
            table_name: op.table.clone(),
            column_schemas,
            rows_data: response.rows_data.clone(),
            paging_state: response.paging_state,
            client,
        })
    }

    /// Create a result from a completed write, using the columns the write
    /// returned.
    pub fn from_write_op(op: &WriteOp, client: Arc<ClientContext>) -> Result<Self> {
        let response = op
            .response()
            .ok_or_else(|| internal!("write on {} not completed", op.table))?;

        Ok(RowsResult {
            table_name: op.table.clone(),
            column_schemas: response.column_schemas.clone(),
            rows_data: response.rows_data.clone(),
            paging_state: None,
            client,
        })
    }

    pub fn table_name(&self) -> &TableName {
        &self.table_name
    }

    pub fn column_schemas(&self) -> &[ColumnSchema] {
        &self.column_schemas
    }

    pub fn rows_data(&self) -> &Bytes {
        &self.rows_data
    }

    pub fn paging_state(&self) -> Option<PagingState> {
        self.paging_state
    }

    /// Decode the payload into a new row block.
    ///
    /// The block's schema holds the captured columns with no key columns. An
    /// empty payload produces an empty block without decoding.
    pub fn materialize(&self) -> Result<RowBlock> {
        let schema = Schema::try_new(self.column_schemas.iter().cloned(), 0)?;

        if self.rows_data.is_empty() {
            return Ok(RowBlock::new(schema));
        }

        let block = RowBlock::deserialize(schema, self.client.as_ref(), &self.rows_data)
            .map_err(|source| ExecError::Decode {
                table: self.table_name.to_string(),
                source,
            })?;

        trace!(table = %self.table_name, rows = block.num_rows(), "materialized rows");

        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use qlfront_catalog::request::QueryRequest;
    use qlfront_repr::datatype::{DataType, UserTypeDef};
    use qlfront_repr::row::Row;
    use qlfront_repr::scalar::ScalarValue;
    use qlfront_repr::schema::ColumnId;

    use super::*;
    use crate::ops::{ReadResponse, WriteResponse};

    fn table_schema() -> Schema {
        Schema::try_new(
            [
                ColumnSchema::new("resource", DataType::Text),
                ColumnSchema::new("role", DataType::Text),
                ColumnSchema::new("count", DataType::Int32),
            ],
            2,
        )
        .unwrap()
    }

    fn read_op(columns: Vec<ColumnId>, rows_data: Bytes) -> ReadOp {
        let mut op = ReadOp::new(
            TableName::new("ks", "t"),
            table_schema(),
            QueryRequest::with_columns(columns),
        );
        op.complete(ReadResponse {
            rows_data,
            paging_state: None,
        });
        op
    }

    fn encode(block: &RowBlock, client: &ClientContext) -> Bytes {
        let mut buf = BytesMut::new();
        block.serialize(client, &mut buf).unwrap();
        buf.freeze()
    }

    #[test]
    fn empty_payload_skips_decode() {
        let op = read_op(vec![ColumnId(2), ColumnId(0)], Bytes::new());
        let result = RowsResult::from_read_op(&op, Arc::new(ClientContext::new())).unwrap();

        let block = result.materialize().unwrap();
        assert!(block.is_empty());
        assert_eq!(0, block.schema().num_key_columns());
        let names: Vec<_> = block.schema().columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["count", "resource"], names);
    }

    #[test]
    fn columns_resolved_from_request() {
        let client = Arc::new(ClientContext::new());
        let schema = Schema::try_new(
            [
                ColumnSchema::new("role", DataType::Text),
                ColumnSchema::new("count", DataType::Int32),
            ],
            0,
        )
        .unwrap();
        let block = RowBlock::try_new(
            schema,
            [
                Row::from_iter(["a".into(), ScalarValue::Int32(1)]),
                Row::from_iter(["b".into(), ScalarValue::Null]),
            ],
        )
        .unwrap();

        let op = read_op(vec![ColumnId(1), ColumnId(2)], encode(&block, &client));
        let result = RowsResult::from_read_op(&op, client).unwrap();
        assert_eq!(block, result.materialize().unwrap());
    }

    #[test]
    fn unknown_requested_column() {
        let op = read_op(vec![ColumnId(5)], Bytes::new());
        let err = RowsResult::from_read_op(&op, Arc::new(ClientContext::new())).unwrap_err();
        assert!(matches!(err, ExecError::UnknownColumn { .. }));
    }

    #[test]
    fn incomplete_op() {
        let op = ReadOp::new(TableName::new("ks", "t"), table_schema(), QueryRequest::default());
        let err = RowsResult::from_read_op(&op, Arc::new(ClientContext::new())).unwrap_err();
        assert!(matches!(err, ExecError::Internal(_)));
    }

    #[test]
    fn write_op_uses_response_columns() {
        let client = Arc::new(ClientContext::new());
        let columns = vec![ColumnSchema::new("[applied]", DataType::Boolean)];
        let block = RowBlock::try_new(
            Schema::try_new(columns.clone(), 0).unwrap(),
            [Row::from_iter([true.into()])],
        )
        .unwrap();

        let mut op = WriteOp::new(TableName::new("ks", "t"));
        op.complete(WriteResponse {
            column_schemas: columns,
            rows_data: encode(&block, &client),
        });

        let result = RowsResult::from_write_op(&op, client).unwrap();
        assert_eq!("ks.t", result.table_name().to_string());
        assert_eq!(block, result.materialize().unwrap());
    }

    #[test]
    fn decode_failure_is_error() {
        // One row claimed, no values follow.
        let op = read_op(vec![ColumnId(0)], Bytes::from_static(&[0, 0, 0, 1]));
        let result = RowsResult::from_read_op(&op, Arc::new(ClientContext::new())).unwrap();

        let err = result.materialize().unwrap_err();
        assert!(matches!(err, ExecError::Decode { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn write_without_columns_rejects_rows() {
        let mut op = WriteOp::new(TableName::new("ks", "t"));
        op.complete(WriteResponse {
            column_schemas: Vec::new(),
            rows_data: Bytes::from_static(&[0, 0x10, 0, 0]),
        });

        let result = RowsResult::from_write_op(&op, Arc::new(ClientContext::new())).unwrap();
        let err = result.materialize().unwrap_err();
        assert!(matches!(err, ExecError::Decode { .. }), "{err}");
    }

    #[test]
    fn materialize_returns_fresh_blocks() {
        let client = Arc::new(ClientContext::new());
        let schema = Schema::try_new([ColumnSchema::new("resource", DataType::Text)], 0).unwrap();
        let block = RowBlock::try_new(schema, [Row::from_iter(["x".into()])]).unwrap();
        let op = read_op(vec![ColumnId(0)], encode(&block, &client));
        let result = RowsResult::from_read_op(&op, client).unwrap();

        let mut first = result.materialize().unwrap();
        first.truncate(0);
        let second = result.materialize().unwrap();
        assert_eq!(1, second.num_rows());
    }

    #[test]
    fn user_types_resolved_through_client() {
        let client = Arc::new(ClientContext::new());
        client.register_type(UserTypeDef {
            keyspace: "ks".to_string(),
            name: "point".to_string(),
            fields: vec![
                ("x".to_string(), DataType::Int32),
                ("y".to_string(), DataType::Int32),
            ],
        });

        let columns = vec![ColumnSchema::new(
            "p",
            DataType::UserDefined {
                keyspace: "ks".to_string(),
                name: "point".to_string(),
            },
        )];
        let block = RowBlock::try_new(
            Schema::try_new(columns.clone(), 0).unwrap(),
            [Row::from_iter([ScalarValue::UserDefined(vec![
                ScalarValue::Int32(1),
                ScalarValue::Int32(2),
            ])])],
        )
        .unwrap();

        let mut op = WriteOp::new(TableName::new("ks", "t"));
        op.complete(WriteResponse {
            column_schemas: columns,
            rows_data: encode(&block, &client),
        });
        let result = RowsResult::from_write_op(&op, client.clone()).unwrap();
        assert_eq!(block, result.materialize().unwrap());

        // Type dropped after the result was produced.
        client.drop_type("ks", "point");
        let err = result.materialize().unwrap_err();
        assert!(matches!(err, ExecError::Decode { .. }));
    }
}
