use std::collections::HashMap;
use std::sync::Arc;

use bytes::BytesMut;
use qlfront_catalog::errors::CatalogError;
use qlfront_catalog::metadata::PermissionsManager;
use qlfront_catalog::registry::VirtualTableRegistry;
use qlfront_catalog::request::{Condition, PagingState, QueryRequest};
use qlfront_catalog::vtable::{VirtualTable, retrieve_page};
use qlfront_parser::ast::{BinaryOperator, Expr, Ident, Literal, ObjectReference, Projection, Select};
use qlfront_parser::diagnostics::Diagnostic;
use qlfront_parser::parse_statement;
use qlfront_parser::statement::Statement;
use qlfront_repr::datatype::DataType;
use qlfront_repr::scalar::ScalarValue;
use qlfront_repr::schema::{ColumnId, Schema};
use tracing::{debug, warn};

use crate::client::ClientContext;
use crate::config::FrontendConfig;
use crate::errors::{ExecError, Result, internal};
use crate::ops::{ReadOp, ReadResponse, TableName};
use crate::rows_result::RowsResult;

/// Output of running a statement.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub rows: RowsResult,
    /// Warnings raised while parsing.
    pub warnings: Vec<Diagnostic>,
}

impl QueryResult {
    pub fn paging_state(&self) -> Option<PagingState> {
        self.rows.paging_state()
    }
}

/// Runs statements against virtual tables.
#[derive(Debug)]
pub struct QlProcessor {
    registry: VirtualTableRegistry,
    client: Arc<ClientContext>,
    config: FrontendConfig,
}

impl QlProcessor {
    pub fn try_new(
        permissions: Arc<PermissionsManager>,
        client: Arc<ClientContext>,
        config: FrontendConfig,
    ) -> Result<Self> {
        let registry = VirtualTableRegistry::try_new(permissions, config.metadata_lock_timeout())?;
        Ok(QlProcessor {
            registry,
            client,
            config,
        })
    }

    pub fn config(&self) -> &FrontendConfig {
        &self.config
    }

    pub fn registry(&self) -> &VirtualTableRegistry {
        &self.registry
    }

    pub fn client(&self) -> &Arc<ClientContext> {
        &self.client
    }

    /// Parse and run a statement. Bind values are matched to bind markers in
    /// the order the markers appear.
    pub fn run(&self, sql: &str, binds: &[ScalarValue]) -> Result<QueryResult> {
        self.run_paged(sql, binds, None)
    }

    /// Run a statement, resuming from a previous page.
    pub fn run_paged(
        &self,
        sql: &str,
        binds: &[ScalarValue],
        paging_state: Option<PagingState>,
    ) -> Result<QueryResult> {
        let tree = parse_statement(sql, &self.config.parse_options())?;

        if tree.bind_variables.len() != binds.len() {
            return Err(ExecError::BindCount {
                expected: tree.bind_variables.len(),
                got: binds.len(),
            });
        }
        let binds: HashMap<usize, &ScalarValue> = tree
            .bind_variables
            .iter()
            .map(|v| v.pos)
            .zip(binds)
            .collect();

        let select = match &tree.statement {
            Statement::Select(select) => select,
            write => {
                let table = self.resolve_table_name(write.table())?;
                if self.registry.is_virtual_keyspace(&table.keyspace) {
                    return Err(ExecError::ReadOnlyTable(table.to_string()));
                }
                return Err(CatalogError::UnknownTable(table.to_string()).into());
            }
        };

        let table_name = self.resolve_table_name(&select.from)?;
        let table = self.registry.get(&table_name.keyspace, &table_name.name)?;
        let binder = Binder {
            table: &table_name,
            schema: table.schema(),
            binds: &binds,
        };

        let mut request = binder.bind_select(select)?;
        if request.limit.is_none() && self.config.default_page_size > 0 {
            request.limit = Some(self.config.default_page_size as usize);
        }
        request.paging_state = paging_state;

        let result = self.execute_read(table.as_ref(), table_name, request);
        match &result {
            Err(e) if e.is_retryable() => warn!(%e, "virtual table read failed, may be retried"),
            _ => (),
        }

        Ok(QueryResult {
            rows: result?,
            warnings: tree.diagnostics,
        })
    }

    fn execute_read(
        &self,
        table: &dyn VirtualTable,
        table_name: TableName,
        request: QueryRequest,
    ) -> Result<RowsResult> {
        let page = retrieve_page(table, &request)?;

        let mut buf = BytesMut::new();
        page.block.serialize(self.client.as_ref(), &mut buf)?;

        debug!(
            table = %table_name,
            rows = page.block.num_rows(),
            bytes = buf.len(),
            "executed virtual table read"
        );

        let mut op = ReadOp::new(table_name, table.schema().clone(), request);
        op.complete(ReadResponse {
            rows_data: buf.freeze(),
            paging_state: page.paging_state,
        });

        RowsResult::from_read_op(&op, self.client.clone())
    }

    fn resolve_table_name(&self, reference: &ObjectReference) -> Result<TableName> {
        match (reference.keyspace(), reference.base()) {
            (Some(keyspace), Some(name)) => {
                Ok(TableName::new(keyspace.normalized(), name.normalized()))
            }
            _ => Err(ExecError::InvalidArgument(format!(
                "No keyspace specified for table {reference}"
            ))),
        }
    }
}

/// Resolves a parsed statement against a table schema.
struct Binder<'a> {
    table: &'a TableName,
    schema: &'a Schema,
    /// Bind values by marker position.
    binds: &'a HashMap<usize, &'a ScalarValue>,
}

impl Binder<'_> {
    fn bind_select(&self, select: &Select) -> Result<QueryRequest> {
        let columns = match &select.projection {
            Projection::Wildcard => self.schema.column_ids().to_vec(),
            Projection::Columns(cols) => cols
                .iter()
                .map(|col| self.resolve_column(col).map(|(id, _)| id))
                .collect::<Result<Vec<_>>>()?,
        };

        let mut request = QueryRequest::with_columns(columns);

        if let Some(selection) = &select.selection {
            for conjunct in selection.conjuncts() {
                request.conditions.push(self.bind_condition(conjunct)?);
            }
        }

        if let Some(limit) = &select.limit {
            let value = self.bind_value(limit, &DataType::Int64)?;
            let limit = value
                .try_as_i64()
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .ok_or_else(|| {
                    ExecError::InvalidArgument(format!(
                        "LIMIT must be a positive integer, got {value}"
                    ))
                })?;
            request.limit = Some(limit);
        }

        Ok(request)
    }

    fn resolve_column(&self, ident: &Ident) -> Result<(ColumnId, &DataType)> {
        let name = ident.normalized();
        let (idx, column) = self
            .schema
            .find_column(&name)
            .ok_or_else(|| ExecError::UnknownColumn {
                table: self.table.to_string(),
                column: name.clone(),
            })?;
        let id = self
            .schema
            .column_id(idx)
            .ok_or_else(|| internal!("missing id for column {name}"))?;
        Ok((id, &column.datatype))
    }

    fn bind_condition(&self, expr: &Expr) -> Result<Condition> {
        match expr {
            Expr::BinaryExpr {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                let (column, datatype) = self.condition_column(left)?;
                let value = self.bind_value(right, datatype)?;
                Ok(Condition::eq(column, value))
            }
            Expr::InList { expr, list } => {
                let (column, datatype) = self.condition_column(expr)?;
                let values = list
                    .iter()
                    .map(|e| self.bind_value(e, datatype))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Condition::in_list(column, values))
            }
            other => Err(ExecError::Unsupported(format!(
                "Condition '{other}', only '=' and 'IN' are supported on system tables"
            ))),
        }
    }

    fn condition_column(&self, expr: &Expr) -> Result<(ColumnId, &DataType)> {
        match expr {
            Expr::Ident(ident) => self.resolve_column(ident),
            other => Err(ExecError::Unsupported(format!(
                "Expected a column on the left side of a condition, got '{other}'"
            ))),
        }
    }

    /// Produce a value of `datatype` from a literal or bind marker.
    fn bind_value(&self, expr: &Expr, datatype: &DataType) -> Result<ScalarValue> {
        match expr {
            Expr::Placeholder(var) => self
                .binds
                .get(&var.pos)
                .map(|v| (*v).clone())
                .ok_or_else(|| ExecError::InvalidArgument(format!("No value bound for {var}"))),
            Expr::Literal(lit) => literal_to_scalar(lit, datatype),
            other => Err(ExecError::Unsupported(format!(
                "Expected a literal or bind marker, got '{other}'"
            ))),
        }
    }
}

fn literal_to_scalar(lit: &Literal, datatype: &DataType) -> Result<ScalarValue> {
    let invalid = || {
        ExecError::InvalidArgument(format!("Invalid {datatype} literal: {lit}"))
    };

    Ok(match (lit, datatype) {
        (Literal::Null, _) => ScalarValue::Null,
        (Literal::Boolean(b), DataType::Boolean) => ScalarValue::Boolean(*b),
        (Literal::SingleQuotedString(s), DataType::Text) => ScalarValue::Text(s.clone()),
        (Literal::Number(n), DataType::Int8) => ScalarValue::Int8(n.parse().map_err(|_| invalid())?),
        (Literal::Number(n), DataType::Int16) => {
            ScalarValue::Int16(n.parse().map_err(|_| invalid())?)
        }
        (Literal::Number(n), DataType::Int32) => {
            ScalarValue::Int32(n.parse().map_err(|_| invalid())?)
        }
        (Literal::Number(n), DataType::Int64) => {
            ScalarValue::Int64(n.parse().map_err(|_| invalid())?)
        }
        (Literal::Number(n), DataType::Float) => {
            ScalarValue::Float(n.parse().map_err(|_| invalid())?)
        }
        (Literal::Number(n), DataType::Double) => {
            ScalarValue::Double(n.parse().map_err(|_| invalid())?)
        }
        _ => return Err(invalid()),
    })
}
