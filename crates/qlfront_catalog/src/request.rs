use bytes::{Buf, BufMut, Bytes, BytesMut};
use qlfront_repr::scalar::ScalarValue;
use qlfront_repr::schema::ColumnId;

use crate::errors::{CatalogError, Result};

/// Consistency requested by the client. Virtual tables are computed locally
/// and treat this as a hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consistency {
    #[default]
    One,
    Quorum,
    LocalQuorum,
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditionOp {
    /// `column = value`
    Eq(ScalarValue),
    /// `column IN (values)`
    In(Vec<ScalarValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnId,
    pub op: ConditionOp,
}

impl Condition {
    pub fn eq(column: ColumnId, value: impl Into<ScalarValue>) -> Self {
        Condition {
            column,
            op: ConditionOp::Eq(value.into()),
        }
    }

    pub fn in_list(column: ColumnId, values: impl IntoIterator<Item = ScalarValue>) -> Self {
        Condition {
            column,
            op: ConditionOp::In(values.into_iter().collect()),
        }
    }

    pub fn values(&self) -> &[ScalarValue] {
        match &self.op {
            ConditionOp::Eq(v) => std::slice::from_ref(v),
            ConditionOp::In(vs) => vs,
        }
    }

    pub fn matches(&self, value: &ScalarValue) -> bool {
        self.values().iter().any(|v| v == value)
    }
}

/// Where to resume a paged read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingState {
    /// Index of the next row to return.
    pub next_row: u64,
}

impl PagingState {
    const ENCODED_LEN: usize = 8;

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::ENCODED_LEN);
        buf.put_u64(self.next_row);
        buf.freeze()
    }

    /// Decode a paging state received from a client.
    pub fn decode(mut buf: &[u8]) -> Result<Self> {
        if buf.len() != Self::ENCODED_LEN {
            return Err(CatalogError::InvalidPagingState);
        }
        Ok(PagingState {
            next_row: buf.get_u64(),
        })
    }
}

/// Read request against a table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryRequest {
    /// Columns to return, in order. Empty selects every column.
    pub columns: Vec<ColumnId>,
    /// Conditions a row must satisfy, all of them.
    pub conditions: Vec<Condition>,
    /// Max rows to return.
    pub limit: Option<usize>,
    pub paging_state: Option<PagingState>,
    pub consistency: Consistency,
}

impl QueryRequest {
    pub fn with_columns(columns: impl IntoIterator<Item = ColumnId>) -> Self {
        QueryRequest {
            columns: columns.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_paging_state(mut self, state: PagingState) -> Self {
        self.paging_state = Some(state);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_state_encoding() {
        let state = PagingState { next_row: 300 };
        let encoded = state.encode();
        assert_eq!(&[0, 0, 0, 0, 0, 0, 1, 44], encoded.as_ref());
        assert_eq!(state, PagingState::decode(&encoded).unwrap());
    }

    #[test]
    fn paging_state_wrong_length() {
        let err = PagingState::decode(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidPagingState));
    }

    #[test]
    fn condition_matching() {
        let cond = Condition::in_list(ColumnId(0), ["a".into(), "b".into()]);
        assert!(cond.matches(&"b".into()));
        assert!(!cond.matches(&"c".into()));

        let cond = Condition::eq(ColumnId(1), "a");
        assert!(cond.matches(&"a".into()));
        assert!(!cond.matches(&ScalarValue::Null));
    }
}
