use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::datatype::DataType;

/// A single value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    List(Vec<ScalarValue>),
    Set(Vec<ScalarValue>),
    Map(Vec<(ScalarValue, ScalarValue)>),
    /// Field values of a user-defined type, in declaration order.
    UserDefined(Vec<ScalarValue>),
}

impl ScalarValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Check if this value can be stored in a column of the given type.
    ///
    /// Nulls are accepted for every type. Field layout of user-defined types
    /// isn't checked since that requires client-side metadata.
    pub fn is_of_type(&self, datatype: &DataType) -> bool {
        match (self, datatype) {
            (ScalarValue::Null, _) => true,
            (ScalarValue::Boolean(_), DataType::Boolean) => true,
            (ScalarValue::Int8(_), DataType::Int8) => true,
            (ScalarValue::Int16(_), DataType::Int16) => true,
            (ScalarValue::Int32(_), DataType::Int32) => true,
            (ScalarValue::Int64(_), DataType::Int64) => true,
            (ScalarValue::Float(_), DataType::Float) => true,
            (ScalarValue::Double(_), DataType::Double) => true,
            (ScalarValue::Text(_), DataType::Text) => true,
            (ScalarValue::Binary(_), DataType::Binary) => true,
            (ScalarValue::Timestamp(_), DataType::Timestamp) => true,
            (ScalarValue::Uuid(_), DataType::Uuid) => true,
            (ScalarValue::List(vals), DataType::List(elem))
            | (ScalarValue::Set(vals), DataType::Set(elem)) => {
                vals.iter().all(|v| v.is_of_type(elem))
            }
            (ScalarValue::Map(entries), DataType::Map(key, value)) => entries
                .iter()
                .all(|(k, v)| k.is_of_type(key) && v.is_of_type(value)),
            (ScalarValue::UserDefined(_), DataType::UserDefined { .. }) => true,
            _ => false,
        }
    }

    pub fn try_as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn try_as_i64(&self) -> Option<i64> {
        Some(match self {
            ScalarValue::Int8(v) => *v as i64,
            ScalarValue::Int16(v) => *v as i64,
            ScalarValue::Int32(v) => *v as i64,
            ScalarValue::Int64(v) => *v,
            _ => return None,
        })
    }

    pub fn try_as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, close: &str, vals: &[ScalarValue]) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, val) in vals.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{val}")?;
    }
    write!(f, "{close}")
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
            Self::Binary(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.3f%z")),
            Self::Uuid(v) => write!(f, "{v}"),
            Self::List(vals) => write_list(f, "[", "]", vals),
            Self::Set(vals) => write_list(f, "{", "}", vals),
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (k, v)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::UserDefined(fields) => write_list(f, "{", "}", fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_matches_any_type() {
        assert!(ScalarValue::Null.is_of_type(&DataType::Int32));
        assert!(ScalarValue::Null.is_of_type(&DataType::list(DataType::Text)));
    }

    #[test]
    fn nested_type_check() {
        let list = ScalarValue::List(vec!["a".into(), ScalarValue::Null]);
        assert!(list.is_of_type(&DataType::list(DataType::Text)));
        assert!(!list.is_of_type(&DataType::list(DataType::Int32)));
        assert!(!list.is_of_type(&DataType::set(DataType::Text)));
    }

    #[test]
    fn display_values() {
        assert_eq!("[a, NULL]", ScalarValue::List(vec!["a".into(), ScalarValue::Null]).to_string());
        assert_eq!("0x0aff", ScalarValue::Binary(vec![10, 255]).to_string());
        assert_eq!(
            "{k: 1}",
            ScalarValue::Map(vec![("k".into(), ScalarValue::Int32(1))]).to_string()
        );
    }
}
