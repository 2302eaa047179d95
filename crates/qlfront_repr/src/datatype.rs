use std::fmt;
use std::sync::Arc;

/// Logical type of a column or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    Text,
    Binary,
    Timestamp,
    Uuid,
    List(Box<DataType>),
    Set(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    /// A user-defined type.
    ///
    /// Only the name is carried here. The field layout lives in client-side
    /// metadata and is looked up through a [`TypeResolver`] when decoding.
    UserDefined { keyspace: String, name: String },
}

impl DataType {
    pub fn list(elem: DataType) -> Self {
        DataType::List(Box::new(elem))
    }

    pub fn set(elem: DataType) -> Self {
        DataType::Set(Box::new(elem))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map(Box::new(key), Box::new(value))
    }

    /// Width of the encoded value for fixed-width types.
    pub fn fixed_width(&self) -> Option<usize> {
        Some(match self {
            DataType::Boolean | DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 | DataType::Float => 4,
            DataType::Int64 | DataType::Double | DataType::Timestamp => 8,
            DataType::Uuid => 16,
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Int8 => write!(f, "tinyint"),
            Self::Int16 => write!(f, "smallint"),
            Self::Int32 => write!(f, "int"),
            Self::Int64 => write!(f, "bigint"),
            Self::Float => write!(f, "float"),
            Self::Double => write!(f, "double"),
            Self::Text => write!(f, "text"),
            Self::Binary => write!(f, "blob"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Uuid => write!(f, "uuid"),
            Self::List(elem) => write!(f, "list<{elem}>"),
            Self::Set(elem) => write!(f, "set<{elem}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::UserDefined { keyspace, name } => write!(f, "{keyspace}.{name}"),
        }
    }
}

/// Field layout of a user-defined type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTypeDef {
    pub keyspace: String,
    pub name: String,
    pub fields: Vec<(String, DataType)>,
}

/// Client-side lookup of type metadata that isn't embedded in row payloads.
pub trait TypeResolver: Sync + Send {
    fn resolve_user_type(&self, keyspace: &str, name: &str) -> Option<Arc<UserTypeDef>>;
}

/// Resolver for contexts where no user-defined types exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUserTypes;

impl TypeResolver for NoUserTypes {
    fn resolve_user_type(&self, _keyspace: &str, _name: &str) -> Option<Arc<UserTypeDef>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let dt = DataType::map(DataType::Text, DataType::list(DataType::Int32));
        assert_eq!("map<text, list<int>>", dt.to_string());
    }

    #[test]
    fn fixed_widths() {
        assert_eq!(Some(8), DataType::Timestamp.fixed_width());
        assert_eq!(Some(16), DataType::Uuid.fixed_width());
        assert_eq!(None, DataType::Text.fixed_width());
        assert_eq!(None, DataType::list(DataType::Int8).fixed_width());
    }
}
