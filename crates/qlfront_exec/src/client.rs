use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use qlfront_repr::datatype::{TypeResolver, UserTypeDef};
use tracing::debug;

/// Client-side metadata needed to decode row payloads.
///
/// Shared by every result produced for a client.
#[derive(Debug, Default)]
pub struct ClientContext {
    /// User-defined types keyed by (keyspace, name).
    types: RwLock<HashMap<(String, String), Arc<UserTypeDef>>>,
}

impl ClientContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user-defined type.
    pub fn register_type(&self, def: UserTypeDef) {
        debug!(keyspace = %def.keyspace, name = %def.name, "registered user type");
        let key = (def.keyspace.clone(), def.name.clone());
        self.types.write().insert(key, Arc::new(def));
    }

    pub fn drop_type(&self, keyspace: &str, name: &str) -> bool {
        self.types
            .write()
            .remove(&(keyspace.to_string(), name.to_string()))
            .is_some()
    }
}

impl TypeResolver for ClientContext {
    fn resolve_user_type(&self, keyspace: &str, name: &str) -> Option<Arc<UserTypeDef>> {
        self.types
            .read()
            .get(&(keyspace.to_string(), name.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use qlfront_repr::datatype::DataType;

    use super::*;

    #[test]
    fn register_and_resolve() {
        let client = ClientContext::new();
        assert!(client.resolve_user_type("ks", "addr").is_none());

        client.register_type(UserTypeDef {
            keyspace: "ks".to_string(),
            name: "addr".to_string(),
            fields: vec![("street".to_string(), DataType::Text)],
        });
        let def = client.resolve_user_type("ks", "addr").unwrap();
        assert_eq!(1, def.fields.len());

        assert!(client.drop_type("ks", "addr"));
        assert!(!client.drop_type("ks", "addr"));
        assert!(client.resolve_user_type("ks", "addr").is_none());
    }
}
