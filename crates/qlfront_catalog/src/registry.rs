use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::{CatalogError, Result, internal};
use crate::metadata::PermissionsManager;
use crate::tables::system_auth::{ResourceRolePermissionsIndex, RolePermissions, Roles};
use crate::vtable::VirtualTable;

/// Virtual tables by `keyspace.table`.
#[derive(Debug, Default)]
pub struct VirtualTableRegistry {
    tables: HashMap<String, Arc<dyn VirtualTable>>,
}

impl VirtualTableRegistry {
    /// Create a registry with every system table backed by `permissions`.
    pub fn try_new(permissions: Arc<PermissionsManager>, lock_timeout: Duration) -> Result<Self> {
        let tables: Vec<Arc<dyn VirtualTable>> = vec![
            Arc::new(ResourceRolePermissionsIndex::try_new(
                permissions.clone(),
                lock_timeout,
            )?),
            Arc::new(Roles::try_new(permissions.clone(), lock_timeout)?),
            Arc::new(RolePermissions::try_new(permissions, lock_timeout)?),
        ];

        let mut registry = Self::default();
        for table in tables {
            registry.register(table)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, table: Arc<dyn VirtualTable>) -> Result<()> {
        let name = table.qualified_name().to_lowercase();
        if self.tables.contains_key(&name) {
            return Err(internal!("duplicate virtual table: {name}"));
        }
        debug!(%name, "registered virtual table");
        self.tables.insert(name, table);
        Ok(())
    }

    /// Look up a table. Names are case-insensitive.
    pub fn get(&self, keyspace: &str, name: &str) -> Result<Arc<dyn VirtualTable>> {
        let qualified = format!("{keyspace}.{name}").to_lowercase();
        self.tables
            .get(&qualified)
            .cloned()
            .ok_or(CatalogError::UnknownTable(qualified))
    }

    pub fn contains(&self, keyspace: &str, name: &str) -> bool {
        self.get(keyspace, name).is_ok()
    }

    /// Check if any table lives in `keyspace`.
    pub fn is_virtual_keyspace(&self, keyspace: &str) -> bool {
        self.tables
            .values()
            .any(|t| t.keyspace().eq_ignore_ascii_case(keyspace))
    }

    pub fn tables_iter(&self) -> impl Iterator<Item = &Arc<dyn VirtualTable>> {
        self.tables.values()
    }
}
