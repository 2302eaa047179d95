//! Tables in the `system_auth` keyspace.
use qlfront_repr::datatype::DataType;
use qlfront_repr::row::Row;
use qlfront_repr::scalar::ScalarValue;
use qlfront_repr::schema::{ColumnSchema, Schema};

use super::{SystemTable, SystemTableImpl};
use crate::errors::Result;
use crate::metadata::{Permission, PermissionsSnapshot, RoleInfo};

pub const SYSTEM_AUTH_KEYSPACE: &str = "system_auth";

fn text_list<'a>(items: impl IntoIterator<Item = &'a str>) -> ScalarValue {
    ScalarValue::List(items.into_iter().map(ScalarValue::from).collect())
}

pub type ResourceRolePermissionsIndex = SystemTable<ResourceRolePermissionsIndexImpl>;

/// Which roles hold permissions on which resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRolePermissionsIndexImpl;

impl SystemTableImpl for ResourceRolePermissionsIndexImpl {
    const KEYSPACE: &'static str = SYSTEM_AUTH_KEYSPACE;
    const NAME: &'static str = "resource_role_permissions_index";

    /// (resource, role)
    type Extract = Vec<(String, String)>;

    fn create_schema() -> Result<Schema> {
        Ok(Schema::try_new(
            [
                ColumnSchema::new("resource", DataType::Text),
                ColumnSchema::new("role", DataType::Text),
            ],
            2,
        )?)
    }

    fn extract(snapshot: &PermissionsSnapshot) -> Self::Extract {
        snapshot
            .resource_role_pairs()
            .into_iter()
            .map(|(resource, role)| (resource.to_string(), role.to_string()))
            .collect()
    }

    fn rows(pairs: Self::Extract) -> Vec<Row> {
        pairs
            .into_iter()
            .map(|(resource, role)| Row::from_iter([resource.into(), role.into()]))
            .collect()
    }
}

pub type Roles = SystemTable<RolesImpl>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolesImpl;

impl SystemTableImpl for RolesImpl {
    const KEYSPACE: &'static str = SYSTEM_AUTH_KEYSPACE;
    const NAME: &'static str = "roles";

    type Extract = Vec<(String, RoleInfo)>;

    fn create_schema() -> Result<Schema> {
        Ok(Schema::try_new(
            [
                ColumnSchema::new("role", DataType::Text),
                ColumnSchema::new("can_login", DataType::Boolean),
                ColumnSchema::new("is_superuser", DataType::Boolean),
                ColumnSchema::new("member_of", DataType::list(DataType::Text)),
            ],
            1,
        )?)
    }

    fn extract(snapshot: &PermissionsSnapshot) -> Self::Extract {
        snapshot
            .roles
            .iter()
            .map(|(role, info)| (role.clone(), info.clone()))
            .collect()
    }

    fn rows(roles: Self::Extract) -> Vec<Row> {
        roles
            .into_iter()
            .map(|(role, info)| {
                Row::from_iter([
                    role.into(),
                    info.can_login.into(),
                    info.is_superuser.into(),
                    text_list(info.member_of.iter().map(|s| s.as_str())),
                ])
            })
            .collect()
    }
}

pub type RolePermissions = SystemTable<RolePermissionsImpl>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePermissionsImpl;

impl SystemTableImpl for RolePermissionsImpl {
    const KEYSPACE: &'static str = SYSTEM_AUTH_KEYSPACE;
    const NAME: &'static str = "role_permissions";

    /// (role, resource, permissions)
    type Extract = Vec<(String, String, Vec<Permission>)>;

    fn create_schema() -> Result<Schema> {
        Ok(Schema::try_new(
            [
                ColumnSchema::new("role", DataType::Text),
                ColumnSchema::new("resource", DataType::Text),
                ColumnSchema::new("permissions", DataType::list(DataType::Text)),
            ],
            2,
        )?)
    }

    fn extract(snapshot: &PermissionsSnapshot) -> Self::Extract {
        snapshot
            .grants
            .iter()
            .flat_map(|(role, resources)| {
                resources.iter().map(move |(resource, perms)| {
                    (role.clone(), resource.clone(), perms.iter().copied().collect())
                })
            })
            .collect()
    }

    fn rows(grants: Self::Extract) -> Vec<Row> {
        grants
            .into_iter()
            .map(|(role, resource, perms)| {
                Row::from_iter([
                    role.into(),
                    resource.into(),
                    text_list(perms.iter().map(|p| p.as_str())),
                ])
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use qlfront_repr::schema::ColumnId;

    use super::*;
    use crate::errors::CatalogError;
    use crate::metadata::{Permission, PermissionsManager};
    use crate::request::{Condition, PagingState, QueryRequest};
    use crate::vtable::{VirtualTable, retrieve_page};

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn permissions() -> Arc<PermissionsManager> {
        let manager = PermissionsManager::new();
        manager.create_role("r1", true, false).unwrap();
        manager.create_role("r2", false, false).unwrap();
        manager.create_role("admin", true, true).unwrap();
        manager.grant_role("admin", "r1").unwrap();
        manager.grant("r1", "data/ks1", [Permission::Select]).unwrap();
        manager
            .grant("r2", "data/ks1", [Permission::Select, Permission::Modify])
            .unwrap();
        manager.grant("r1", "data/ks2", [Permission::Alter]).unwrap();
        manager.mark_initialized();
        Arc::new(manager)
    }

    fn texts(block: &qlfront_repr::row::RowBlock) -> Vec<Vec<String>> {
        block
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn extract_copies_only_table_fields() {
        let snapshot = permissions().snapshot(TIMEOUT).unwrap();

        let pairs = ResourceRolePermissionsIndexImpl::extract(&snapshot);
        assert_eq!(
            vec![
                ("data/ks1".to_string(), "r1".to_string()),
                ("data/ks1".to_string(), "r2".to_string()),
                ("data/ks2".to_string(), "r1".to_string()),
            ],
            pairs
        );

        let grants = RolePermissionsImpl::extract(&snapshot);
        assert_eq!(3, grants.len());
        assert_eq!(
            ("r2".to_string(), "data/ks1".to_string(), vec![Permission::Select, Permission::Modify]),
            grants[2]
        );

        let roles: Vec<_> = RolesImpl::extract(&snapshot)
            .into_iter()
            .map(|(role, _)| role)
            .collect();
        assert_eq!(vec!["admin", "r1", "r2"], roles);
    }

    #[test]
    fn resource_role_index_rows() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();
        let block = table.retrieve_data(&QueryRequest::default()).unwrap();

        assert_eq!(table.schema(), block.schema());
        assert_eq!(
            vec![
                vec!["data/ks1", "r1"],
                vec!["data/ks1", "r2"],
                vec!["data/ks2", "r1"],
            ],
            texts(&block)
        );
    }

    #[test]
    fn project_and_reorder() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();
        let request = QueryRequest::with_columns([ColumnId(1), ColumnId(0)]);
        let block = table.retrieve_data(&request).unwrap();

        let names: Vec<_> = block.schema().columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(vec!["role", "resource"], names);
        assert_eq!(&[ColumnId(1), ColumnId(0)], block.schema().column_ids());
        assert_eq!(0, block.schema().num_key_columns());
        assert_eq!(vec!["r1", "data/ks1"], texts(&block)[0]);
    }

    #[test]
    fn key_prefix_kept_when_in_place() {
        let table = Roles::try_new(permissions(), TIMEOUT).unwrap();
        let request = QueryRequest::with_columns([ColumnId(0), ColumnId(3)]);
        let block = table.retrieve_data(&request).unwrap();
        assert_eq!(1, block.schema().num_key_columns());
    }

    #[test]
    fn unknown_column() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();
        let request = QueryRequest::with_columns([ColumnId(0), ColumnId(7)]);
        let err = table.retrieve_data(&request).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownColumn { id: ColumnId(7), .. }));

        let request = QueryRequest::default().with_condition(Condition::eq(ColumnId(9), "x"));
        let err = table.retrieve_data(&request).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownColumn { id: ColumnId(9), .. }));
    }

    #[test]
    fn condition_type_checked() {
        let table = Roles::try_new(permissions(), TIMEOUT).unwrap();
        let request =
            QueryRequest::default().with_condition(Condition::eq(ColumnId(1), "yes"));
        let err = table.retrieve_data(&request).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCondition { .. }));
    }

    #[test]
    fn filter_eq_and_in() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();
        let request = QueryRequest::default()
            .with_condition(Condition::eq(ColumnId(0), "data/ks1"))
            .with_condition(Condition::in_list(
                ColumnId(1),
                ["r2".into(), "missing".into()],
            ));
        let block = table.retrieve_data(&request).unwrap();
        assert_eq!(vec![vec!["data/ks1", "r2"]], texts(&block));
    }

    #[test]
    fn roles_rows() {
        let table = Roles::try_new(permissions(), TIMEOUT).unwrap();
        let block = table.retrieve_data(&QueryRequest::default()).unwrap();
        assert_eq!(
            vec![
                vec!["admin", "true", "true", "[]"],
                vec!["r1", "true", "false", "[admin]"],
                vec!["r2", "false", "false", "[]"],
            ],
            texts(&block)
        );
    }

    #[test]
    fn role_permissions_rows() {
        let table = RolePermissions::try_new(permissions(), TIMEOUT).unwrap();
        let request = QueryRequest::default().with_condition(Condition::eq(ColumnId(0), "r2"));
        let block = table.retrieve_data(&request).unwrap();
        assert_eq!(
            vec![vec!["r2", "data/ks1", "[SELECT, MODIFY]"]],
            texts(&block)
        );
    }

    #[test]
    fn reflects_metadata_changes() {
        let permissions = permissions();
        let table = ResourceRolePermissionsIndex::try_new(permissions.clone(), TIMEOUT).unwrap();
        assert_eq!(3, table.retrieve_data(&QueryRequest::default()).unwrap().num_rows());

        permissions.revoke("r1", "data/ks2", [Permission::Alter]).unwrap();
        assert_eq!(2, table.retrieve_data(&QueryRequest::default()).unwrap().num_rows());
    }

    #[test]
    fn uninitialized_metadata_retryable() {
        let table =
            ResourceRolePermissionsIndex::try_new(Arc::new(PermissionsManager::new()), TIMEOUT)
                .unwrap();
        let err = table.retrieve_data(&QueryRequest::default()).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn lock_timeout_retryable() {
        let permissions = permissions();
        let table =
            ResourceRolePermissionsIndex::try_new(permissions.clone(), Duration::from_millis(5))
                .unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let writer = std::thread::spawn(move || {
            permissions.hold_write_lock(Duration::from_millis(200), || tx.send(()).unwrap());
        });
        rx.recv().unwrap();

        let err = table.retrieve_data(&QueryRequest::default()).unwrap_err();
        assert!(err.is_retryable());
        writer.join().unwrap();
    }

    #[test]
    fn schema_stable() {
        let table = RolePermissions::try_new(permissions(), TIMEOUT).unwrap();
        assert_eq!(table.schema(), &table.create_schema().unwrap());
        assert_eq!(table.create_schema().unwrap(), table.create_schema().unwrap());
        assert_eq!("system_auth.role_permissions", table.qualified_name());
    }

    #[test]
    fn paging() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();

        let request = QueryRequest::default().with_limit(2);
        let page = retrieve_page(&table, &request).unwrap();
        assert_eq!(2, page.block.num_rows());
        assert_eq!(Some(PagingState { next_row: 2 }), page.paging_state);

        let request = request.with_paging_state(PagingState { next_row: 2 });
        let page = retrieve_page(&table, &request).unwrap();
        assert_eq!(vec![vec!["data/ks2", "r1"]], texts(&page.block));
        assert_eq!(None, page.paging_state);
    }

    #[test]
    fn zero_limit_page_ends_paging() {
        let table = ResourceRolePermissionsIndex::try_new(permissions(), TIMEOUT).unwrap();

        let request = QueryRequest::default().with_limit(0);
        let page = retrieve_page(&table, &request).unwrap();
        assert!(page.block.is_empty());
        assert_eq!(None, page.paging_state);

        let request = request.with_paging_state(PagingState { next_row: 1 });
        let page = retrieve_page(&table, &request).unwrap();
        assert_eq!(None, page.paging_state);
    }
}
