//! Permissions data served by the CLI.
//!
//! There is no persistent store behind the CLI, so queries run against a
//! small fixed set of roles and grants.
use std::sync::Arc;

use qlfront_catalog::errors::Result;
use qlfront_catalog::metadata::{Permission, PermissionsManager};

/// Build an initialized permissions manager holding the demo roles.
///
/// - `cassandra`: superuser with every permission on `data`.
/// - `app`: login role, member of `cassandra`, may read and write `data/app`.
/// - `reader`: no login, may read `data/app`.
pub fn demo_permissions() -> Result<Arc<PermissionsManager>> {
    let permissions = Arc::new(PermissionsManager::new());

    permissions.create_role("cassandra", true, true)?;
    permissions.create_role("app", true, false)?;
    permissions.create_role("reader", false, false)?;
    permissions.grant_role("cassandra", "app")?;

    permissions.grant("cassandra", "data", Permission::ALL.iter().copied())?;
    permissions.grant("app", "data/app", [Permission::Select, Permission::Modify])?;
    permissions.grant("reader", "data/app", [Permission::Select])?;

    permissions.mark_initialized();
    Ok(permissions)
}
