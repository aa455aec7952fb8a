use nursery_core::permissions;
use nursery_models::AdminLevel;
use serde_json::Value;

pub use nursery_models::staff::{
    AdminResetPasswordDto, AdminWithUser, CreateAdminDto, PaginatedAdminsResponse,
    StaffFilterParams, UpdateAdminDto,
};

pub(crate) const ADMIN_SELECT: &str = r#"SELECT a.id, a.user_id, u.first_name, u.last_name, u.email, u.phone_number,
       a.admin_level, a.permissions, a.is_active, u.is_superuser, u.must_change_password,
       u.last_login, a.created_at
FROM admins a
JOIN users u ON u.id = a.user_id"#;

/// Permissions stored for a new admin: super admins always get every
/// permission, otherwise the explicit map or the level's defaults.
pub fn resolve_permissions(level: AdminLevel, explicit: Option<Value>) -> Value {
    match (level, explicit) {
        (AdminLevel::SuperAdmin, _) => permissions::all(),
        (_, Some(map)) => map,
        (AdminLevel::Admin, None) => permissions::default_admin(),
        (AdminLevel::Moderator, None) => permissions::default_moderator(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_super_admin_gets_everything() {
        let perms = resolve_permissions(AdminLevel::SuperAdmin, Some(json!({})));
        assert!(permissions::has(&perms, permissions::MANAGE_ADMINS));
        assert!(permissions::has(&perms, permissions::MANAGE_SYSTEM));
    }

    #[test]
    fn test_level_defaults() {
        let admin = resolve_permissions(AdminLevel::Admin, None);
        assert!(permissions::has(&admin, permissions::MANAGE_CLASSES));
        assert!(!permissions::has(&admin, permissions::MANAGE_ADMINS));

        let moderator = resolve_permissions(AdminLevel::Moderator, None);
        assert!(permissions::has(&moderator, permissions::VIEW_ALL_DATA));
        assert!(!permissions::has(&moderator, permissions::MANAGE_CLASSES));
    }

    #[test]
    fn test_explicit_map_kept() {
        let perms = resolve_permissions(
            AdminLevel::Admin,
            Some(json!({ "delete_data": true })),
        );
        assert!(permissions::has(&perms, permissions::DELETE_DATA));
        assert!(!permissions::has(&perms, permissions::MANAGE_USERS));
    }
}
