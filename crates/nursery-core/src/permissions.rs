//! Permission keys stored in the `admins.permissions` JSONB column.
//!
//! The column holds a flat object of `key: bool`, e.g.
//! `{"manage_teachers": true, "manage_classes": true}`. Super admins always
//! receive [`all`]; regular admins get [`default_admin`] unless the creator
//! passes an explicit map.

use serde_json::{Map, Value};

pub const MANAGE_USERS: &str = "manage_users";
pub const MANAGE_TEACHERS: &str = "manage_teachers";
pub const MANAGE_ADMINS: &str = "manage_admins";
pub const MANAGE_CLASSES: &str = "manage_classes";
pub const MANAGE_STUDENTS: &str = "manage_students";
pub const VIEW_ALL_DATA: &str = "view_all_data";
pub const DELETE_DATA: &str = "delete_data";
pub const MANAGE_SYSTEM: &str = "manage_system";

pub const ALL: [&str; 8] = [
    MANAGE_USERS,
    MANAGE_TEACHERS,
    MANAGE_ADMINS,
    MANAGE_CLASSES,
    MANAGE_STUDENTS,
    VIEW_ALL_DATA,
    DELETE_DATA,
    MANAGE_SYSTEM,
];

const DEFAULT_ADMIN: [&str; 5] = [
    MANAGE_USERS,
    MANAGE_TEACHERS,
    MANAGE_CLASSES,
    MANAGE_STUDENTS,
    VIEW_ALL_DATA,
];

fn grant(keys: &[&str]) -> Value {
    let map: Map<String, Value> = keys
        .iter()
        .map(|k| ((*k).to_string(), Value::Bool(true)))
        .collect();
    Value::Object(map)
}

pub fn all() -> Value {
    grant(&ALL)
}

pub fn default_admin() -> Value {
    grant(&DEFAULT_ADMIN)
}

/// Moderators may only read.
pub fn default_moderator() -> Value {
    grant(&[VIEW_ALL_DATA])
}

pub fn is_known(key: &str) -> bool {
    ALL.contains(&key)
}

/// `true` when `permissions[key]` is the boolean `true`.
pub fn has(permissions: &Value, key: &str) -> bool {
    permissions
        .get(key)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Returns the first key in `permissions` that is not a known permission,
/// or whose value is not a boolean.
pub fn find_invalid(permissions: &Value) -> Option<String> {
    match permissions {
        Value::Object(map) => map
            .iter()
            .find(|(k, v)| !is_known(k) || !v.is_boolean())
            .map(|(k, _)| k.clone()),
        _ => Some("permissions".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_all_grants_everything() {
        let perms = all();
        for key in ALL {
            assert!(has(&perms, key), "{key} missing");
        }
    }

    #[test]
    fn test_default_admin_cannot_manage_admins() {
        let perms = default_admin();
        assert!(has(&perms, MANAGE_TEACHERS));
        assert!(!has(&perms, MANAGE_ADMINS));
        assert!(!has(&perms, DELETE_DATA));
    }

    #[test]
    fn test_has_ignores_non_bool() {
        let perms = json!({ "manage_users": "yes", "manage_classes": false });
        assert!(!has(&perms, MANAGE_USERS));
        assert!(!has(&perms, MANAGE_CLASSES));
    }

    #[test]
    fn test_find_invalid() {
        assert_eq!(find_invalid(&json!({ "manage_users": true })), None);
        assert_eq!(
            find_invalid(&json!({ "launch_rockets": true })),
            Some("launch_rockets".to_string())
        );
        assert_eq!(
            find_invalid(&json!({ "manage_users": 1 })),
            Some("manage_users".to_string())
        );
        assert_eq!(find_invalid(&json!([])), Some("permissions".to_string()));
    }
}
