//! Permission Definitions
//!
//! Simplified RBAC permission system.
//!
//! ## 设计原则
//! - 基础操作（积分录入、兑换、查余额）无需单独权限，员工登录即可使用
//! - 模块化权限：`members:manage` / `rewards:manage` / `logs:manage` /
//!   `reports:view`，在路由层用 [`crate::auth::require_permission`] 检查
//! - 员工账号管理：仅 admin 角色可用（`all` 覆盖一切）

/// Default role permissions
pub const DEFAULT_ADMIN_PERMISSIONS: &[&str] = &["all"];

/// 柜台员工默认权限
pub const DEFAULT_STAFF_PERMISSIONS: &[&str] = &["reports:view"];

/// Get permissions for a role name
pub fn get_default_permissions(role_name: &str) -> Vec<String> {
    match role_name {
        "admin" => DEFAULT_ADMIN_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        "staff" => DEFAULT_STAFF_PERMISSIONS
            .iter()
            .map(|s| s.to_string())
            .collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults() {
        assert_eq!(get_default_permissions("admin"), vec!["all"]);
        assert_eq!(get_default_permissions("staff"), vec!["reports:view"]);
        assert!(get_default_permissions("unknown").is_empty());
    }
}
