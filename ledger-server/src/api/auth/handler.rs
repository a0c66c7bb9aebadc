//! Authentication Handlers
//!
//! Handles login and current-user introspection

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::auth::permissions::get_default_permissions;
use crate::core::ServerState;
use crate::db::repository::StaffRepository;
use crate::security_log;
use crate::utils::AppError;

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub branch_id: String,
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// POST /api/auth/login
///
/// Authenticates staff credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let repo = StaffRepository::new(state.db.clone());
    let staff = repo.find_by_username(&req.username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let staff = match staff {
        Some(s) => {
            if !s.is_active {
                return Err(AppError::forbidden("Account has been disabled"));
            }

            let password_valid = s
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                security_log!(
                    "WARN",
                    "login_failed",
                    username = req.username.clone(),
                    reason = "invalid_credentials"
                );
                return Err(AppError::invalid_credentials());
            }

            s
        }
        None => {
            security_log!(
                "WARN",
                "login_failed",
                username = req.username.clone(),
                reason = "user_not_found"
            );
            return Err(AppError::invalid_credentials());
        }
    };

    let staff_id = staff.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    let permissions = get_default_permissions(&staff.role);

    let token = state
        .jwt_service
        .generate_token(
            &staff_id,
            &staff.username,
            &staff.name,
            &staff.branch_id,
            &staff.role,
            &permissions,
        )
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;

    tracing::info!(
        staff_id = %staff_id,
        username = %staff.username,
        role = %staff.role,
        "Staff logged in"
    );

    Ok(Json(LoginResponse {
        token,
        user: UserInfo {
            id: staff_id,
            username: staff.username,
            name: staff.name,
            branch_id: staff.branch_id,
            role: staff.role,
            permissions,
        },
    }))
}

/// GET /api/auth/me - 当前登录员工信息（来自令牌）
pub async fn me(Extension(current_user): Extension<CurrentUser>) -> Json<UserInfo> {
    Json(UserInfo {
        id: current_user.id.clone(),
        username: current_user.username.clone(),
        name: current_user.name.clone(),
        branch_id: current_user.branch_id.clone(),
        role: current_user.role.clone(),
        permissions: current_user.permissions.clone(),
    })
}
