//! Staff API Handlers

use axum::{
    Json,
    extract::{Extension, Path, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Staff, StaffCreate, StaffUpdate};
use crate::db::repository::StaffRepository;
use crate::utils::{AppError, AppResult};

/// GET /api/staff - 获取所有员工账号
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Staff>>> {
    let staff = StaffRepository::new(state.db.clone()).find_all().await?;
    Ok(Json(staff))
}

/// POST /api/staff - 创建员工账号
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<StaffCreate>,
) -> AppResult<Json<Staff>> {
    let staff = StaffRepository::new(state.db.clone()).create(payload).await?;

    tracing::info!(username = %staff.username, role = %staff.role, "staff account created");

    Ok(Json(staff))
}

/// PUT /api/staff/{id} - 更新员工账号（含改密、改角色、停用）
pub async fn update(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<StaffUpdate>,
) -> AppResult<Json<Staff>> {
    // 管理员不能停用或降级自己的账号
    if current_user.id == id || current_user.id == format!("staff:{}", id) {
        if payload.is_active == Some(false) {
            return Err(AppError::business_rule(
                "Cannot disable your own account",
            ));
        }
        if payload.role.as_deref() == Some("staff") {
            return Err(AppError::business_rule(
                "Cannot demote your own account",
            ));
        }
    }

    let staff = StaffRepository::new(state.db.clone())
        .update(&id, payload)
        .await?;
    Ok(Json(staff))
}

/// DELETE /api/staff/{id} - 删除员工账号
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> AppResult<Json<bool>> {
    if current_user.id == id || current_user.id == format!("staff:{}", id) {
        return Err(AppError::business_rule("Cannot delete your own account"));
    }

    let result = StaffRepository::new(state.db.clone()).delete(&id).await?;
    Ok(Json(result))
}
