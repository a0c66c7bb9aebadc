//! Repository Module
//!
//! Provides CRUD operations for SurrealDB tables.

// Auth
pub mod staff;

// Loyalty domain
pub mod accrual_log;
pub mod member;
pub mod redemption_log;
pub mod reward;

// Re-exports
pub use accrual_log::AccrualLogRepository;
pub use member::MemberRepository;
pub use redemption_log::RedemptionLogRepository;
pub use reward::RewardRepository;
pub use staff::StaffRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for crate::utils::AppError {
    fn from(err: RepoError) -> Self {
        use crate::utils::AppError;
        match err {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Database(msg) => AppError::Database(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 全栈统一使用 "table:id" 格式
// =============================================================================
//
// 使用 surrealdb::RecordId 处理所有 ID：
//   - 解析: let id: RecordId = "reward:abc".parse()?;
//   - 创建: let id = RecordId::from_table_key("reward", "abc");
//   - CRUD: db.select(id) / db.delete(id) 直接使用 RecordId

/// Parse an API id parameter into a RecordId for the given table.
/// Accepts both "table:id" and the bare key.
pub fn parse_record_id(table: &str, id: &str) -> RepoResult<RecordId> {
    if id.contains(':') {
        let rid: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        if rid.table() != table {
            return Err(RepoError::Validation(format!(
                "Invalid ID for {}: {}",
                table, id
            )));
        }
        Ok(rid)
    } else {
        Ok(RecordId::from_table_key(table, id))
    }
}

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
