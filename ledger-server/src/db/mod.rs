//! Database Module
//!
//! Handles the embedded SurrealDB (RocksDB engine) connection and schema.

pub mod models;
pub mod repository;

use crate::utils::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Database service — owns the embedded SurrealDB handle
#[derive(Clone, Debug)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at the given path and apply schema
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

        db.use_ns("loyalty")
            .use_db("ledger")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

        Self::define_schema(&db).await?;

        tracing::info!("Database connection established (SurrealDB RocksDB engine)");

        Ok(Self { db })
    }

    /// Apply table and index definitions (idempotent)
    ///
    /// 重复小票与会员主键依赖 record key 唯一性，不需要额外唯一索引；
    /// phone 上的普通索引用于按会员检索流水。
    async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
        db.query(
            r#"
            DEFINE TABLE IF NOT EXISTS member SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS reward SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS staff SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS accrual_log SCHEMALESS;
            DEFINE TABLE IF NOT EXISTS redemption_log SCHEMALESS;
            DEFINE INDEX IF NOT EXISTS accrual_log_phone ON accrual_log FIELDS phone;
            DEFINE INDEX IF NOT EXISTS redemption_log_phone ON redemption_log FIELDS phone;
            DEFINE INDEX IF NOT EXISTS staff_username ON staff FIELDS username;
            "#,
        )
        .await
        .map_err(|e| AppError::database(format!("Failed to apply schema: {}", e)))?
        .check()
        .map_err(|e| AppError::database(format!("Failed to apply schema: {}", e)))?;

        Ok(())
    }
}
