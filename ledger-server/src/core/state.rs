use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::StaffCreate;
use crate::db::repository::StaffRepository;
use crate::ledger::LedgerService;
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是台账节点的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Arc<Config> | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | ledger | LedgerService | 积分台账服务（事务入口） |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub ledger: LedgerService,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 打开（必要时创建）嵌入式数据库，装配各个服务，
    /// 并在首次启动时引导出一个管理员账号。
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.work_dir)
            .map_err(|e| AppError::internal(format!("Failed to create work dir: {}", e)))?;

        let db_service = DbService::new(&config.db_path()).await?;
        let db = db_service.db.clone();

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let ledger = LedgerService::new(db.clone());

        let state = Self {
            config: Arc::new(config.clone()),
            db,
            jwt_service,
            ledger,
        };

        state.bootstrap_admin().await?;

        Ok(state)
    }

    /// 首次启动引导：员工表为空时创建管理员
    ///
    /// 初始密码随机生成，只在日志里打印一次。
    async fn bootstrap_admin(&self) -> Result<(), AppError> {
        let repo = StaffRepository::new(self.db.clone());
        if repo.count().await? > 0 {
            return Ok(());
        }

        let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = match std::env::var("ADMIN_PASSWORD") {
            Ok(p) if !p.is_empty() => p,
            _ => {
                let generated = crate::auth::generate_printable_secret(16);
                tracing::warn!(
                    username = %username,
                    password = %generated,
                    "No staff accounts found, bootstrapped admin with a generated password. \
                     Change it after first login."
                );
                generated
            }
        };

        repo.create(StaffCreate {
            username,
            password,
            name: "Administrator".to_string(),
            branch_id: self.config.branch_id.clone(),
            role: Some("admin".to_string()),
        })
        .await?;

        Ok(())
    }
}
