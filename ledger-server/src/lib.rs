//! Loyalty Ledger Server - 会员积分台账服务
//!
//! # 架构概述
//!
//! 单进程边缘服务，嵌入式 SurrealDB 存储，提供以下核心功能：
//!
//! - **积分台账** (`ledger`): 录入与兑换的事务性核心
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储与仓储层
//! - **认证** (`auth`): JWT + Argon2 认证体系、角色权限
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! ledger-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证、权限
//! ├── ledger/        # 积分台账（事务核心）
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层（模型、仓储）
//! └── utils/         # 错误、日志、校验
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod ledger;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use ledger::{AccrualReceipt, LedgerError, LedgerService, RedemptionReceipt, StaffContext};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 安全事件走独立 target，便于单独收集
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
