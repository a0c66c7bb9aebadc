//! 积分台账模块
//!
//! 系统中唯一需要严格原子性的地方：
//! - [`LedgerService::accrue_points`] - 录入积分（重复小票由主键唯一性拒绝）
//! - [`LedgerService::redeem_reward`] - 兑换（库存、余额、流水同事务扣减）
//! - [`LedgerService::migrate_phone`] - 会员换号（记录与流水整体搬迁）
//!
//! 写操作都以单条 `BEGIN TRANSACTION … COMMIT` 脚本执行，
//! 前置条件不满足时 `THROW`，整个事务回滚，零副作用。

pub mod error;
pub mod service;

pub use error::LedgerError;
pub use service::{AccrualReceipt, LedgerService, RedemptionReceipt, StaffContext};
