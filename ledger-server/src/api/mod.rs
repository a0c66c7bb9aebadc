//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`members`] - 会员接口（注册、余额查询、管理）
//! - [`rewards`] - 奖品目录与兑换接口
//! - [`points`] - 积分录入与流水接口
//! - [`redemptions`] - 兑换流水接口
//! - [`staff`] - 员工账号管理接口

pub mod auth;
pub mod health;
pub mod members;
pub mod points;
pub mod redemptions;
pub mod rewards;
pub mod staff;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
