//! Loyalty Ledger Service
//!
//! 显式构造、显式传递的台账服务（进程启动时创建，挂在 ServerState 上）。
//! 所有共享状态都在 SurrealDB 里，原子性完全由存储层事务保证。
//!
//! # 事务脚本
//!
//! 两个写操作各自是一条多语句 SurrealQL 脚本：先读后验再写，
//! 任何一步 `THROW`（或 CREATE 主键冲突）都会取消整个事务。
//! RocksDB 引擎的乐观事务在并发冲突时会要求重试，
//! 服务内部做有限次重试；重试后前置条件不再满足时返回对应的类型化错误
//! （例如最后一件库存被并发兑走 → `RewardOutOfStock`）。

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::error::LedgerError;
use crate::auth::CurrentUser;
use crate::db::models::{Member, RedeemableReward};
use crate::db::repository::{MemberRepository, RewardRepository};
use crate::utils::validation::{is_valid_bill, is_valid_phone};

/// 事务冲突最大重试次数
const MAX_TXN_RETRIES: u32 = 3;

/// 积分录入事务：
/// 小票编号作为 accrual_log 的 record key，重复小票由
/// 主键唯一性在事务内拒绝（CREATE 失败 → 整个事务取消，余额不变）。
const ACCRUE_SQL: &str = r#"
BEGIN TRANSACTION;
CREATE type::thing('accrual_log', $bill) SET
    bill = $bill,
    phone = $phone,
    amount = $amount,
    points_added = $points,
    staff_id = $staff_id,
    staff_name = $staff_name,
    branch_id = $branch_id,
    is_deleted = false,
    delete_reason = NONE,
    created_at = time::now();
LET $m = (SELECT * FROM type::thing('member', $phone))[0];
IF $m == NONE {
    CREATE type::thing('member', $phone) SET
        phone = $phone,
        name = "",
        points = $points,
        last_reward = NONE,
        last_redeemed_at = NONE,
        birthday = NONE,
        created_at = time::now(),
        updated_at = time::now();
} ELSE {
    UPDATE type::thing('member', $phone) SET
        points += $points,
        updated_at = time::now();
};
LET $after = (SELECT VALUE points FROM type::thing('member', $phone))[0];
RETURN { points_added: $points, balance: $after };
COMMIT TRANSACTION;
"#;

/// 兑换事务：读取奖品与会员 → 六项前置校验 → 扣库存、扣余额、写流水。
/// 流水记录奖品名称与积分成本的快照。
const REDEEM_SQL: &str = r#"
BEGIN TRANSACTION;
LET $reward = (SELECT * FROM type::thing('reward', $reward_id))[0];
IF $reward == NONE { THROW "reward_not_found" };
IF $reward.is_active != true { THROW "reward_inactive" };
IF $reward.stock <= 0 { THROW "reward_out_of_stock" };
IF $reward.point_cost <= 0 { THROW "invalid_reward_cost" };
LET $member = (SELECT * FROM type::thing('member', $phone))[0];
IF $member == NONE { THROW "member_not_found" };
IF $member.points < $reward.point_cost {
    THROW "insufficient_points:" + <string>$reward.point_cost + ":" + <string>$member.points
};
UPDATE type::thing('reward', $reward_id) SET
    stock -= 1,
    updated_at = time::now();
UPDATE type::thing('member', $phone) SET
    points -= $reward.point_cost,
    last_reward = $reward.name,
    last_redeemed_at = time::now(),
    updated_at = time::now();
CREATE redemption_log SET
    phone = $phone,
    reward_id = <string>$reward.id,
    reward_name = $reward.name,
    points_used = $reward.point_cost,
    staff_id = $staff_id,
    staff_name = $staff_name,
    branch_id = $branch_id,
    is_deleted = false,
    delete_reason = NONE,
    created_at = time::now();
RETURN {
    reward_name: $reward.name,
    points_used: $reward.point_cost,
    balance: $member.points - $reward.point_cost,
    stock: $reward.stock - 1
};
COMMIT TRANSACTION;
"#;

/// 换号事务：会员记录搬到新手机号 key，两张流水表整体改写 phone 字段，
/// 最后删除旧记录。任何一步失败整个事务取消。
const MIGRATE_PHONE_SQL: &str = r#"
BEGIN TRANSACTION;
LET $old = (SELECT * FROM type::thing('member', $old_phone))[0];
IF $old == NONE { THROW "member_not_found" };
LET $taken = (SELECT * FROM type::thing('member', $new_phone))[0];
IF $taken != NONE { THROW "phone_in_use" };
CREATE type::thing('member', $new_phone) SET
    phone = $new_phone,
    name = $old.name,
    points = $old.points,
    last_reward = $old.last_reward,
    last_redeemed_at = $old.last_redeemed_at,
    birthday = $old.birthday,
    created_at = $old.created_at,
    updated_at = time::now();
UPDATE accrual_log SET phone = $new_phone WHERE phone = $old_phone;
UPDATE redemption_log SET phone = $new_phone WHERE phone = $old_phone;
DELETE type::thing('member', $old_phone);
RETURN (SELECT * FROM type::thing('member', $new_phone))[0];
COMMIT TRANSACTION;
"#;

/// 操作上下文：执行录入/兑换的员工信息（写入流水）
#[derive(Debug, Clone)]
pub struct StaffContext {
    pub staff_id: String,
    pub staff_name: String,
    pub branch_id: String,
}

impl From<&CurrentUser> for StaffContext {
    fn from(user: &CurrentUser) -> Self {
        Self {
            staff_id: user.id.clone(),
            staff_name: user.name.clone(),
            branch_id: user.branch_id.clone(),
        }
    }
}

/// 积分录入结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualReceipt {
    pub points_added: i64,
    pub balance: i64,
}

/// 兑换结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    pub reward_name: String,
    pub points_used: i64,
    pub balance: i64,
    pub stock: i64,
}

/// 单次事务尝试的结果
enum TxnOutcome<T> {
    Done(T),
    Retry,
    Fail(LedgerError),
}

/// Loyalty ledger service — the only component with atomicity requirements
#[derive(Clone, Debug)]
pub struct LedgerService {
    db: Surreal<Db>,
}

impl LedgerService {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// 录入积分：points = floor(amount / 100)
    ///
    /// 会员不存在时在同一事务内创建（余额 = 本次积分，无注册赠点）。
    pub async fn accrue_points(
        &self,
        phone: &str,
        bill: &str,
        amount: Decimal,
        staff: &StaffContext,
    ) -> Result<AccrualReceipt, LedgerError> {
        if !is_valid_phone(phone) {
            return Err(LedgerError::Validation(format!(
                "Invalid phone number '{}'",
                phone
            )));
        }
        if !is_valid_bill(bill) {
            return Err(LedgerError::Validation(format!(
                "Invalid bill reference '{}'",
                bill
            )));
        }
        if amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Amount must be positive".to_string(),
            ));
        }

        let points = (amount / Decimal::ONE_HUNDRED)
            .floor()
            .to_i64()
            .ok_or_else(|| LedgerError::Validation("Amount out of range".to_string()))?;

        for attempt in 0..MAX_TXN_RETRIES {
            match self.try_accrue(phone, bill, amount, points, staff).await? {
                TxnOutcome::Done(receipt) => {
                    tracing::info!(
                        phone = %phone,
                        bill = %bill,
                        points = receipt.points_added,
                        balance = receipt.balance,
                        staff = %staff.staff_id,
                        "points accrued"
                    );
                    return Ok(receipt);
                }
                TxnOutcome::Retry => {
                    tracing::warn!(bill = %bill, attempt, "accrual transaction conflict, retrying");
                }
                TxnOutcome::Fail(e) => return Err(e),
            }
        }

        Err(LedgerError::Database(
            "Accrual transaction kept conflicting after retries".to_string(),
        ))
    }

    async fn try_accrue(
        &self,
        phone: &str,
        bill: &str,
        amount: Decimal,
        points: i64,
        staff: &StaffContext,
    ) -> Result<TxnOutcome<AccrualReceipt>, LedgerError> {
        let mut resp = self
            .db
            .query(ACCRUE_SQL)
            .bind(("bill", bill.to_string()))
            .bind(("phone", phone.to_string()))
            .bind(("amount", amount))
            .bind(("points", points))
            .bind(("staff_id", staff.staff_id.clone()))
            .bind(("staff_name", staff.staff_name.clone()))
            .bind(("branch_id", staff.branch_id.clone()))
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let messages = take_error_messages(&mut resp);
        if !messages.is_empty() {
            if messages.iter().any(|m| m.contains("already exists")) {
                return Ok(TxnOutcome::Fail(LedgerError::DuplicateBill(
                    bill.to_string(),
                )));
            }
            if is_retryable(&messages) {
                return Ok(TxnOutcome::Retry);
            }
            return Ok(TxnOutcome::Fail(LedgerError::Database(messages.join("; "))));
        }

        let last = resp.num_statements().saturating_sub(1);
        let receipt: Option<AccrualReceipt> = resp
            .take(last)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        receipt.map(TxnOutcome::Done).ok_or_else(|| {
            LedgerError::Database("Accrual transaction returned no receipt".to_string())
        })
    }

    /// 兑换奖品：六项前置条件全部满足才生效，否则零副作用
    pub async fn redeem_reward(
        &self,
        phone: &str,
        reward_id: &str,
        staff: &StaffContext,
    ) -> Result<RedemptionReceipt, LedgerError> {
        if !is_valid_phone(phone) {
            return Err(LedgerError::Validation(format!(
                "Invalid phone number '{}'",
                phone
            )));
        }
        // 接受 "reward:xxx" 或纯 key
        let reward_key = reward_id.strip_prefix("reward:").unwrap_or(reward_id);
        if reward_key.is_empty() {
            return Err(LedgerError::Validation("Reward id is required".to_string()));
        }

        for attempt in 0..MAX_TXN_RETRIES {
            match self.try_redeem(phone, reward_key, staff).await? {
                TxnOutcome::Done(receipt) => {
                    tracing::info!(
                        phone = %phone,
                        reward = %receipt.reward_name,
                        points_used = receipt.points_used,
                        balance = receipt.balance,
                        stock = receipt.stock,
                        staff = %staff.staff_id,
                        "reward redeemed"
                    );
                    return Ok(receipt);
                }
                TxnOutcome::Retry => {
                    tracing::warn!(
                        reward = %reward_key,
                        attempt,
                        "redemption transaction conflict, retrying"
                    );
                }
                TxnOutcome::Fail(e) => return Err(e),
            }
        }

        Err(LedgerError::Database(
            "Redemption transaction kept conflicting after retries".to_string(),
        ))
    }

    async fn try_redeem(
        &self,
        phone: &str,
        reward_key: &str,
        staff: &StaffContext,
    ) -> Result<TxnOutcome<RedemptionReceipt>, LedgerError> {
        let mut resp = self
            .db
            .query(REDEEM_SQL)
            .bind(("phone", phone.to_string()))
            .bind(("reward_id", reward_key.to_string()))
            .bind(("staff_id", staff.staff_id.clone()))
            .bind(("staff_name", staff.staff_name.clone()))
            .bind(("branch_id", staff.branch_id.clone()))
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let messages = take_error_messages(&mut resp);
        if !messages.is_empty() {
            if let Some(err) = classify_thrown(&messages, phone, reward_key) {
                return Ok(TxnOutcome::Fail(err));
            }
            if is_retryable(&messages) {
                return Ok(TxnOutcome::Retry);
            }
            return Ok(TxnOutcome::Fail(LedgerError::Database(messages.join("; "))));
        }

        let last = resp.num_statements().saturating_sub(1);
        let receipt: Option<RedemptionReceipt> = resp
            .take(last)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        receipt.map(TxnOutcome::Done).ok_or_else(|| {
            LedgerError::Database("Redemption transaction returned no receipt".to_string())
        })
    }

    /// 会员换号：记录搬到新手机号 key，历史流水随之改写
    ///
    /// 新手机号已被注册时拒绝，整个操作零副作用。
    pub async fn migrate_phone(
        &self,
        old_phone: &str,
        new_phone: &str,
    ) -> Result<Member, LedgerError> {
        if !is_valid_phone(old_phone) {
            return Err(LedgerError::Validation(format!(
                "Invalid phone number '{}'",
                old_phone
            )));
        }
        if !is_valid_phone(new_phone) {
            return Err(LedgerError::Validation(format!(
                "Invalid phone number '{}'",
                new_phone
            )));
        }
        if old_phone == new_phone {
            return Err(LedgerError::Validation(
                "New phone number must differ from the old one".to_string(),
            ));
        }

        for attempt in 0..MAX_TXN_RETRIES {
            match self.try_migrate(old_phone, new_phone).await? {
                TxnOutcome::Done(member) => {
                    tracing::info!(
                        old_phone = %old_phone,
                        new_phone = %new_phone,
                        points = member.points,
                        "member phone migrated"
                    );
                    return Ok(member);
                }
                TxnOutcome::Retry => {
                    tracing::warn!(
                        old_phone = %old_phone,
                        attempt,
                        "migration transaction conflict, retrying"
                    );
                }
                TxnOutcome::Fail(e) => return Err(e),
            }
        }

        Err(LedgerError::Database(
            "Migration transaction kept conflicting after retries".to_string(),
        ))
    }

    async fn try_migrate(
        &self,
        old_phone: &str,
        new_phone: &str,
    ) -> Result<TxnOutcome<Member>, LedgerError> {
        let mut resp = self
            .db
            .query(MIGRATE_PHONE_SQL)
            .bind(("old_phone", old_phone.to_string()))
            .bind(("new_phone", new_phone.to_string()))
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let messages = take_error_messages(&mut resp);
        if !messages.is_empty() {
            if messages.iter().any(|m| m.contains("member_not_found")) {
                return Ok(TxnOutcome::Fail(LedgerError::MemberNotFound(
                    old_phone.to_string(),
                )));
            }
            if messages.iter().any(|m| m.contains("phone_in_use")) {
                return Ok(TxnOutcome::Fail(LedgerError::PhoneInUse(
                    new_phone.to_string(),
                )));
            }
            if is_retryable(&messages) {
                return Ok(TxnOutcome::Retry);
            }
            return Ok(TxnOutcome::Fail(LedgerError::Database(messages.join("; "))));
        }

        let last = resp.num_statements().saturating_sub(1);
        let member: Option<Member> = resp
            .take(last)
            .map_err(|e| LedgerError::Database(e.to_string()))?;
        member.map(TxnOutcome::Done).ok_or_else(|| {
            LedgerError::Database("Migration transaction returned no member".to_string())
        })
    }

    /// 可兑换目录快照 (active && stock > 0)，按积分从低到高
    pub async fn list_redeemable_rewards(&self) -> Result<Vec<RedeemableReward>, LedgerError> {
        RewardRepository::new(self.db.clone())
            .find_redeemable()
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))
    }

    /// 查询会员余额（纯读）
    pub async fn get_member_balance(&self, phone: &str) -> Result<Option<Member>, LedgerError> {
        if !is_valid_phone(phone) {
            return Err(LedgerError::Validation(format!(
                "Invalid phone number '{}'",
                phone
            )));
        }
        MemberRepository::new(self.db.clone())
            .find_by_phone(phone)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))
    }
}

/// 取出所有语句级错误消息（事务取消时每条语句都会带错误）
fn take_error_messages(resp: &mut surrealdb::Response) -> Vec<String> {
    let mut errors: Vec<(usize, surrealdb::Error)> = resp.take_errors().into_iter().collect();
    errors.sort_by_key(|(idx, _)| *idx);
    errors.into_iter().map(|(_, e)| e.to_string()).collect()
}

/// 乐观事务冲突，可以重试
fn is_retryable(messages: &[String]) -> bool {
    messages
        .iter()
        .any(|m| m.contains("can be retried") || m.contains("write conflict"))
}

/// 把事务脚本 THROW 的标记映射为类型化错误
fn classify_thrown(messages: &[String], phone: &str, reward_key: &str) -> Option<LedgerError> {
    for msg in messages {
        if let Some(rest) = msg.split("insufficient_points:").nth(1) {
            let mut parts = rest.trim().split(':');
            let required = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
            let available = parts.next().and_then(|s| s.trim().parse().ok()).unwrap_or(0);
            return Some(LedgerError::InsufficientPoints {
                required,
                available,
            });
        }
        if msg.contains("reward_not_found") {
            return Some(LedgerError::RewardNotFound(reward_key.to_string()));
        }
        if msg.contains("reward_inactive") {
            return Some(LedgerError::RewardInactive);
        }
        if msg.contains("reward_out_of_stock") {
            return Some(LedgerError::RewardOutOfStock);
        }
        if msg.contains("invalid_reward_cost") {
            return Some(LedgerError::InvalidRewardCost);
        }
        if msg.contains("member_not_found") {
            return Some(LedgerError::MemberNotFound(phone.to_string()));
        }
    }
    None
}
