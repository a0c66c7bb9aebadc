//! 积分台账核心流程测试
//!
//! 直接针对嵌入式数据库验证录入/兑换的事务语义。

use ledger_server::db::DbService;
use ledger_server::db::models::RewardCreate;
use ledger_server::db::repository::{
    AccrualLogRepository, MemberRepository, RedemptionLogRepository, RewardRepository,
};
use ledger_server::ledger::{LedgerError, LedgerService, StaffContext};
use rust_decimal::Decimal;
use tempfile::TempDir;

const PHONE: &str = "0812345678";

struct TestEnv {
    _dir: TempDir,
    db: surrealdb::Surreal<surrealdb::engine::local::Db>,
    ledger: LedgerService,
}

async fn setup() -> TestEnv {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("ledger.db");
    let db_service = DbService::new(path.to_str().unwrap())
        .await
        .expect("Failed to open test database");
    let db = db_service.db.clone();
    TestEnv {
        _dir: dir,
        ledger: LedgerService::new(db.clone()),
        db,
    }
}

fn staff() -> StaffContext {
    StaffContext {
        staff_id: "staff:test".to_string(),
        staff_name: "Test Staff".to_string(),
        branch_id: "BR01".to_string(),
    }
}

async fn create_reward(env: &TestEnv, name: &str, cost: i64, stock: i64, active: bool) -> String {
    let reward = RewardRepository::new(env.db.clone())
        .create(RewardCreate {
            name: name.to_string(),
            point_cost: cost,
            stock,
            is_active: Some(active),
            start_date: None,
            end_date: None,
        })
        .await
        .expect("Failed to create reward");
    reward.id.expect("reward id").key().to_string()
}

#[tokio::test]
async fn accrue_creates_member_and_floors_points() {
    let env = setup().await;

    let receipt = env
        .ledger
        .accrue_points(PHONE, "BILL001", Decimal::new(25999, 2), &staff())
        .await
        .expect("accrual should succeed");

    // floor(259.99 / 100) = 2
    assert_eq!(receipt.points_added, 2);
    assert_eq!(receipt.balance, 2);

    let member = MemberRepository::new(env.db.clone())
        .find_by_phone(PHONE)
        .await
        .unwrap()
        .expect("member should have been created");
    assert_eq!(member.points, 2);

    let log = AccrualLogRepository::new(env.db.clone())
        .find_by_bill("BILL001")
        .await
        .unwrap()
        .expect("accrual log should exist");
    assert_eq!(log.phone, PHONE);
    assert_eq!(log.points_added, 2);
    assert!(!log.is_deleted);
}

#[tokio::test]
async fn accrue_increments_existing_member() {
    let env = setup().await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(300), &staff())
        .await
        .unwrap();
    let receipt = env
        .ledger
        .accrue_points(PHONE, "BILL002", Decimal::from(150), &staff())
        .await
        .unwrap();

    assert_eq!(receipt.points_added, 1);
    assert_eq!(receipt.balance, 4);
}

#[tokio::test]
async fn duplicate_bill_is_rejected_without_side_effects() {
    let env = setup().await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(500), &staff())
        .await
        .unwrap();

    // 同一小票、甚至不同会员，都必须拒绝
    let err = env
        .ledger
        .accrue_points("0899999999", "BILL001", Decimal::from(500), &staff())
        .await
        .expect_err("duplicate bill must fail");
    assert!(matches!(err, LedgerError::DuplicateBill(_)));

    // 原会员余额不变，新会员没有被创建
    let repo = MemberRepository::new(env.db.clone());
    assert_eq!(repo.find_by_phone(PHONE).await.unwrap().unwrap().points, 5);
    assert!(repo.find_by_phone("0899999999").await.unwrap().is_none());
}

#[tokio::test]
async fn accrue_rejects_invalid_input() {
    let env = setup().await;

    let err = env
        .ledger
        .accrue_points("12345", "BILL001", Decimal::from(100), &staff())
        .await
        .expect_err("bad phone must fail");
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = env
        .ledger
        .accrue_points(PHONE, "ab", Decimal::from(100), &staff())
        .await
        .expect_err("bad bill must fail");
    assert!(matches!(err, LedgerError::Validation(_)));

    let err = env
        .ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(-5), &staff())
        .await
        .expect_err("negative amount must fail");
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn redeem_full_flow() {
    let env = setup().await;
    let reward_id = create_reward(&env, "Free Coffee", 5, 10, true).await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(700), &staff())
        .await
        .unwrap();

    let receipt = env
        .ledger
        .redeem_reward(PHONE, &reward_id, &staff())
        .await
        .expect("redemption should succeed");

    assert_eq!(receipt.reward_name, "Free Coffee");
    assert_eq!(receipt.points_used, 5);
    assert_eq!(receipt.balance, 2);
    assert_eq!(receipt.stock, 9);

    // 会员余额与最近兑换快照
    let member = MemberRepository::new(env.db.clone())
        .find_by_phone(PHONE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.points, 2);
    assert_eq!(member.last_reward.as_deref(), Some("Free Coffee"));
    assert!(member.last_redeemed_at.is_some());

    // 库存扣减
    let reward = RewardRepository::new(env.db.clone())
        .find_by_id(&reward_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reward.stock, 9);

    // 兑换流水快照
    let log = RedemptionLogRepository::new(env.db.clone())
        .find_latest_by_phone(PHONE)
        .await
        .unwrap()
        .expect("redemption log should exist");
    assert_eq!(log.reward_name, "Free Coffee");
    assert_eq!(log.points_used, 5);
    assert_eq!(log.staff_id, "staff:test");
}

#[tokio::test]
async fn redeem_with_exact_balance_succeeds() {
    let env = setup().await;
    let reward_id = create_reward(&env, "Exact", 5, 1, true).await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(500), &staff())
        .await
        .unwrap();

    let receipt = env
        .ledger
        .redeem_reward(PHONE, &reward_id, &staff())
        .await
        .expect("balance == cost must redeem");
    assert_eq!(receipt.balance, 0);
    assert_eq!(receipt.stock, 0);
}

#[tokio::test]
async fn redeem_insufficient_points_has_no_side_effects() {
    let env = setup().await;
    let reward_id = create_reward(&env, "Pricey", 5, 3, true).await;

    // 余额 = cost - 1
    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(400), &staff())
        .await
        .unwrap();

    let err = env
        .ledger
        .redeem_reward(PHONE, &reward_id, &staff())
        .await
        .expect_err("insufficient points must fail");
    match err {
        LedgerError::InsufficientPoints {
            required,
            available,
        } => {
            assert_eq!(required, 5);
            assert_eq!(available, 4);
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // 零副作用：余额、库存、流水都保持不变
    let member = MemberRepository::new(env.db.clone())
        .find_by_phone(PHONE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.points, 4);

    let reward = RewardRepository::new(env.db.clone())
        .find_by_id(&reward_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reward.stock, 3);

    assert!(
        RedemptionLogRepository::new(env.db.clone())
            .find_latest_by_phone(PHONE)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn redeem_precondition_failures() {
    let env = setup().await;
    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(10_000), &staff())
        .await
        .unwrap();

    // 不存在的奖品
    let err = env
        .ledger
        .redeem_reward(PHONE, "nope", &staff())
        .await
        .expect_err("missing reward must fail");
    assert!(matches!(err, LedgerError::RewardNotFound(_)));

    // 下架奖品
    let inactive = create_reward(&env, "Inactive", 5, 10, false).await;
    let err = env
        .ledger
        .redeem_reward(PHONE, &inactive, &staff())
        .await
        .expect_err("inactive reward must fail");
    assert!(matches!(err, LedgerError::RewardInactive));

    // 零库存（先建一件库存、兑掉它）
    let scarce = create_reward(&env, "Scarce", 1, 1, true).await;
    env.ledger
        .redeem_reward(PHONE, &scarce, &staff())
        .await
        .unwrap();
    let err = env
        .ledger
        .redeem_reward(PHONE, &scarce, &staff())
        .await
        .expect_err("zero stock must fail");
    assert!(matches!(err, LedgerError::RewardOutOfStock));

    // 不存在的会员
    let ok_reward = create_reward(&env, "Plain", 1, 10, true).await;
    let err = env
        .ledger
        .redeem_reward("0800000000", &ok_reward, &staff())
        .await
        .expect_err("unknown member must fail");
    assert!(matches!(err, LedgerError::MemberNotFound(_)));
}

#[tokio::test]
async fn concurrent_redeem_last_stock_single_winner() {
    let env = setup().await;
    let reward_id = create_reward(&env, "Last One", 5, 1, true).await;

    // 两个会员都有足够积分
    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(1000), &staff())
        .await
        .unwrap();
    env.ledger
        .accrue_points("0899999999", "BILL002", Decimal::from(1000), &staff())
        .await
        .unwrap();

    let staff_ctx = staff();
    let (a, b) = tokio::join!(
        env.ledger.redeem_reward(PHONE, &reward_id, &staff_ctx),
        env.ledger.redeem_reward("0899999999", &reward_id, &staff_ctx),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|&&ok| ok).count();
    assert_eq!(successes, 1, "exactly one redemption must win: {:?} {:?}", a, b);

    for result in [a, b] {
        if let Err(e) = result {
            assert!(matches!(e, LedgerError::RewardOutOfStock), "loser must see out-of-stock: {:?}", e);
        }
    }

    let reward = RewardRepository::new(env.db.clone())
        .find_by_id(&reward_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reward.stock, 0);
}

#[tokio::test]
async fn concurrent_duplicate_bill_counted_once() {
    let env = setup().await;

    let staff_ctx = staff();
    let (a, b) = tokio::join!(
        env.ledger
            .accrue_points(PHONE, "BILL001", Decimal::from(500), &staff_ctx),
        env.ledger
            .accrue_points(PHONE, "BILL001", Decimal::from(500), &staff_ctx),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|&&ok| ok).count();
    assert_eq!(successes, 1, "same bill must be counted once: {:?} {:?}", a, b);

    let member = MemberRepository::new(env.db.clone())
        .find_by_phone(PHONE)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(member.points, 5);
}

#[tokio::test]
async fn migrate_phone_moves_member_and_logs() {
    let env = setup().await;
    let reward_id = create_reward(&env, "Mug", 2, 5, true).await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(300), &staff())
        .await
        .unwrap();
    env.ledger
        .accrue_points(PHONE, "BILL002", Decimal::from(200), &staff())
        .await
        .unwrap();
    env.ledger
        .redeem_reward(PHONE, &reward_id, &staff())
        .await
        .unwrap();

    let new_phone = "0899999999";
    let member = env
        .ledger
        .migrate_phone(PHONE, new_phone)
        .await
        .expect("migration should succeed");

    // 余额与最近兑换随记录搬迁
    assert_eq!(member.phone, new_phone);
    assert_eq!(member.points, 3);
    assert_eq!(member.last_reward.as_deref(), Some("Mug"));

    // 旧记录消失
    let members = MemberRepository::new(env.db.clone());
    assert!(members.find_by_phone(PHONE).await.unwrap().is_none());
    assert_eq!(
        members.find_by_phone(new_phone).await.unwrap().unwrap().points,
        3
    );

    // 两张流水表整体改写到新手机号
    let accruals = AccrualLogRepository::new(env.db.clone());
    assert_eq!(accruals.find_by_phone(new_phone).await.unwrap().len(), 2);
    assert!(accruals.find_by_phone(PHONE).await.unwrap().is_empty());

    let redemptions = RedemptionLogRepository::new(env.db.clone());
    assert_eq!(redemptions.find_by_phone(new_phone).await.unwrap().len(), 1);
    assert!(redemptions.find_by_phone(PHONE).await.unwrap().is_empty());

    // 小票编号唯一性跟着新手机号继续生效
    let err = env
        .ledger
        .accrue_points(new_phone, "BILL001", Decimal::from(300), &staff())
        .await
        .expect_err("migrated bill must stay unique");
    assert!(matches!(err, LedgerError::DuplicateBill(_)));
}

#[tokio::test]
async fn migrate_phone_rejects_taken_or_unknown_numbers() {
    let env = setup().await;

    env.ledger
        .accrue_points(PHONE, "BILL001", Decimal::from(300), &staff())
        .await
        .unwrap();
    env.ledger
        .accrue_points("0899999999", "BILL002", Decimal::from(500), &staff())
        .await
        .unwrap();

    // 目标号码已被注册 → 零副作用
    let err = env
        .ledger
        .migrate_phone(PHONE, "0899999999")
        .await
        .expect_err("taken phone must fail");
    assert!(matches!(err, LedgerError::PhoneInUse(_)));

    let members = MemberRepository::new(env.db.clone());
    assert_eq!(members.find_by_phone(PHONE).await.unwrap().unwrap().points, 3);
    assert_eq!(
        members
            .find_by_phone("0899999999")
            .await
            .unwrap()
            .unwrap()
            .points,
        5
    );

    // 不存在的会员
    let err = env
        .ledger
        .migrate_phone("0800000000", "0811111111")
        .await
        .expect_err("unknown member must fail");
    assert!(matches!(err, LedgerError::MemberNotFound(_)));

    // 新旧号码相同
    let err = env
        .ledger
        .migrate_phone(PHONE, PHONE)
        .await
        .expect_err("same phone must fail");
    assert!(matches!(err, LedgerError::Validation(_)));
}

#[tokio::test]
async fn redeemable_catalog_filters_and_sorts() {
    let env = setup().await;

    create_reward(&env, "Cheap", 2, 5, true).await;
    create_reward(&env, "Mid", 5, 1, true).await;
    create_reward(&env, "Hidden", 1, 5, false).await;
    create_reward(&env, "Empty", 1, 0, true).await;

    let catalog = env.ledger.list_redeemable_rewards().await.unwrap();
    let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Cheap", "Mid"]);
}
