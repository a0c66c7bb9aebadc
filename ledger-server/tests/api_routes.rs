//! HTTP 路由层测试
//!
//! 用 tower 的 oneshot 驱动完整的中间件栈（认证、权限、公共路由跳过）。

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use ledger_server::core::{Config, ServerState, build_app_with_state};
use ledger_server::db::models::StaffCreate;
use ledger_server::db::repository::StaffRepository;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    app: Router,
    state: ServerState,
}

async fn setup() -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    config.welcome_points = 5;

    let state = ServerState::initialize(&config)
        .await
        .expect("Failed to initialize state");

    TestApp {
        _dir: dir,
        app: build_app_with_state(state.clone()),
        state,
    }
}

async fn create_staff(state: &ServerState, username: &str, password: &str, role: &str) {
    StaffRepository::new(state.db.clone())
        .create(StaffCreate {
            username: username.to_string(),
            password: password.to_string(),
            name: format!("{} (test)", username),
            branch_id: "BR01".to_string(),
            role: Some(role.to_string()),
        })
        .await
        .expect("Failed to create staff");
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be JSON")
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": username, "password": password}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["token"].as_str().expect("login token").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let env = setup().await;

    let response = env.app.clone().oneshot(get_request("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let env = setup().await;

    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members", Some("not-a-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let env = setup().await;
    create_staff(&env.state, "pim", "secret-password", "staff").await;

    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "pim", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "nobody", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn signup_and_public_balance_lookup() {
    let env = setup().await;

    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/signup",
            None,
            json!({"phone": "0812345678", "name": "Mali"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["points"], 5, "signup grants welcome points");

    // 重复注册 → 409
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/signup",
            None,
            json!({"phone": "0812345678", "name": "Mali"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 公共余额查询不需要令牌
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members/0812345678", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["points"], 5);
    assert_eq!(body["name"], "Mali");

    // 未注册手机号 → 404
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members/0800000000", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // 非法手机号不算公共路由 → 401
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members/garbage", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn accrue_and_redeem_through_http() {
    let env = setup().await;
    create_staff(&env.state, "counter", "counter-pass", "staff").await;
    create_staff(&env.state, "boss", "boss-pass", "admin").await;
    let staff_token = login(&env.app, "counter", "counter-pass").await;
    let admin_token = login(&env.app, "boss", "boss-pass").await;

    // 柜台录入积分
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/points/accrue",
            Some(&staff_token),
            json!({"phone": "0812345678", "bill": "BILL001", "amount": "550"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["points_added"], 5);
    assert_eq!(body["balance"], 5);

    // 重复小票 → 409
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/points/accrue",
            Some(&staff_token),
            json!({"phone": "0812345678", "bill": "BILL001", "amount": "550"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // 管理员建奖品
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rewards",
            Some(&admin_token),
            json!({"name": "Free Coffee", "point_cost": 5, "stock": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reward = body_json(response).await;
    let reward_id = reward["id"].as_str().expect("reward id").to_string();

    // 公共目录包含它
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/rewards/redeemable", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let catalog = body_json(response).await;
    assert_eq!(catalog.as_array().unwrap().len(), 1);

    // 柜台执行兑换
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/rewards/{}/redeem", reward_id),
            Some(&staff_token),
            json!({"phone": "0812345678"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["reward_name"], "Free Coffee");
    assert_eq!(receipt["balance"], 0);
    assert_eq!(receipt["stock"], 2);

    // 积分不足 → 422
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/rewards/{}/redeem", reward_id),
            Some(&staff_token),
            json!({"phone": "0812345678"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // 公共查询最近一次兑换
    let response = env
        .app
        .clone()
        .oneshot(get_request(
            "/api/members/0812345678/redemptions/latest",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let latest = body_json(response).await;
    assert_eq!(latest["reward_name"], "Free Coffee");
}

#[tokio::test]
async fn signup_bonus_then_accrual_accumulate() {
    let env = setup().await;
    create_staff(&env.state, "counter", "counter-pass", "staff").await;
    create_staff(&env.state, "boss", "boss-pass", "admin").await;
    let staff_token = login(&env.app, "counter", "counter-pass").await;
    let admin_token = login(&env.app, "boss", "boss-pass").await;

    // 注册 → 赠 5 分
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/signup",
            None,
            json!({"phone": "0812345678", "name": "Mali"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["points"], 5);

    // 消费 250 → floor(250/100) = 2，余额 = 5 + 2
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/points/accrue",
            Some(&staff_token),
            json!({"phone": "0812345678", "bill": "BILL001", "amount": "250"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = body_json(response).await;
    assert_eq!(receipt["points_added"], 2);
    assert_eq!(receipt["balance"], 7);

    // 兑换 5 分奖品 → 余额 2
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rewards",
            Some(&admin_token),
            json!({"name": "Free Coffee", "point_cost": 5, "stock": 1}),
        ))
        .await
        .unwrap();
    let reward_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/api/rewards/{}/redeem", reward_id),
            Some(&staff_token),
            json!({"phone": "0812345678"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["balance"], 2);
}

#[tokio::test]
async fn phone_migration_endpoint() {
    let env = setup().await;
    create_staff(&env.state, "counter", "counter-pass", "staff").await;
    create_staff(&env.state, "boss", "boss-pass", "admin").await;
    let staff_token = login(&env.app, "counter", "counter-pass").await;
    let admin_token = login(&env.app, "boss", "boss-pass").await;

    env.app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/signup",
            None,
            json!({"phone": "0812345678", "name": "Mali"}),
        ))
        .await
        .unwrap();

    // 普通员工没有 members:manage → 403
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/0812345678/migrate",
            Some(&staff_token),
            json!({"new_phone": "0899999999"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 管理员可以换号
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/members/0812345678/migrate",
            Some(&admin_token),
            json!({"new_phone": "0899999999"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let member = body_json(response).await;
    assert_eq!(member["phone"], "0899999999");
    assert_eq!(member["points"], 5);

    // 旧号码查询 → 404，新号码 → 200
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members/0812345678", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/members/0899999999", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn requests_time_out_per_config() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    // 登录有 500ms 固定延迟，50ms 的预算必然超时
    config.request_timeout_ms = 50;

    let state = ServerState::initialize(&config)
        .await
        .expect("Failed to initialize state");
    create_staff(&state, "pim", "secret-password", "staff").await;
    let app = build_app_with_state(state);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": "pim", "password": "secret-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn permissions_are_enforced() {
    let env = setup().await;
    create_staff(&env.state, "counter", "counter-pass", "staff").await;
    create_staff(&env.state, "boss", "boss-pass", "admin").await;
    let staff_token = login(&env.app, "counter", "counter-pass").await;
    let admin_token = login(&env.app, "boss", "boss-pass").await;

    // 普通员工不能建奖品 (rewards:manage)
    let response = env
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/rewards",
            Some(&staff_token),
            json!({"name": "Nope", "point_cost": 1, "stock": 1}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 普通员工不能管理员工账号
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/staff", Some(&staff_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // 管理员可以
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/staff", Some(&admin_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // /api/auth/me 返回令牌身份
    let response = env
        .app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&staff_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["username"], "counter");
    assert_eq!(me["role"], "staff");
}
