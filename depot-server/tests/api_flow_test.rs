//! 端到端 API 测试
//!
//! 在内存数据库上组装完整路由，覆盖 登录 → 入库 → 下单 →
//! 退还 → 审计查询 的闭环，以及认证/角色门禁。

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use depot_server::core::{Config, Server, ServerState};
use depot_server::db::DbService;
use depot_server::db::models::{UserCreate, UserRole};
use depot_server::db::repository::UserRepository;

async fn test_state() -> ServerState {
    let db = DbService::memory().await.expect("in-memory db").db;
    let state = ServerState::with_db(Config::from_env(), db);

    let users = UserRepository::new(state.db.clone());
    users
        .create(UserCreate {
            username: "root".to_string(),
            password: "super-secret-pass".to_string(),
            role: UserRole::Superadmin,
        })
        .await
        .expect("seed superadmin");
    users
        .create(UserCreate {
            username: "worker".to_string(),
            password: "worker-pass".to_string(),
            role: UserRole::Employee,
        })
        .await
        .expect("seed employee");

    state
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_health_is_public() {
    let state = test_state().await;
    let app = Server::build_router(state);

    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_api_requires_auth() {
    let state = test_state().await;
    let app = Server::build_router(state);

    let (status, _) = send(&app, get_request("/api/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_hardware_mutation_requires_superadmin() {
    let state = test_state().await;
    let app = Server::build_router(state);

    let token = login(&app, "worker", "worker-pass").await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/hardware",
            Some(&token),
            json!({
                "hardwareOldNumber": "H1",
                "hardwarePO": "PO-1",
                "hardwareGroupName": "Brackets",
                "quantity": 10,
                "hardwareDescription": "bracket assembly"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_order_lifecycle_round_trip() {
    let state = test_state().await;
    let app = Server::build_router(state);

    let root = login(&app, "root", "super-secret-pass").await;
    let worker = login(&app, "worker", "worker-pass").await;

    // 入库
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/hardware",
            Some(&root),
            json!({
                "hardwareOldNumber": "H1",
                "hardwarePO": "PO-1",
                "hardwareGroupName": "Brackets",
                "quantity": 10,
                "hardwareDescription": "bracket assembly"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // 员工下单
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/orders",
            Some(&worker),
            json!({
                "empId": "E1",
                "empName": "Pat Worker",
                "structurePO": "P1",
                "structureName": "North Tower",
                "orders": [{"hardwareOldNumber": "H1", "quantity": 4}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "order failed: {}", body);
    assert_eq!(body["newOrder"]["orders"][0]["status"], "Pending");
    assert_eq!(body["newOrder"]["orders"][0]["quantity"], 4);

    // 库存已扣减
    let (_, hardware) = send(&app, get_request("/api/hardware", Some(&worker))).await;
    assert_eq!(hardware[0]["quantity"], 6);

    // 结构分配已记账
    let (_, structure) = send(&app, get_request("/api/structures/P1", Some(&worker))).await;
    assert_eq!(structure["hardwareAllocation"][0]["quantity"], 4);

    // 超量下单被拒
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/orders",
            Some(&worker),
            json!({
                "empId": "E1",
                "empName": "Pat Worker",
                "structurePO": "P1",
                "structureName": "North Tower",
                "orders": [{"hardwareOldNumber": "H1", "quantity": 99}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("Insufficient stock"));

    // 全量退还
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/orders/return",
            Some(&worker),
            json!({
                "returnerEmpId": "E1",
                "returnerName": "Pat Worker",
                "structurePO": "P1",
                "structureName": "North Tower",
                "returning": [{"hardwareOldNumber": "H1", "returnedQuantity": 4}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "return failed: {}", body);
    assert_eq!(body["results"]["success"][0]["returnedQuantity"], 4);
    assert_eq!(body["results"]["success"][0]["remainingStock"], 10);
    assert!(body["results"]["errors"].as_array().unwrap().is_empty());

    // 库存复原
    let (_, hardware) = send(&app, get_request("/api/hardware", Some(&worker))).await;
    assert_eq!(hardware[0]["quantity"], 10);

    // 员工订单查询：行项已 Returned
    let (_, orders) = send(&app, get_request("/api/orders/E1", Some(&worker))).await;
    assert_eq!(orders[0]["orders"][0]["status"], "Returned");

    // 审计日志 (admin 可见，异步写入，稍等落盘)
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let (status, audit) = send(&app, get_request("/api/audit-log", Some(&root))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(audit["total"].as_u64().unwrap() >= 3);

    // 员工无权查看审计日志
    let (status, _) = send(&app, get_request("/api/audit-log", Some(&worker))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
