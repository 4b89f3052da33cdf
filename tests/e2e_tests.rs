//! End-to-end integration tests
//!
//! These tests exercise the full stack through the HTTP surface: a router
//! over a real engine and store, driven with in-process requests. They
//! cover:
//! - The user state round trip (save, load, zeroed defaults)
//! - The withdrawal lifecycle (request, approve, reject, error paths)
//! - Admin aggregates
//! - Durable persistence across a simulated restart

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use rewards_engine::core::{LedgerStore, RewardsEngine};
use rewards_engine::http;
use rewards_engine::notify::NoopNotifier;
use rewards_engine::{EngineConfig, UserLedger};

/// Build an API router over a volatile store
fn test_app() -> Router {
    app_over(Arc::new(LedgerStore::in_memory(false)))
}

fn app_over(store: Arc<LedgerStore>) -> Router {
    let engine = Arc::new(RewardsEngine::new(
        store,
        EngineConfig::default(),
        Arc::new(NoopNotifier),
    ));
    http::router(engine)
}

/// Drive one request through the router and decode the JSON response
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Store a funded ledger for `user_id` through the save endpoint
async fn fund_user(app: &Router, user_id: &str, points: u64, balance: &str) {
    let (status, body) = send(
        app,
        post_json(
            "/api/user/save",
            json!({
                "userId": user_id,
                "data": { "points": points, "balance": balance, "historyLog": [] }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

fn amount_of(value: &Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap()
}

#[tokio::test]
async fn test_unknown_user_defaults_to_zeroed_state() {
    let app = test_app();

    let (status, body) = send(&app, get("/api/user/stranger")).await;

    assert_eq!(status, StatusCode::OK);
    let ledger: UserLedger = serde_json::from_value(body).unwrap();
    assert_eq!(ledger, UserLedger::default());
}

#[tokio::test]
async fn test_user_save_load_round_trip() {
    let app = test_app();

    let stored = json!({
        "userId": "42",
        "data": {
            "points": 12,
            "balance": "0.60",
            "historyLog": [
                { "type": "earn", "detail": "+1 Point(s) from Ad", "timestamp": "2025-06-01T10:00:00Z" }
            ]
        }
    });
    let (status, body) = send(&app, post_json("/api/user/save", stored)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get("/api/user/42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 12);
    assert_eq!(amount_of(&body["balance"]), Decimal::new(60, 2));
    assert_eq!(body["historyLog"][0]["type"], "earn");
    assert_eq!(body["historyLog"][0]["detail"], "+1 Point(s) from Ad");
}

#[tokio::test]
async fn test_save_without_user_id_is_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/api/user/save",
            json!({ "userId": "", "data": { "points": 1, "balance": 0, "historyLog": [] } }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_withdrawal_request_below_minimum_is_rejected() {
    let app = test_app();
    fund_user(&app, "42", 4, "0.20").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/withdrawal/request",
            json!({ "userInfo": "@alice (ID: 42)", "amount": "0.20", "userId": "42" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    // Balance unchanged, nothing filed
    let (_, user) = send(&app, get("/api/user/42")).await;
    assert_eq!(amount_of(&user["balance"]), Decimal::new(20, 2));
    let (_, listed) = send(&app, get("/api/admin/withdrawals")).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_withdrawal_request_without_identity_is_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json("/api/withdrawal/request", json!({ "amount": "5.00" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_full_withdrawal_approval_journey() {
    let app = test_app();
    fund_user(&app, "42", 100, "5.00").await;

    // File the request
    let (status, body) = send(
        &app,
        post_json(
            "/api/withdrawal/request",
            json!({ "userInfo": "@alice (ID: 42)", "amount": "5.00", "userId": "42" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    // The amount is reserved and a withdraw event is logged
    let (_, user) = send(&app, get("/api/user/42")).await;
    assert_eq!(amount_of(&user["balance"]), Decimal::ZERO);
    assert_eq!(user["historyLog"][0]["type"], "withdraw");

    // The request is discoverable and pending
    let (_, listed) = send(&app, get("/api/admin/withdrawals")).await;
    assert_eq!(listed[0]["username"], "alice");
    assert_eq!(listed[0]["status"], "pending");
    let id = listed[0]["id"].as_i64().unwrap();

    // Approve it
    let (status, body) = send(
        &app,
        post_json(&format!("/api/admin/withdrawal/{}/approve", id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Withdrawal approved");

    // Aggregates reflect the payout
    let (_, stats) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(stats["totalUsers"], 1);
    assert_eq!(stats["pendingWithdrawals"], 0);
    assert_eq!(amount_of(&stats["totalPaid"]), Decimal::new(500, 2));

    // A second decision on the settled request is refused
    let (status, body) = send(
        &app,
        post_json(&format!("/api/admin/withdrawal/{}/reject", id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reject_refunds_the_reserved_balance() {
    let app = test_app();
    fund_user(&app, "42", 100, "5.00").await;

    send(
        &app,
        post_json(
            "/api/withdrawal/request",
            json!({ "userInfo": "@alice (ID: 42)", "amount": "5.00", "userId": "42" }),
        ),
    )
    .await;

    let (_, listed) = send(&app, get("/api/admin/withdrawals")).await;
    let id = listed[0]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        post_json(&format!("/api/admin/withdrawal/{}/reject", id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Withdrawal rejected");

    let (_, user) = send(&app, get("/api/user/42")).await;
    assert_eq!(amount_of(&user["balance"]), Decimal::new(500, 2));

    let (_, stats) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(amount_of(&stats["totalPaid"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_decision_on_unknown_request_is_not_found() {
    let app = test_app();

    let (status, body) = send(
        &app,
        post_json("/api/admin/withdrawal/99999/approve", json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_total_paid_sums_approvals_and_ignores_rejections() {
    let app = test_app();
    fund_user(&app, "1", 100, "5.00").await;
    fund_user(&app, "2", 200, "10.00").await;
    fund_user(&app, "3", 100, "5.00").await;

    for (user, amount) in [("1", "5.00"), ("2", "10.00"), ("3", "5.00")] {
        let (status, _) = send(
            &app,
            post_json(
                "/api/withdrawal/request",
                json!({ "userInfo": format!("@user{}", user), "amount": amount, "userId": user }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, listed) = send(&app, get("/api/admin/withdrawals")).await;
    let requests = listed.as_array().unwrap();
    assert_eq!(requests.len(), 3);

    // Newest first: user 3, user 2, user 1
    let reject_id = requests[0]["id"].as_i64().unwrap();
    let approve_ids = [
        requests[1]["id"].as_i64().unwrap(),
        requests[2]["id"].as_i64().unwrap(),
    ];

    send(
        &app,
        post_json(
            &format!("/api/admin/withdrawal/{}/reject", reject_id),
            json!({}),
        ),
    )
    .await;
    for id in approve_ids {
        send(
            &app,
            post_json(&format!("/api/admin/withdrawal/{}/approve", id), json!({})),
        )
        .await;
    }

    let (_, stats) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(amount_of(&stats["totalPaid"]), Decimal::new(1500, 2)); // 15.00
    assert_eq!(stats["pendingWithdrawals"], 0);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ledger.json");
    let io_timeout = EngineConfig::default().store_io_timeout;

    {
        let store = Arc::new(LedgerStore::open(&path, io_timeout, false).await);
        let app = app_over(store);

        fund_user(&app, "42", 100, "5.00").await;
        send(
            &app,
            post_json(
                "/api/withdrawal/request",
                json!({ "userInfo": "@alice (ID: 42)", "amount": "5.00", "userId": "42" }),
            ),
        )
        .await;
    }

    // Reopen from the same file, as after a process restart
    let store = Arc::new(LedgerStore::open(&path, io_timeout, false).await);
    let app = app_over(store);

    let (_, user) = send(&app, get("/api/user/42")).await;
    assert_eq!(user["points"], 100);
    assert_eq!(amount_of(&user["balance"]), Decimal::ZERO);

    let (_, listed) = send(&app, get("/api/admin/withdrawals")).await;
    assert_eq!(listed[0]["status"], "pending");
    assert_eq!(listed[0]["username"], "alice");

    let (_, stats) = send(&app, get("/api/admin/stats")).await;
    assert_eq!(stats["pendingWithdrawals"], 1);
}
