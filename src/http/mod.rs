//! HTTP surface exposed to the presentation layer
//!
//! JSON endpoints consumed by the mini-app client and the admin view. Wire
//! field names follow the client (`historyLog`, `userInfo`, `totalPaid`).

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::RewardsEngine;
use crate::types::{RewardsError, SettlementDecision, UserId, UserLedger};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<RewardsEngine>,
}

/// Build the API router over an engine
pub fn router(engine: Arc<RewardsEngine>) -> Router {
    Router::new()
        .route("/api/user/:user_id", get(get_user))
        .route("/api/user/save", post(save_user))
        .route("/api/withdrawal/request", post(request_withdrawal))
        .route("/api/admin/stats", get(admin_stats))
        .route("/api/admin/withdrawals", get(admin_withdrawals))
        .route("/api/admin/withdrawal/:id/approve", post(approve_withdrawal))
        .route("/api/admin/withdrawal/:id/reject", post(reject_withdrawal))
        .with_state(AppState { engine })
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl StatusResponse {
    fn ok(message: &str) -> Json<Self> {
        Json(StatusResponse {
            success: true,
            message: Some(message.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveUserBody {
    user_id: String,
    data: UserLedger,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawalRequestBody {
    #[serde(default)]
    user_info: Option<String>,
    #[serde(default)]
    amount: Option<Decimal>,
    #[serde(default)]
    user_id: Option<String>,
}

impl IntoResponse for RewardsError {
    fn into_response(self) -> Response {
        let status = match &self {
            RewardsError::RequestNotFound { .. } => StatusCode::NOT_FOUND,
            RewardsError::InvalidTransition { .. } => StatusCode::CONFLICT,
            RewardsError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            err if err.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(StatusResponse {
            success: false,
            message: Some(self.to_string()),
        });
        (status, body).into_response()
    }
}

async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<UserLedger> {
    Json(state.engine.user_snapshot(&UserId(user_id)))
}

async fn save_user(
    State(state): State<AppState>,
    Json(body): Json<SaveUserBody>,
) -> Result<Json<StatusResponse>, RewardsError> {
    let user = UserId(body.user_id);
    if user.is_empty() {
        return Err(RewardsError::malformed_identity("missing user id"));
    }
    state.engine.save_user(&user, body.data).await;
    Ok(Json(StatusResponse {
        success: true,
        message: None,
    }))
}

async fn request_withdrawal(
    State(state): State<AppState>,
    Json(body): Json<WithdrawalRequestBody>,
) -> Result<Json<StatusResponse>, RewardsError> {
    let user = UserId(body.user_id.unwrap_or_default());
    // A missing or unparsable amount fails the minimum check downstream
    let amount = body.amount.unwrap_or(Decimal::ZERO);

    state
        .engine
        .request_withdrawal(&user, body.user_info.as_deref(), amount)
        .await?;

    Ok(StatusResponse::ok("Withdrawal request added successfully"))
}

async fn admin_stats(State(state): State<AppState>) -> Result<Response, RewardsError> {
    let stats = state.engine.admin_stats()?;
    Ok(Json(stats).into_response())
}

async fn admin_withdrawals(State(state): State<AppState>) -> Result<Response, RewardsError> {
    let withdrawals = state.engine.withdrawals()?;
    Ok(Json(withdrawals).into_response())
}

async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, RewardsError> {
    state.engine.settle(id, SettlementDecision::Approve).await?;
    Ok(StatusResponse::ok("Withdrawal approved"))
}

async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StatusResponse>, RewardsError> {
    state.engine.settle(id, SettlementDecision::Reject).await?;
    Ok(StatusResponse::ok("Withdrawal rejected"))
}
