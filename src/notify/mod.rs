//! Admin chat notifications
//!
//! Withdrawal lifecycle changes are pushed to a fixed administrator chat
//! through the chat platform's bot API. Delivery is fire-and-forget: the
//! state transition that triggered a notice never waits on it and never
//! rolls back when it fails. Credentials come from configuration; the
//! engine runs with the no-op notifier when none are provided.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::config::NotifyConfig;
use crate::types::{RewardsError, WithdrawalRequest, WithdrawalStatus};

/// Sink for admin-facing notices
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message to the administrator
    async fn notify(&self, text: &str) -> Result<(), RewardsError>;
}

/// Notifier used when no chat credentials are configured
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _text: &str) -> Result<(), RewardsError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram bot notifier
///
/// Posts `sendMessage` calls to the configured admin chat. The underlying
/// client carries the configured timeout so a slow chat API cannot hang
/// callers that do choose to await delivery.
pub struct TelegramNotifier {
    http: Client,
    api_base: String,
    bot_token: String,
    admin_chat_id: String,
}

impl TelegramNotifier {
    /// Build a notifier from injected credentials
    pub fn new(config: NotifyConfig) -> Result<Self, RewardsError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(TelegramNotifier {
            http,
            api_base: config.api_base,
            bot_token: config.bot_token,
            admin_chat_id: config.admin_chat_id,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) -> Result<(), RewardsError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let response = self
            .http
            .post(&url)
            .json(&SendMessageBody {
                chat_id: &self.admin_chat_id,
                text,
                parse_mode: "Markdown",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RewardsError::notification_failure(&format!(
                "chat API returned {}",
                response.status()
            )));
        }

        // The chat API reports application-level failures in the body
        let body: Value = response.json().await?;
        if body.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(RewardsError::notification_failure(
                "chat API reported not ok",
            ));
        }

        Ok(())
    }
}

/// Notice sent when a user files a withdrawal request
pub fn withdrawal_requested(request: &WithdrawalRequest) -> String {
    format!(
        "\u{1F4B8} *Withdrawal Request*\n\n\u{1F464} *User:* @{} (ID: {})\n\u{1F4B0} *Amount:* ${}\n\n_Please process this request._",
        request.username,
        request.user_id,
        request.amount.round_dp(2)
    )
}

/// Notice sent when an admin decision settles a request
pub fn withdrawal_settled(request: &WithdrawalRequest) -> String {
    let headline = match request.status {
        WithdrawalStatus::Approved => "\u{2705} *Withdrawal Approved*",
        WithdrawalStatus::Rejected => "\u{274C} *Withdrawal Rejected*",
        WithdrawalStatus::Pending => "\u{23F3} *Withdrawal Pending*",
    };
    format!(
        "{}\n\n\u{1F464} *User:* @{} (ID: {})\n\u{1F4B0} *Amount:* ${}",
        headline,
        request.username,
        request.user_id,
        request.amount.round_dp(2)
    )
}
