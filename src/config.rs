//! Runtime configuration for the rewards engine
//!
//! Conversion rate, withdrawal minimum, and I/O timeouts are configuration,
//! not literals: deployed variants of the product have shipped with
//! different values. Notification credentials are injected from the
//! environment and never embedded in the binary.

use std::time::Duration;

use rust_decimal::Decimal;

/// Default currency credited per reward unit (0.05)
pub fn default_rate_per_point() -> Decimal {
    Decimal::new(5, 2)
}

/// Default minimum balance required to file a withdrawal (0.30)
pub fn default_min_withdrawal() -> Decimal {
    Decimal::new(30, 2)
}

/// Core engine tunables
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Currency credited per reward unit
    pub rate_per_point: Decimal,

    /// Minimum amount a withdrawal request must reach
    pub min_withdrawal: Decimal,

    /// Upper bound on a single persistence read or write
    pub store_io_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            rate_per_point: default_rate_per_point(),
            min_withdrawal: default_min_withdrawal(),
            store_io_timeout: Duration::from_secs(5),
        }
    }
}

/// Admin chat notification settings
///
/// Present only when both the bot token and the admin chat id were supplied;
/// without them the engine runs with notifications disabled.
#[derive(Debug, Clone, PartialEq)]
pub struct NotifyConfig {
    /// Bot token used to authenticate against the chat API
    pub bot_token: String,

    /// Chat id of the administrator receiving withdrawal notices
    pub admin_chat_id: String,

    /// Base URL of the chat API
    pub api_base: String,

    /// Upper bound on a single notification delivery attempt
    pub timeout: Duration,
}

impl NotifyConfig {
    /// Build a config for the public chat API with the default timeout
    pub fn new(bot_token: String, admin_chat_id: String) -> Self {
        NotifyConfig {
            bot_token,
            admin_chat_id,
            api_base: "https://api.telegram.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}
