use crate::config::{EngineConfig, NotifyConfig};
use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Serve the rewards-accrual and withdrawal-settlement API
#[derive(Parser, Debug)]
#[command(name = "rewards-engine")]
#[command(about = "Rewards accrual and withdrawal settlement service", long_about = None)]
pub struct CliArgs {
    /// Address the HTTP API binds to
    #[arg(
        long = "listen",
        value_name = "ADDR",
        default_value = "127.0.0.1:3000",
        help = "Socket address to serve the API on"
    )]
    pub listen: String,

    /// Path of the persisted ledger document
    #[arg(
        long = "data-file",
        value_name = "PATH",
        default_value = "ledger.json",
        help = "Path to the JSON ledger document"
    )]
    pub data_file: PathBuf,

    /// Minimum balance required to file a withdrawal
    #[arg(
        long = "min-withdrawal",
        value_name = "AMOUNT",
        help = "Minimum withdrawal amount (default: 0.30)"
    )]
    pub min_withdrawal: Option<Decimal>,

    /// Currency credited per reward unit
    #[arg(
        long = "rate-per-point",
        value_name = "RATE",
        help = "Currency credited per reward point (default: 0.05)"
    )]
    pub rate_per_point: Option<Decimal>,

    /// Seed the demonstration pending withdrawal on first start
    #[arg(long = "seed-demo", help = "Seed a demo pending withdrawal (dev only)")]
    pub seed_demo: bool,

    /// Bot token for admin chat notifications
    #[arg(
        long = "bot-token",
        value_name = "TOKEN",
        env = "REWARDS_BOT_TOKEN",
        hide_env_values = true,
        help = "Chat bot token; notifications are disabled without it"
    )]
    pub bot_token: Option<String>,

    /// Chat id of the administrator receiving notifications
    #[arg(
        long = "admin-chat",
        value_name = "CHAT_ID",
        env = "REWARDS_ADMIN_CHAT",
        help = "Admin chat id; notifications are disabled without it"
    )]
    pub admin_chat: Option<String>,
}

impl CliArgs {
    /// Create an EngineConfig from CLI arguments
    ///
    /// Unspecified values fall back to the defaults in [`EngineConfig`].
    pub fn to_engine_config(&self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            rate_per_point: self.rate_per_point.unwrap_or(default.rate_per_point),
            min_withdrawal: self.min_withdrawal.unwrap_or(default.min_withdrawal),
            store_io_timeout: default.store_io_timeout,
        }
    }

    /// Create a NotifyConfig when both credentials were supplied
    ///
    /// Notifications stay disabled unless the bot token and admin chat id
    /// are both present.
    pub fn to_notify_config(&self) -> Option<NotifyConfig> {
        match (&self.bot_token, &self.admin_chat) {
            (Some(token), Some(chat)) => Some(NotifyConfig::new(token.clone(), chat.clone())),
            _ => None,
        }
    }
}
