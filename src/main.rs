//! Rewards Engine Service
//!
//! Serves the rewards-accrual and withdrawal-settlement API over HTTP.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --listen 127.0.0.1:3000 --data-file ledger.json
//! REWARDS_BOT_TOKEN=... REWARDS_ADMIN_CHAT=... cargo run
//! cargo run -- --seed-demo
//! ```
//!
//! The service loads the ledger document from the data file (degrading to
//! in-memory storage when the file backend is unusable), then serves the
//! JSON API until terminated. Admin chat notifications are enabled only
//! when both credentials are injected via flags or environment.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (address in use, bind failure, etc.)

use std::process;
use std::sync::Arc;

use tracing::info;

use rewards_engine::cli;
use rewards_engine::core::{LedgerStore, RewardsEngine};
use rewards_engine::http;
use rewards_engine::notify::{NoopNotifier, Notifier, TelegramNotifier};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    // Parse command-line arguments using clap
    let args = cli::parse_args();
    let config = args.to_engine_config();

    let store = Arc::new(
        LedgerStore::open(&args.data_file, config.store_io_timeout, args.seed_demo).await,
    );

    let notifier: Arc<dyn Notifier> = match args.to_notify_config() {
        Some(notify_config) => match TelegramNotifier::new(notify_config) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => {
            info!("no chat credentials configured, admin notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    let engine = Arc::new(RewardsEngine::new(store, config, notifier));
    let app = http::router(engine);

    let listener = match tokio::net::TcpListener::bind(&args.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    info!("rewards-engine listening on {}", args.listen);
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
