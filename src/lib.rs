use anyhow::Result;
use dotenvy::dotenv;

pub mod config;
pub mod console;
pub mod logger;
pub mod rpc;
pub mod session;
pub mod utils;

/// Run the application: load `.env`, load config, and start the console.
pub async fn run() -> Result<()> {
    // Load environment variables from .env (PYCONSOLE_URL override)
    dotenv().ok();

    let config = config::AppConfig::load();
    console::start(&config).await
}

// Re-exports for library consumers: common useful types
pub use config::AppConfig;
pub use rpc::{OutputBatch, RpcClient};
pub use session::{statement_complete, ConsoleState, DetectorState, History, Submission};
