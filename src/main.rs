use std::error::Error;

use ai_llm_service::telemetry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file; a missing file is fine.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::registry()
        .with(telemetry::env_filter(telemetry::DEFAULT_FILTER))
        .with(telemetry::layer())
        .init();

    api::start().await?;

    Ok(())
}
