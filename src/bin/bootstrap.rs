// Lambda bootstrap entry point for the webhook function

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use moviebot::api::{BotServices, handler};
use moviebot::core::config::AppConfig;
use serde_json::Value;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    moviebot::setup_logging();

    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    info!(?config, "Configuration loaded");

    // Clients live for the lifetime of the execution environment.
    let services = Arc::new(BotServices::from_config(config).await);

    run(service_fn(move |event: LambdaEvent<Value>| {
        let services = Arc::clone(&services);
        async move { handler(&services, event).await }
    }))
    .await
}
