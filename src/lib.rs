//! Movie poster bot - a Telegram webhook that answers a movie title with the
//! movie's poster and description.
//!
//! The webhook runs as a single AWS Lambda behind API Gateway or a Function URL:
//! 1. The update's text is searched on TMDB
//! 2. The first match is answered with its poster (or a text reply)
//! 3. Posters are cached in S3 so repeat queries are served from a presigned URL
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda for serverless execution
//! - S3 for the poster cache
//! - reqwest for the TMDB and Telegram Bot APIs
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use moviebot::api::BotServices;
//! use moviebot::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     moviebot::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let services = BotServices::from_config(config).await;
//!
//!     let event = serde_json::json!({
//!         "body": r#"{"message":{"chat":{"id":42},"text":"Heat"}}"#
//!     });
//!     let response = moviebot::api::handler::handle_payload(&services, &event).await;
//!     println!("{response}");
//!     Ok(())
//! }
//! ```
pub mod api;
pub mod core;
pub mod errors;
pub mod reply;
pub mod storage;
pub mod telegram;
pub mod tmdb;

pub use errors::BotError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`). It
/// should be called once at cold start; later calls are no-ops.
///
/// # Example
///
/// ```
/// moviebot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
