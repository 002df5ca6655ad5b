//! Webhook Lambda handler.
//!
//! This module handles:
//! - Optional webhook secret verification
//! - Decoding the Telegram update
//! - Movie lookup and reply delivery (delegated to `tmdb` and `reply`)
//! - Mapping the result onto a response according to the failure policy

use std::sync::Arc;

use lambda_runtime::{Error, LambdaEvent};
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::{error, info, warn};

use super::{helpers, parsing};
use crate::core::config::{AppConfig, FailurePolicy};
use crate::errors::BotError;
use crate::reply::{ReplyComposer, ReplyOutcome};
use crate::storage::{PosterStore, S3PosterStore};
use crate::telegram::{ChatSender, TelegramClient};
use crate::tmdb::{MovieCatalog, TmdbClient};

pub use self::function_handler as handler;

/// Long-lived clients, built once per Lambda cold start.
pub struct BotServices {
    pub config: AppConfig,
    pub catalog: Arc<dyn MovieCatalog>,
    pub chat: Arc<dyn ChatSender>,
    pub store: Arc<dyn PosterStore>,
}

impl BotServices {
    /// Builds the production clients: TMDB and Telegram over one shared
    /// `reqwest` client, and S3 from the ambient AWS configuration.
    pub async fn from_config(config: AppConfig) -> Self {
        let http = HttpClient::new();
        let shared = aws_config::from_env().load().await;
        let s3 = aws_sdk_s3::Client::new(&shared);

        let catalog = TmdbClient::new(
            http.clone(),
            config.movie_db_token.clone(),
            &config.tmdb_api_base_url,
        );
        let chat = TelegramClient::new(
            http,
            config.telegram_token.clone(),
            &config.telegram_api_base_url,
        );
        let store = S3PosterStore::new(s3, config.images_bucket.clone(), config.presign_expiry);

        Self {
            config,
            catalog: Arc::new(catalog),
            chat: Arc::new(chat),
            store: Arc::new(store),
        }
    }
}

/// How one webhook invocation ended.
#[derive(Debug)]
pub enum Disposition {
    /// Not a text message; nothing to answer.
    Ignored,
    /// The webhook secret header was missing or wrong.
    Unauthorized,
    Replied {
        outcome: ReplyOutcome,
        /// Set when the lookup failed and the user got the not-found reply.
        lookup_error: Option<BotError>,
    },
    Failed {
        error: BotError,
        /// Set when the lookup had already failed before the reply did.
        lookup_error: Option<BotError>,
    },
}

impl Disposition {
    fn is_failure(&self) -> bool {
        match self {
            Disposition::Ignored => false,
            Disposition::Unauthorized | Disposition::Failed { .. } => true,
            Disposition::Replied {
                outcome,
                lookup_error,
            } => {
                lookup_error.is_some()
                    || outcome.delivery_error().is_some()
                    || outcome.cache_error().is_some()
            }
        }
    }

    fn log(&self) {
        match self {
            Disposition::Ignored => info!("Update ignored: no text message"),
            Disposition::Unauthorized => warn!("Rejected update with invalid webhook secret"),
            Disposition::Replied {
                outcome,
                lookup_error,
            } => {
                if let Some(e) = lookup_error {
                    error!("Error fetching movie info: {}", e);
                }
                if let Some(e) = outcome.delivery_error() {
                    error!("Error sending movie info: {}", e);
                }
                if let Some(e) = outcome.cache_error() {
                    error!("Error caching poster: {}", e);
                }
                if outcome.delivery_error().is_none() {
                    info!(?outcome, "Reply delivered");
                }
            }
            Disposition::Failed {
                error: e,
                lookup_error,
            } => {
                if let Some(lookup) = lookup_error {
                    error!("Error fetching movie info: {}", lookup);
                }
                error!("Error handling update: {}", e);
            }
        }
    }
}

/// Lambda handler for the webhook entrypoint.
///
/// # Errors
///
/// Never fails at runtime; the `Result` matches the `lambda_runtime`
/// service signature.
#[tracing::instrument(level = "info", skip(services, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    services: &BotServices,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    Ok(handle_payload(services, &event.payload).await)
}

/// Processes one webhook payload and builds the HTTP response for it.
pub async fn handle_payload(services: &BotServices, payload: &Value) -> Value {
    let disposition = process_update(services, payload).await;
    disposition.log();
    respond(services.config.failure_policy, &disposition)
}

pub async fn process_update(services: &BotServices, payload: &Value) -> Disposition {
    if let Some(secret) = services.config.webhook_secret.as_deref() {
        if !parsing::secret_token_matches(payload, secret) {
            return Disposition::Unauthorized;
        }
    }

    let message = match parsing::extract_body(payload).and_then(parsing::parse_update) {
        Ok(Some(message)) => message,
        Ok(None) => return Disposition::Ignored,
        Err(error) => {
            return Disposition::Failed {
                error,
                lookup_error: None,
            };
        }
    };
    info!(chat_id = message.chat_id, query = %message.text, "Received movie query");

    let composer = ReplyComposer::new(
        services.catalog.as_ref(),
        services.chat.as_ref(),
        services.store.as_ref(),
        &services.config.tmdb_image_base_url,
    );

    let (movie, lookup_error) = match services.catalog.search_movie(&message.text).await {
        Ok(movie) => (movie, None),
        Err(e) => (None, Some(e)),
    };

    let sent = match movie {
        Some(movie) => composer.send_movie_info(message.chat_id, &movie).await,
        None => composer.send_not_found(message.chat_id, &message.text).await,
    };

    match sent {
        Ok(outcome) => Disposition::Replied {
            outcome,
            lookup_error,
        },
        Err(error) => Disposition::Failed {
            error,
            lookup_error,
        },
    }
}

#[must_use]
pub fn respond(policy: FailurePolicy, disposition: &Disposition) -> Value {
    if policy == FailurePolicy::Swallow || !disposition.is_failure() {
        return helpers::ok_response();
    }

    match disposition {
        Disposition::Unauthorized => helpers::err_response(401, "Invalid webhook secret"),
        Disposition::Failed {
            error: BotError::ParseError(msg),
            ..
        } => helpers::err_response(400, &format!("Parse Error: {msg}")),
        Disposition::Failed { error, .. } => helpers::err_response(500, &error.to_string()),
        Disposition::Replied {
            outcome,
            lookup_error,
        } => {
            let reason = lookup_error
                .as_ref()
                .or_else(|| outcome.delivery_error())
                .or_else(|| outcome.cache_error())
                .map_or_else(String::new, ToString::to_string);
            helpers::err_response(500, &reason)
        }
        Disposition::Ignored => helpers::ok_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Movie;
    use crate::storage::MockPosterStore;
    use crate::telegram::MockChatSender;
    use crate::tmdb::MockMovieCatalog;
    use serde_json::json;

    fn config(policy: &str, secret: Option<&str>) -> AppConfig {
        let policy = policy.to_string();
        let secret = secret.map(ToString::to_string);
        AppConfig::from_lookup(move |key| match key {
            "MOVIE_DB_TOKEN" => Some("tmdb".into()),
            "TG_TOKEN" => Some("tg".into()),
            "IMAGES_BUCKET" => Some("posters".into()),
            "FAILURE_POLICY" => Some(policy.clone()),
            "TG_WEBHOOK_SECRET" => secret.clone(),
            _ => None,
        })
        .unwrap()
    }

    fn services(
        config: AppConfig,
        catalog: MockMovieCatalog,
        chat: MockChatSender,
        store: MockPosterStore,
    ) -> BotServices {
        BotServices {
            config,
            catalog: Arc::new(catalog),
            chat: Arc::new(chat),
            store: Arc::new(store),
        }
    }

    fn event(text: &str) -> Value {
        let update = json!({
            "update_id": 1,
            "message": { "message_id": 5, "chat": { "id": 42, "type": "private" }, "text": text }
        });
        json!({ "headers": {}, "body": update.to_string() })
    }

    fn assert_ok(response: &Value) {
        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["body"], r#"{"message":"OK"}"#);
    }

    #[tokio::test]
    async fn test_no_results_sends_not_found_text() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog
            .expect_search_movie()
            .withf(|query| query == "Zzyzx Road")
            .times(1)
            .returning(|_| Ok(None));
        chat.expect_send_text_message()
            .withf(|chat_id, text| *chat_id == 42 && text == "No film found with name Zzyzx Road")
            .times(1)
            .returning(|_, _| Ok(()));

        let services = services(config("swallow", None), catalog, chat, MockPosterStore::new());
        assert_ok(&handle_payload(&services, &event("Zzyzx Road")).await);
    }

    #[tokio::test]
    async fn test_lookup_error_treated_as_not_found() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog.expect_search_movie().returning(|_| {
            Err(BotError::TmdbApi {
                status: 401,
                body: "invalid token".into(),
            })
        });
        chat.expect_send_text_message()
            .withf(|_, text| text == "No film found with name Heat")
            .times(1)
            .returning(|_, _| Ok(()));

        let services = services(config("swallow", None), catalog, chat, MockPosterStore::new());
        assert_ok(&handle_payload(&services, &event("Heat")).await);
    }

    #[tokio::test]
    async fn test_lookup_error_surfaced_when_configured() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog
            .expect_search_movie()
            .returning(|_| Err(BotError::HttpError("dns failure".into())));
        chat.expect_send_text_message().times(1).returning(|_, _| Ok(()));

        let services = services(config("surface", None), catalog, chat, MockPosterStore::new());
        let response = handle_payload(&services, &event("Heat")).await;
        assert_eq!(response["statusCode"], 500);
    }

    #[tokio::test]
    async fn test_malformed_body_still_ok() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog.expect_search_movie().never();
        chat.expect_send_text_message().never();

        let services = services(config("swallow", None), catalog, chat, MockPosterStore::new());
        assert_ok(&handle_payload(&services, &json!({ "body": "{not json" })).await);
        assert_ok(&handle_payload(&services, &json!({})).await);
    }

    #[tokio::test]
    async fn test_malformed_body_surfaced_as_bad_request() {
        let services = services(
            config("surface", None),
            MockMovieCatalog::new(),
            MockChatSender::new(),
            MockPosterStore::new(),
        );
        let response = handle_payload(&services, &json!({ "body": "{not json" })).await;
        assert_eq!(response["statusCode"], 400);
    }

    #[tokio::test]
    async fn test_send_error_still_ok() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog.expect_search_movie().returning(|_| {
            Ok(Some(Movie {
                id: 11,
                title: "Star Wars".into(),
                overview: "Princess Leia is captured.".into(),
                poster_path: None,
            }))
        });
        chat.expect_send_text_message().times(1).returning(|_, _| {
            Err(BotError::TelegramApi {
                status: 403,
                body: "bot was blocked by the user".into(),
            })
        });

        let services = services(config("swallow", None), catalog, chat, MockPosterStore::new());
        assert_ok(&handle_payload(&services, &event("Star Wars")).await);
    }

    #[tokio::test]
    async fn test_update_without_text_is_ignored() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_search_movie().never();

        let update = json!({ "update_id": 2, "edited_message": { "chat": { "id": 42 }, "text": "x" } });
        let payload = json!({ "body": update.to_string() });

        let services = services(
            config("surface", None),
            catalog,
            MockChatSender::new(),
            MockPosterStore::new(),
        );
        let disposition = process_update(&services, &payload).await;
        assert!(matches!(disposition, Disposition::Ignored));
        assert_ok(&respond(FailurePolicy::Surface, &disposition));
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let mut catalog = MockMovieCatalog::new();
        catalog.expect_search_movie().never();

        let mut payload = event("Heat");
        payload["headers"] = json!({ "x-telegram-bot-api-secret-token": "wrong" });

        let swallow = services(
            config("swallow", Some("s3cret")),
            catalog,
            MockChatSender::new(),
            MockPosterStore::new(),
        );
        assert_ok(&handle_payload(&swallow, &payload).await);

        let surface = services(
            config("surface", Some("s3cret")),
            MockMovieCatalog::new(),
            MockChatSender::new(),
            MockPosterStore::new(),
        );
        let response = handle_payload(&surface, &payload).await;
        assert_eq!(response["statusCode"], 401);
    }

    #[tokio::test]
    async fn test_matching_secret_accepted() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog.expect_search_movie().times(1).returning(|_| Ok(None));
        chat.expect_send_text_message().times(1).returning(|_, _| Ok(()));

        let mut payload = event("Heat");
        payload["headers"] = json!({ "X-Telegram-Bot-Api-Secret-Token": "s3cret" });

        let services = services(config("surface", Some("s3cret")), catalog, chat, MockPosterStore::new());
        assert_ok(&handle_payload(&services, &payload).await);
    }

    #[tokio::test]
    async fn test_lookup_and_send_failures_both_reported() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        catalog
            .expect_search_movie()
            .returning(|_| Err(BotError::HttpError("dns failure".into())));
        chat.expect_send_text_message().times(1).returning(|_, _| {
            Err(BotError::TelegramApi {
                status: 403,
                body: "bot was blocked by the user".into(),
            })
        });

        let services = services(config("surface", None), catalog, chat, MockPosterStore::new());
        let disposition = process_update(&services, &event("Heat")).await;

        match &disposition {
            Disposition::Failed {
                error: BotError::TelegramApi { status: 403, .. },
                lookup_error: Some(BotError::HttpError(_)),
            } => {}
            other => panic!("Unexpected disposition: {other:?}"),
        }
        assert_eq!(respond(FailurePolicy::Surface, &disposition)["statusCode"], 500);
    }

    #[tokio::test]
    async fn test_site_photo_delivery_failure_still_caches() {
        let mut catalog = MockMovieCatalog::new();
        let mut chat = MockChatSender::new();
        let mut store = MockPosterStore::new();
        catalog.expect_search_movie().returning(|_| {
            Ok(Some(Movie {
                id: 5,
                title: "Four Rooms".into(),
                overview: "New Year's Eve at the Mon Signor Hotel.".into(),
                poster_path: Some("/rooms.jpg".into()),
            }))
        });
        store.expect_exists().returning(|_| Ok(false));
        chat.expect_send_photo().times(1).returning(|_, _, _| {
            Err(BotError::TelegramApi {
                status: 400,
                body: "wrong file identifier".into(),
            })
        });
        catalog
            .expect_download_poster()
            .times(1)
            .returning(|_| Ok(vec![0xFF, 0xD8]));
        store
            .expect_put()
            .withf(|key, _, _| key == "movie-5.jpg")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let services = services(config("surface", None), catalog, chat, store);
        let response = handle_payload(&services, &event("Four Rooms")).await;
        assert_eq!(response["statusCode"], 500);
    }
}
