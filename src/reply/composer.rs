//! Builds and sends the reply for one looked-up movie.
//!
//! The photo either comes from the poster cache (presigned URL) or straight
//! from TMDB, in which case the poster is copied into the cache after the
//! photo was sent, whether or not Telegram accepted it.

use tracing::{info, warn};

use crate::core::models::Movie;
use crate::errors::BotError;
use crate::storage::{PosterStore, cache_key, content_type_for};
use crate::telegram::ChatSender;
use crate::tmdb::MovieCatalog;

pub const NO_POSTER_MESSAGE: &str = "Movie found but no poster available.";
pub const FROM_CACHE_PREFIX: &str = "Send from s3\n";
pub const FROM_SITE_PREFIX: &str = "Send from site\n";

#[must_use]
pub fn not_found_message(query: &str) -> String {
    format!("No film found with name {query}")
}

#[must_use]
pub fn build_caption(movie: &Movie) -> String {
    format!("Name: {}\nDescription: {}", movie.title, movie.overview)
}

/// Which reply was sent.
#[derive(Debug)]
pub enum ReplyOutcome {
    NotFound,
    NoPoster,
    FromCache {
        key: String,
    },
    /// The poster is cached whether or not the photo reached the chat;
    /// `delivery` and `cache_write` carry the two results.
    FromSite {
        key: String,
        delivery: Result<(), BotError>,
        cache_write: Result<(), BotError>,
    },
}

impl ReplyOutcome {
    #[must_use]
    pub fn delivery_error(&self) -> Option<&BotError> {
        match self {
            ReplyOutcome::FromSite {
                delivery: Err(e), ..
            } => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn cache_error(&self) -> Option<&BotError> {
        match self {
            ReplyOutcome::FromSite {
                cache_write: Err(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

pub struct ReplyComposer<'a> {
    catalog: &'a dyn MovieCatalog,
    chat: &'a dyn ChatSender,
    store: &'a dyn PosterStore,
    image_base_url: &'a str,
}

impl<'a> ReplyComposer<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a dyn MovieCatalog,
        chat: &'a dyn ChatSender,
        store: &'a dyn PosterStore,
        image_base_url: &'a str,
    ) -> Self {
        Self {
            catalog,
            chat,
            store,
            image_base_url,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    pub async fn send_not_found(
        &self,
        chat_id: i64,
        query: &str,
    ) -> Result<ReplyOutcome, BotError> {
        self.chat
            .send_text_message(chat_id, &not_found_message(query))
            .await?;
        Ok(ReplyOutcome::NotFound)
    }

    /// Sends the poster and description of `movie` to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if presigning fails or a text or cached photo reply
    /// cannot be delivered. On the TMDB path both the delivery and the cache
    /// write are reported in [`ReplyOutcome::FromSite`] instead.
    pub async fn send_movie_info(
        &self,
        chat_id: i64,
        movie: &Movie,
    ) -> Result<ReplyOutcome, BotError> {
        let Some(photo_url) = movie.poster_url(self.image_base_url) else {
            self.chat
                .send_text_message(chat_id, NO_POSTER_MESSAGE)
                .await?;
            return Ok(ReplyOutcome::NoPoster);
        };

        let caption = build_caption(movie);
        let key = cache_key(movie.id);

        if self.image_cached(&key).await {
            let cached_url = self.store.presigned_url(&key).await?;
            self.chat
                .send_photo(chat_id, &cached_url, &format!("{FROM_CACHE_PREFIX}{caption}"))
                .await?;
            info!(movie_id = movie.id, key = %key, "Sent poster from cache");
            return Ok(ReplyOutcome::FromCache { key });
        }

        let delivery = self
            .chat
            .send_photo(chat_id, &photo_url, &format!("{FROM_SITE_PREFIX}{caption}"))
            .await;
        if delivery.is_ok() {
            info!(movie_id = movie.id, key = %key, "Sent poster from TMDB");
        }

        let cache_write = self.cache_photo(&photo_url, movie.id).await;
        Ok(ReplyOutcome::FromSite {
            key,
            delivery,
            cache_write,
        })
    }

    /// Downloads the poster at `photo_url` and stores it under the movie's key.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the upload fails.
    pub async fn cache_photo(&self, photo_url: &str, movie_id: u64) -> Result<(), BotError> {
        let key = cache_key(movie_id);
        let bytes = self.catalog.download_poster(photo_url).await?;
        self.store.put(&key, bytes, &content_type_for(&key)).await
    }

    async fn image_cached(&self, key: &str) -> bool {
        match self.store.exists(key).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key, "Cache check failed, treating as miss: {}", e);
                false
            }
        }
    }
}
