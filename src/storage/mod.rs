//! Object storage for cached posters

pub mod poster_store;

pub use poster_store::{PosterStore, S3PosterStore, cache_key, content_type_for};

#[cfg(test)]
pub use poster_store::MockPosterStore;
