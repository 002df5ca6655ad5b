//! TMDB metadata lookup

pub mod client;

pub use client::{MovieCatalog, TmdbClient};

#[cfg(test)]
pub use client::MockMovieCatalog;
