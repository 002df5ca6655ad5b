//! Reply selection and delivery

pub mod composer;

pub use composer::{
    FROM_CACHE_PREFIX, FROM_SITE_PREFIX, NO_POSTER_MESSAGE, ReplyComposer, ReplyOutcome,
    build_caption, not_found_message,
};
