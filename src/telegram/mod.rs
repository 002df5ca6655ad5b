//! Telegram-specific functionality

pub mod client;

pub use client::{ChatSender, TelegramClient, build_photo_payload, build_text_payload};

#[cfg(test)]
pub use client::MockChatSender;
