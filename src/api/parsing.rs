use serde_json::Value;

use crate::core::models::{IncomingMessage, TelegramUpdate};
use crate::errors::BotError;

pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Raw request body of an API Gateway / Function URL event.
///
/// # Errors
///
/// Returns an error if the event has no string `body`.
pub fn extract_body(payload: &Value) -> Result<&str, BotError> {
    let Some(body) = payload.get("body") else {
        return Err(BotError::ParseError("missing body".to_string()));
    };

    body.as_str()
        .ok_or_else(|| BotError::ParseError("body is not a string".to_string()))
}

/// Decodes a Telegram update. `Ok(None)` means the update carries no text
/// message and should be ignored.
///
/// # Errors
///
/// Returns an error if the body is not a JSON Telegram update.
pub fn parse_update(body: &str) -> Result<Option<IncomingMessage>, BotError> {
    let update: TelegramUpdate = serde_json::from_str(body)
        .map_err(|e| BotError::ParseError(format!("invalid update JSON: {e}")))?;

    let Some(message) = update.message else {
        return Ok(None);
    };

    Ok(message
        .text
        .filter(|text| !text.trim().is_empty())
        .map(|text| IncomingMessage {
            chat_id: message.chat.id,
            text,
        }))
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// Whether the event carries the secret Telegram was configured to send.
#[must_use]
pub fn secret_token_matches(payload: &Value, expected: &str) -> bool {
    payload
        .get("headers")
        .and_then(|headers| get_header_value(headers, SECRET_TOKEN_HEADER))
        .is_some_and(|received| received == expected)
}
