//! Response builders for the webhook.
//!
//! API Gateway proxy integrations expect `body` to be a string, so JSON
//! bodies are serialized before being wrapped.

use serde_json::{Value, json};

/// Returns the fixed 200 OK acknowledgement.
#[must_use]
pub fn ok_response() -> Value {
    json!({
        "statusCode": 200,
        "body": json!({ "message": "OK" }).to_string()
    })
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "body": json!({ "error": message }).to_string()
    })
}
