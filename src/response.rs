use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::{BackendError, Result};

/// Successful response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(JsonValue),
    /// Body that was not valid JSON.
    Text(String),
}

impl Payload {
    /// Decodes the payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Payload::Json(value) => value,
            Payload::Text(text) => JsonValue::String(text),
        };
        serde_json::from_value(value).map_err(|err| BackendError::Decode(err.to_string()))
    }

    /// Unwraps an `{ ok, data, error }` envelope when present; `status` is
    /// reported if the envelope says `ok: false`.
    pub(crate) fn unwrap_envelope(self, status: u16) -> Result<Payload> {
        match self {
            Payload::Json(JsonValue::Object(mut map)) if map.contains_key("ok") => {
                if map.get("ok") == Some(&JsonValue::Bool(false)) {
                    let message = message_field(&JsonValue::Object(map))
                        .unwrap_or_else(|| "request was not successful".to_owned());
                    return Err(BackendError::Domain { status, message });
                }
                Ok(Payload::Json(map.remove("data").unwrap_or(JsonValue::Null)))
            }
            other => Ok(other),
        }
    }
}

/// Interprets a response returned by the client.
///
/// Failure statuses become [`BackendError::Domain`] carrying the server's
/// `error`/`message` text when the body is a JSON object, otherwise the
/// status reason phrase. Success bodies are parsed as JSON, or returned as
/// text when they are not JSON.
pub async fn handle_response(response: reqwest::Response) -> Result<Payload> {
    let status = response.status();
    let body = response.text().await.map_err(BackendError::Body)?;
    interpret(status, &body)
}

/// Like [`handle_response`], then unwraps the `{ ok, data, error }` envelope.
///
/// `data` is returned on `ok: true`; `ok: false` becomes
/// [`BackendError::Domain`] with the response's real status. Bare JSON and
/// text bodies pass through unchanged.
pub async fn handle_envelope(response: reqwest::Response) -> Result<Payload> {
    let status = response.status();
    let body = response.text().await.map_err(BackendError::Body)?;
    interpret(status, &body)?.unwrap_envelope(status.as_u16())
}

pub(crate) fn interpret(status: reqwest::StatusCode, body: &str) -> Result<Payload> {
    let fallback = format!("HTTP {}", status.as_u16());

    if !status.is_success() {
        let message = match serde_json::from_str::<JsonValue>(body) {
            Ok(value) => message_field(&value).unwrap_or(fallback),
            Err(_) => status
                .canonical_reason()
                .map(str::to_owned)
                .unwrap_or(fallback),
        };
        return Err(BackendError::Domain {
            status: status.as_u16(),
            message,
        });
    }

    Ok(match serde_json::from_str::<JsonValue>(body) {
        Ok(value) => Payload::Json(value),
        Err(_) => Payload::Text(body.to_owned()),
    })
}

fn message_field(value: &JsonValue) -> Option<String> {
    ["error", "message"].iter().find_map(|key| {
        value
            .get(key)
            .and_then(JsonValue::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    })
}
