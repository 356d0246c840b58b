//! HTTP client for the origin API.
//!
//! Authenticates every request with the configured token in the
//! `Authorization` header, exactly as given (include any `Bot ` prefix in
//! the token itself). The endpoint can point at the real API or at a
//! compatible proxy.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RestError;
use crate::message::MessageContent;

/// Default API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://discord.com/api";

/// Connection settings for [`RestClient`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RestConfig {
    /// Token sent in the `Authorization` header.
    pub token: String,
    /// Prefix for every route, `http(s)://host[/path]`.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_owned()
}

impl RestConfig {
    /// Settings for the default endpoint.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: default_endpoint(),
        }
    }

    /// Use a different endpoint, e.g. a rate-limiting proxy.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Structured error object returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    message: String,
}

/// Client for the origin REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    token: String,
    endpoint: String,
}

impl RestClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidInput`] if the token or endpoint is empty.
    pub fn new(config: RestConfig) -> Result<Self, RestError> {
        if config.token.is_empty() {
            return Err(RestError::InvalidInput("token must not be empty".to_owned()));
        }
        let endpoint = config.endpoint.trim_end_matches('/').to_owned();
        if endpoint.is_empty() {
            return Err(RestError::InvalidInput("endpoint must not be empty".to_owned()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            token: config.token,
            endpoint,
        })
    }

    /// The endpoint prefix, without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post a message to a channel and return the created message.
    ///
    /// Sends a JSON body, or a multipart form with `payload_json` and `file`
    /// fields when the content carries a file.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::InvalidInput`] if `channel_id` is empty or the
    /// content has no text, embed, or file. Returns [`RestError::Api`] or
    /// [`RestError::UnexpectedStatus`] if the API does not answer 200, and
    /// [`RestError::Http`] if the request fails in transit.
    pub async fn create_message(
        &self,
        channel_id: &str,
        content: impl Into<MessageContent>,
    ) -> Result<Value, RestError> {
        let content = content.into();
        if channel_id.is_empty() {
            return Err(RestError::InvalidInput("channel id must not be empty".to_owned()));
        }
        if content.is_empty() {
            return Err(RestError::InvalidInput(
                "message needs at least one of text, embed, or file".to_owned(),
            ));
        }

        let url = format!("{}/channels/{channel_id}/messages", self.endpoint);
        let payload = serde_json::to_string(&content.payload())?;
        let request = self
            .client
            .post(&url)
            .header("Authorization", &self.token);

        let request = match content.file {
            Some(file) => {
                let mut part = Part::bytes(file.data).file_name(file.filename);
                if let Some(content_type) = &file.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        RestError::InvalidInput(format!("bad attachment content type: {e}"))
                    })?;
                }
                let form = Form::new().text("payload_json", payload).part("file", part);
                request.multipart(form)
            }
            None => request
                .header("Content-Type", "application/json; charset=utf-8")
                .body(payload),
        };

        debug!(channel_id, "creating message");
        let response = request
            .send()
            .await
            .map_err(|e| RestError::Http(format!("create message request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RestError::Http(format!("failed to read response body: {e}")))?;

        if status != reqwest::StatusCode::OK {
            warn!(channel_id, status = status.as_u16(), "create message rejected");
            return Err(api_error(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Build the error for a non-200 response body.
fn api_error(status: u16, body: &str) -> RestError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { code, message }) => RestError::Api {
            status,
            code,
            message,
        },
        Err(_) => RestError::UnexpectedStatus { status },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slashes() {
        let client =
            RestClient::new(RestConfig::new("t").with_endpoint("http://proxy:8080/api//")).unwrap();
        assert_eq!(client.endpoint(), "http://proxy:8080/api");

        let client = RestClient::new(RestConfig::new("t")).unwrap();
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn rejects_empty_token_and_endpoint() {
        assert!(matches!(
            RestClient::new(RestConfig::new("")),
            Err(RestError::InvalidInput(_))
        ));
        assert!(matches!(
            RestClient::new(RestConfig::new("t").with_endpoint("/")),
            Err(RestError::InvalidInput(_))
        ));
    }

    #[test]
    fn config_endpoint_defaults_when_absent() {
        let config: RestConfig = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn classifies_error_bodies() {
        assert!(matches!(
            api_error(404, r#"{"code": 10003, "message": "Unknown Channel"}"#),
            RestError::Api { status: 404, code: 10003, ref message } if message == "Unknown Channel"
        ));
        assert!(matches!(
            api_error(502, "<html>bad gateway</html>"),
            RestError::UnexpectedStatus { status: 502 }
        ));
        assert!(matches!(
            api_error(400, r#"{"message": "no code"}"#),
            RestError::UnexpectedStatus { status: 400 }
        ));
    }

    #[tokio::test]
    async fn rejects_empty_message_before_sending() {
        let client = RestClient::new(RestConfig::new("t").with_endpoint("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            client.create_message("1", MessageContent::default()).await,
            Err(RestError::InvalidInput(_))
        ));
        assert!(matches!(
            client.create_message("", "hi").await,
            Err(RestError::InvalidInput(_))
        ));
    }
}
