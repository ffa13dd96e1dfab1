//! Twitter (X API v2) publisher
//!
//! Posts with a user OAuth 2.0 bearer token:
//! `POST {api_base}/2/tweets` with `{"text": ...}`, answering
//! `{"data": {"id": "...", "text": "..."}}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{endpoint, error_reason, map_status, map_transport, Publisher};
use crate::error::PlatformError;
use crate::types::{Credential, Platform};

#[derive(Clone)]
pub struct TwitterPublisher {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TweetEnvelope {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterPublisher {
    pub fn new(http: Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.to_string(),
        }
    }

    fn tweets_url(&self) -> String {
        endpoint(&self.api_base, "2/tweets")
    }
}

#[async_trait]
impl Publisher for TwitterPublisher {
    async fn publish_text(
        &self,
        credential: &Credential,
        text: &str,
    ) -> Result<String, PlatformError> {
        let body = serde_json::json!({ "text": text });

        let resp = self
            .http
            .post(self.tweets_url())
            .bearer_auth(credential.token())
            .json(&body)
            .send()
            .await
            .map_err(map_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let reason = error_reason(status, &text, &["detail", "title"]);
            tracing::debug!(status = %status, reason = %reason, "twitter rejected post");
            return Err(map_status(status, reason));
        }

        let envelope: TweetEnvelope = resp.json().await.map_err(|e| {
            PlatformError::Posting(format!("unexpected tweet response: {}", e))
        })?;

        Ok(envelope.data.id)
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }
}
