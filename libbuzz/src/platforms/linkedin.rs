//! LinkedIn publisher (UGC posts API)
//!
//! The author URN is built from the credential's `account_id`, the member id
//! captured when the user connected their account.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{endpoint, error_reason, map_status, map_transport, Publisher};
use crate::error::PlatformError;
use crate::types::{Credential, Platform};

const RESTLI_ID_HEADER: &str = "x-restli-id";

#[derive(Clone)]
pub struct LinkedInPublisher {
    http: Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct UgcPostResponse {
    id: String,
}

impl LinkedInPublisher {
    pub fn new(http: Client, api_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.to_string(),
        }
    }

    fn ugc_posts_url(&self) -> String {
        endpoint(&self.api_base, "v2/ugcPosts")
    }
}

/// Request body for a public text share
fn share_body(author_urn: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "author": author_urn,
        "lifecycleState": "PUBLISHED",
        "specificContent": {
            "com.linkedin.ugc.ShareContent": {
                "shareCommentary": { "text": text },
                "shareMediaCategory": "NONE"
            }
        },
        "visibility": {
            "com.linkedin.ugc.MemberNetworkVisibility": "PUBLIC"
        }
    })
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish_text(
        &self,
        credential: &Credential,
        text: &str,
    ) -> Result<String, PlatformError> {
        let account_id = credential
            .account_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                PlatformError::Authentication("linkedin account id missing".to_string())
            })?;

        let author = format!("urn:li:person:{}", account_id);

        let resp = self
            .http
            .post(self.ugc_posts_url())
            .bearer_auth(credential.token())
            .header("X-Restli-Protocol-Version", "2.0.0")
            .json(&share_body(&author, text))
            .send()
            .await
            .map_err(map_transport)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let reason = error_reason(status, &text, &["message"]);
            tracing::debug!(status = %status, reason = %reason, "linkedin rejected post");
            return Err(map_status(status, reason));
        }

        // The id comes back in a header; older API versions also echo it in the body
        if let Some(id) = resp
            .headers()
            .get(RESTLI_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
        {
            return Ok(id.to_string());
        }

        let body: UgcPostResponse = resp.json().await.map_err(|e| {
            PlatformError::Posting(format!("linkedin response carried no post id: {}", e))
        })?;

        Ok(body.id)
    }

    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }
}
