//! Platform publishers
//!
//! Every platform implements [`Publisher`]: take a resolved credential and a
//! piece of text, publish it, and return the platform's post id. Adapters own
//! their credential shape and their HTTP error mapping; the dispatcher only
//! sees [`PlatformError`].
//!
//! ```no_run
//! use libbuzz::config::Config;
//! use libbuzz::platforms::Publishers;
//! use libbuzz::{Credential, Platform};
//!
//! # async fn example() -> Result<(), libbuzz::error::PlatformError> {
//! let publishers = Publishers::from_config(&Config::default_config());
//! let credential = Credential::new(Platform::Twitter, "bearer-token");
//! let id = publishers.get(Platform::Twitter)
//!     .publish_text(&credential, "Hello from Buzzalicious")
//!     .await?;
//! println!("Posted: {}", id);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::Config;
use crate::error::PlatformError;
use crate::types::{Credential, Platform};

pub mod linkedin;
pub mod twitter;

// Available outside of tests so integration tests and the binaries' tests can use it
pub mod mock;

#[cfg(test)]
pub(crate) mod test_server;

pub use linkedin::LinkedInPublisher;
pub use mock::MockPublisher;
pub use twitter::TwitterPublisher;

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `text` on behalf of the credential's owner
    ///
    /// Returns the platform's id for the new post.
    async fn publish_text(&self, credential: &Credential, text: &str)
        -> Result<String, PlatformError>;

    fn platform(&self) -> Platform;

    fn character_limit(&self) -> usize {
        self.platform().character_limit()
    }
}

/// One publisher per platform
#[derive(Clone)]
pub struct Publishers {
    by_platform: HashMap<Platform, Arc<dyn Publisher>>,
}

impl Publishers {
    /// Start from an empty registry; use [`Publishers::with`] to fill it
    pub fn empty() -> Self {
        Self {
            by_platform: HashMap::new(),
        }
    }

    /// The real HTTP adapters, sharing one connection pool
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self::empty()
            .with(Arc::new(TwitterPublisher::new(
                http.clone(),
                &config.twitter.api_base,
            )))
            .with(Arc::new(LinkedInPublisher::new(
                http,
                &config.linkedin.api_base,
            )))
    }

    /// Register (or replace) the publisher for its platform
    pub fn with(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.by_platform.insert(publisher.platform(), publisher);
        self
    }

    /// Publisher for `platform`
    ///
    /// Registries built with [`Publishers::from_config`] always have both.
    /// A registry missing a platform yields a publisher that fails every call.
    pub fn get(&self, platform: Platform) -> Arc<dyn Publisher> {
        self.by_platform
            .get(&platform)
            .cloned()
            .unwrap_or_else(|| Arc::new(Unconfigured(platform)))
    }
}

struct Unconfigured(Platform);

#[async_trait]
impl Publisher for Unconfigured {
    async fn publish_text(&self, _: &Credential, _: &str) -> Result<String, PlatformError> {
        Err(PlatformError::Posting(format!(
            "no publisher configured for {}",
            self.0
        )))
    }

    fn platform(&self) -> Platform {
        self.0
    }
}

/// Map a non-success HTTP status to a [`PlatformError`]
///
/// - 401/403 → `Authentication`
/// - 429 → `RateLimit`
/// - other 4xx → `Validation`
/// - everything else → `Posting`
pub(crate) fn map_status(status: StatusCode, reason: String) -> PlatformError {
    match status.as_u16() {
        401 | 403 => PlatformError::Authentication(reason),
        429 => PlatformError::RateLimit(reason),
        400..=499 => PlatformError::Validation(reason),
        _ => PlatformError::Posting(reason),
    }
}

/// Transport failures (DNS, connect, TLS, body read)
pub(crate) fn map_transport(error: reqwest::Error) -> PlatformError {
    PlatformError::Network(error.to_string())
}

/// Pull a human message out of an error body
///
/// Tries each key of a JSON object in order and falls back to the raw body,
/// or to the status line when the body is empty.
pub(crate) fn error_reason(status: StatusCode, body: &str, keys: &[&str]) -> String {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in keys {
            if let Some(serde_json::Value::String(message)) = map.get(*key) {
                if !message.trim().is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}

/// Join a configured API base and a path without doubling slashes
pub(crate) fn endpoint(api_base: &str, path: &str) -> String {
    format!("{}/{}", api_base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_status() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, "x".into()),
            PlatformError::Authentication(_)
        ));
        assert!(matches!(
            map_status(StatusCode::FORBIDDEN, "x".into()),
            PlatformError::Authentication(_)
        ));
        assert!(matches!(
            map_status(StatusCode::TOO_MANY_REQUESTS, "x".into()),
            PlatformError::RateLimit(_)
        ));
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "x".into()),
            PlatformError::Validation(_)
        ));
        assert!(matches!(
            map_status(StatusCode::BAD_GATEWAY, "x".into()),
            PlatformError::Posting(_)
        ));
    }

    #[test]
    fn test_error_reason_prefers_json_keys() {
        let body = r#"{"title":"Forbidden","detail":"You are not permitted to post"}"#;
        assert_eq!(
            error_reason(StatusCode::FORBIDDEN, body, &["detail", "title"]),
            "You are not permitted to post"
        );
    }

    #[test]
    fn test_error_reason_falls_back_to_body_then_status() {
        assert_eq!(
            error_reason(StatusCode::BAD_REQUEST, "plain text", &["message"]),
            "plain text"
        );
        assert_eq!(
            error_reason(StatusCode::BAD_REQUEST, "", &["message"]),
            "HTTP 400 Bad Request"
        );
        assert_eq!(
            error_reason(StatusCode::BAD_REQUEST, r#"{"message":""}"#, &["message"]),
            r#"{"message":""}"#
        );
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        assert_eq!(
            endpoint("https://api.x.com/", "/2/tweets"),
            "https://api.x.com/2/tweets"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080", "v2/ugcPosts"),
            "http://127.0.0.1:8080/v2/ugcPosts"
        );
    }

    #[tokio::test]
    async fn test_registry_lookup_and_fallback() {
        let publishers = Publishers::empty().with(Arc::new(MockPublisher::success(Platform::Twitter)));

        assert_eq!(publishers.get(Platform::Twitter).platform(), Platform::Twitter);

        let missing = publishers.get(Platform::LinkedIn);
        let credential = Credential::new(Platform::LinkedIn, "t");
        let err = missing.publish_text(&credential, "hi").await.unwrap_err();
        assert_eq!(err.reason(), "no publisher configured for linkedin");
    }

    #[test]
    fn test_from_config_registers_both() {
        let publishers = Publishers::from_config(&Config::default_config());
        for platform in Platform::ALL {
            assert_eq!(publishers.get(platform).platform(), platform);
            assert_eq!(
                publishers.get(platform).character_limit(),
                platform.character_limit()
            );
        }
    }
}
