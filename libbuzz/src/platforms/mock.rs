//! Mock publisher for testing
//!
//! Simulates successes, failures and slow platforms, and records every call
//! so dispatch tests can assert how often a platform was hit and with what.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PlatformError;
use crate::platforms::Publisher;
use crate::types::{Credential, Platform};

/// Configuration for mock publisher behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub platform: Platform,

    /// Error to return instead of publishing
    pub error: Option<PlatformError>,

    /// Fixed post id to return; generated from the call number when unset
    pub post_id: Option<String>,

    /// Delay before answering (simulates network latency)
    pub delay: Duration,

    /// Number of times publish_text has been called
    pub call_count: Arc<Mutex<usize>>,

    /// Text of every call, in order
    pub published_content: Arc<Mutex<Vec<String>>>,
}

impl MockConfig {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            error: None,
            post_id: None,
            delay: Duration::from_millis(0),
            call_count: Arc::new(Mutex::new(0)),
            published_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

/// Mock publisher for testing
pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Always succeeds with a generated id
    pub fn success(platform: Platform) -> Self {
        Self::new(MockConfig::new(platform))
    }

    /// Always succeeds with `post_id`
    pub fn with_id(platform: Platform, post_id: &str) -> Self {
        Self::new(MockConfig {
            post_id: Some(post_id.to_string()),
            ..MockConfig::new(platform)
        })
    }

    /// Always fails with `error`
    pub fn failure(platform: Platform, error: PlatformError) -> Self {
        Self::new(MockConfig {
            error: Some(error),
            ..MockConfig::new(platform)
        })
    }

    /// Always fails with a posting error carrying `reason`
    pub fn post_failure(platform: Platform, reason: &str) -> Self {
        Self::failure(platform, PlatformError::Posting(reason.to_string()))
    }

    /// Succeeds after `delay`
    pub fn with_delay(platform: Platform, delay: Duration) -> Self {
        Self::new(MockConfig {
            delay,
            ..MockConfig::new(platform)
        })
    }

    /// Number of times publish_text was called
    pub fn call_count(&self) -> usize {
        *self
            .config
            .call_count
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All text passed to publish_text, including failed calls
    pub fn published_content(&self) -> Vec<String> {
        self.config
            .published_content
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish_text(
        &self,
        _credential: &Credential,
        text: &str,
    ) -> Result<String, PlatformError> {
        let call_number = {
            let mut count = self
                .config
                .call_count
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *count += 1;
            *count
        };

        self.config
            .published_content
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(text.to_string());

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if let Some(error) = &self.config.error {
            return Err(error.clone());
        }

        Ok(self
            .config
            .post_id
            .clone()
            .unwrap_or_else(|| format!("{}-mock-{}", self.config.platform, call_number)))
    }

    fn platform(&self) -> Platform {
        self.config.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::new(Platform::Twitter, "token")
    }

    #[tokio::test]
    async fn test_mock_success() {
        let publisher = MockPublisher::success(Platform::Twitter);

        let first = publisher.publish_text(&credential(), "One").await.unwrap();
        let second = publisher.publish_text(&credential(), "Two").await.unwrap();

        assert_eq!(first, "twitter-mock-1");
        assert_eq!(second, "twitter-mock-2");
        assert_eq!(publisher.call_count(), 2);
        assert_eq!(publisher.published_content(), vec!["One", "Two"]);
    }

    #[tokio::test]
    async fn test_mock_fixed_id() {
        let publisher = MockPublisher::with_id(Platform::Twitter, "123");
        assert_eq!(publisher.publish_text(&credential(), "Hi").await.unwrap(), "123");
    }

    #[tokio::test]
    async fn test_mock_failure_counts_calls() {
        let publisher = MockPublisher::post_failure(Platform::LinkedIn, "token expired");

        let err = publisher.publish_text(&credential(), "Hi").await.unwrap_err();
        assert_eq!(err.reason(), "token expired");
        assert_eq!(publisher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let publisher = MockPublisher::with_delay(Platform::Twitter, Duration::from_millis(50));

        let start = std::time::Instant::now();
        publisher.publish_text(&credential(), "Hi").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
