//! Core types for Buzzalicious

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BuzzError;

/// A platform the dispatcher can publish to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitter,
    LinkedIn,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Twitter, Platform::LinkedIn];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitter => "twitter",
            Platform::LinkedIn => "linkedin",
        }
    }

    /// Hard character limit enforced by the platform API
    pub fn character_limit(&self) -> usize {
        match self {
            Platform::Twitter => 280,
            Platform::LinkedIn => 3000,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = BuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::LinkedIn),
            other => Err(BuzzError::InvalidInput(format!(
                "Unknown platform '{}'. Valid platforms: twitter, linkedin",
                other
            ))),
        }
    }
}

/// Where a scheduled post should go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetPlatform {
    Twitter,
    LinkedIn,
    Both,
}

impl TargetPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Twitter => "twitter",
            TargetPlatform::LinkedIn => "linkedin",
            TargetPlatform::Both => "both",
        }
    }

    /// Platforms to attempt, in dispatch order
    pub fn platforms(&self) -> &'static [Platform] {
        match self {
            TargetPlatform::Twitter => &[Platform::Twitter],
            TargetPlatform::LinkedIn => &[Platform::LinkedIn],
            TargetPlatform::Both => &Platform::ALL,
        }
    }

    pub fn includes(&self, platform: Platform) -> bool {
        self.platforms().contains(&platform)
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPlatform {
    type Err = BuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" => Ok(TargetPlatform::Both),
            other => match other.parse::<Platform>() {
                Ok(Platform::Twitter) => Ok(TargetPlatform::Twitter),
                Ok(Platform::LinkedIn) => Ok(TargetPlatform::LinkedIn),
                Err(_) => Err(BuzzError::InvalidInput(format!(
                    "Invalid platform '{}'. Must be one of: twitter, linkedin, both",
                    s
                ))),
            },
        }
    }
}

/// Lifecycle state of a scheduled post
///
/// `Publishing` marks a post claimed by a dispatcher. `Posted`, `Failed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Publishing,
    Posted,
    Failed,
    Cancelled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Publishing => "publishing",
            PostStatus::Posted => "posted",
            PostStatus::Failed => "failed",
            PostStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PostStatus::Posted | PostStatus::Failed | PostStatus::Cancelled
        )
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = BuzzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PostStatus::Pending),
            "publishing" => Ok(PostStatus::Publishing),
            "posted" => Ok(PostStatus::Posted),
            "failed" => Ok(PostStatus::Failed),
            "cancelled" | "canceled" => Ok(PostStatus::Cancelled),
            other => Err(BuzzError::InvalidInput(format!(
                "Invalid status '{}'. Must be one of: pending, publishing, posted, failed, cancelled",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: i64,
}

impl User {
    pub fn new(email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Per-platform result fields stored on a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFields {
    pub post_id: Option<String>,
    pub posted_at: Option<i64>,
    pub error: Option<String>,
}

impl PlatformFields {
    pub fn is_empty(&self) -> bool {
        self.post_id.is_none() && self.posted_at.is_none() && self.error.is_none()
    }
}

/// A post a user wants published at a future time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub platform: TargetPlatform,
    pub scheduled_for: i64,
    pub status: PostStatus,
    pub twitter: PlatformFields,
    pub linkedin: PlatformFields,
    pub generation_id: Option<String>,
    pub claimed_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ScheduledPost {
    /// Outcome fields for one platform
    pub fn fields(&self, platform: Platform) -> &PlatformFields {
        match platform {
            Platform::Twitter => &self.twitter,
            Platform::LinkedIn => &self.linkedin,
        }
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.status == PostStatus::Pending && self.scheduled_for <= now
    }
}

/// Input for creating a scheduled post
#[derive(Debug, Clone)]
pub struct NewScheduledPost {
    pub user_id: String,
    pub content: String,
    pub platform: TargetPlatform,
    pub scheduled_for: i64,
    pub generation_id: Option<String>,
}

/// A user's stored access credential for one platform
///
/// The token is kept as a [`SecretString`] so it never shows up in `Debug`
/// output or logs.
#[derive(Debug, Clone)]
pub struct Credential {
    pub platform: Platform,
    pub access_token: SecretString,
    /// Platform account identifier (the LinkedIn member id)
    pub account_id: Option<String>,
    pub expires_at: Option<i64>,
}

impl Credential {
    pub fn new(platform: Platform, access_token: impl Into<String>) -> Self {
        Self {
            platform,
            access_token: SecretString::from(access_token.into()),
            account_id: None,
            expires_at: None,
        }
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// True once `now` has reached `expires_at`
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Non-secret view of a stored credential, for listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialSummary {
    pub platform: Platform,
    pub account_id: Option<String>,
    pub expires_at: Option<i64>,
    pub updated_at: i64,
}
