//! Per-platform outcome tracking and the terminal status rule
//!
//! A dispatch attempt produces one [`PlatformOutcome`] per requested
//! platform. [`DispatchOutcome::final_status`] folds them into the post's
//! terminal status:
//!
//! - a single-platform post is `posted` only if that platform succeeded,
//! - a `both` post is `posted` if at least one platform succeeded,
//! - everything else is `failed`.
//!
//! Platforms that were not requested stay `None` and their columns are left
//! untouched.

use serde::Serialize;

use crate::credentials::CredentialGate;
use crate::error::PlatformError;
use crate::types::{Platform, PlatformFields, PostStatus, TargetPlatform};

/// Result of attempting one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum PlatformOutcome {
    Published { post_id: String, posted_at: i64 },
    Failed { error: String },
}

impl PlatformOutcome {
    pub fn published(post_id: impl Into<String>, posted_at: i64) -> Self {
        PlatformOutcome::Published {
            post_id: post_id.into(),
            posted_at,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        PlatformOutcome::Failed {
            error: error.into(),
        }
    }

    /// Outcome for a publisher error; the reason is kept verbatim
    pub fn from_platform_error(error: &PlatformError) -> Self {
        Self::failed(error.reason())
    }

    /// Outcome for a credential that failed the gate; no call was made
    pub fn from_gate(platform: Platform, gate: CredentialGate) -> Self {
        Self::failed(gate.message(platform))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PlatformOutcome::Published { .. })
    }

    /// Column values this outcome writes
    pub fn fields(&self) -> PlatformFields {
        match self {
            PlatformOutcome::Published { post_id, posted_at } => PlatformFields {
                post_id: Some(post_id.clone()),
                posted_at: Some(*posted_at),
                error: None,
            },
            PlatformOutcome::Failed { error } => PlatformFields {
                post_id: None,
                posted_at: None,
                error: Some(error.clone()),
            },
        }
    }
}

/// Aggregated result of one dispatch attempt for one post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub twitter: Option<PlatformOutcome>,
    pub linkedin: Option<PlatformOutcome>,
}

impl DispatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, platform: Platform, outcome: PlatformOutcome) {
        match platform {
            Platform::Twitter => self.twitter = Some(outcome),
            Platform::LinkedIn => self.linkedin = Some(outcome),
        }
    }

    pub fn get(&self, platform: Platform) -> Option<&PlatformOutcome> {
        match platform {
            Platform::Twitter => self.twitter.as_ref(),
            Platform::LinkedIn => self.linkedin.as_ref(),
        }
    }

    pub fn succeeded(&self, platform: Platform) -> bool {
        self.get(platform).is_some_and(PlatformOutcome::is_success)
    }

    /// Terminal status for a post targeting `target`
    ///
    /// A requested platform with no recorded outcome counts as a failure.
    pub fn final_status(&self, target: TargetPlatform) -> PostStatus {
        let published = match target {
            TargetPlatform::Twitter => self.succeeded(Platform::Twitter),
            TargetPlatform::LinkedIn => self.succeeded(Platform::LinkedIn),
            TargetPlatform::Both => {
                self.succeeded(Platform::Twitter) || self.succeeded(Platform::LinkedIn)
            }
        };

        if published {
            PostStatus::Posted
        } else {
            PostStatus::Failed
        }
    }

    /// Platforms that were attempted and failed, with their errors
    pub fn failures(&self) -> Vec<(Platform, &str)> {
        Platform::ALL
            .iter()
            .filter_map(|platform| match self.get(*platform) {
                Some(PlatformOutcome::Failed { error }) => Some((*platform, error.as_str())),
                _ => None,
            })
            .collect()
    }
}
