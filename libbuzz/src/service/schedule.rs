//! Schedule service: create, inspect, cancel and reschedule posts
//!
//! This is the surface the request/response layer calls. Every rejection
//! happens before anything is written.

use std::sync::Arc;

use chrono::Utc;

use super::validation::{ValidationRequest, ValidationService};
use crate::types::{NewScheduledPost, PostStatus, ScheduledPost, TargetPlatform};
use crate::{BuzzError, Database, Result};

/// Request to schedule a post
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Owning user id
    pub owner: String,
    pub content: String,
    /// "twitter", "linkedin" or "both"
    pub platform: String,
    /// Unix seconds; must be in the future
    pub scheduled_for: i64,
    pub generation_id: Option<String>,
}

pub struct ScheduleService {
    db: Arc<Database>,
    validation: ValidationService,
}

impl ScheduleService {
    pub fn new(db: Arc<Database>, validation: ValidationService) -> Self {
        Self { db, validation }
    }

    /// Validate and store a new pending post
    ///
    /// # Errors
    ///
    /// `InvalidInput` for blank or oversized content, an unknown platform,
    /// content over a target platform's limit, or a time that is not in the
    /// future. No row is written in any of these cases.
    pub async fn schedule(&self, request: ScheduleRequest) -> Result<ScheduledPost> {
        self.schedule_at(request, Utc::now().timestamp()).await
    }

    /// [`ScheduleService::schedule`] with an explicit clock
    pub async fn schedule_at(&self, request: ScheduleRequest, now: i64) -> Result<ScheduledPost> {
        let target: TargetPlatform = request.platform.parse()?;

        let validation = self.validation.validate(&ValidationRequest {
            content: request.content.clone(),
            target,
        });
        if !validation.valid {
            return Err(BuzzError::InvalidInput(validation.error_messages().join("; ")));
        }

        if request.scheduled_for <= now {
            return Err(BuzzError::InvalidInput(
                "Scheduled time must be in the future".to_string(),
            ));
        }

        let post = self
            .db
            .create_scheduled_post(&NewScheduledPost {
                user_id: request.owner,
                content: request.content,
                platform: target,
                scheduled_for: request.scheduled_for,
                generation_id: request.generation_id,
            })
            .await?;

        tracing::info!(
            post_id = %post.id,
            platform = %post.platform,
            scheduled_for = post.scheduled_for,
            "scheduled post"
        );
        Ok(post)
    }

    pub async fn list(&self, owner: &str, status: Option<PostStatus>) -> Result<Vec<ScheduledPost>> {
        self.db.list_by_owner(owner, status).await
    }

    /// Fetch one of `owner`'s posts; `NotFound` otherwise
    pub async fn get(&self, owner: &str, post_id: &str) -> Result<ScheduledPost> {
        self.db
            .find_by_id(post_id, owner)
            .await?
            .ok_or_else(|| BuzzError::NotFound(format!("Post not found: {}", post_id)))
    }

    /// Cancel a pending post
    pub async fn cancel(&self, owner: &str, post_id: &str) -> Result<ScheduledPost> {
        let post = self.db.cancel(post_id, owner).await?;
        tracing::info!(post_id = %post.id, "cancelled post");
        Ok(post)
    }

    /// Move a pending post to a new future time
    pub async fn reschedule(
        &self,
        owner: &str,
        post_id: &str,
        scheduled_for: i64,
    ) -> Result<ScheduledPost> {
        let post = self
            .db
            .reschedule(post_id, owner, scheduled_for, Utc::now().timestamp())
            .await?;
        tracing::info!(post_id = %post.id, scheduled_for, "rescheduled post");
        Ok(post)
    }
}
