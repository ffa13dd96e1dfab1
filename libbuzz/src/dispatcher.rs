//! Dispatch loop
//!
//! Each tick:
//! 1. fails posts whose claim went stale (a dispatcher died mid-publish),
//! 2. loads every due post,
//! 3. claims each one (`pending` → `publishing`) before any outbound call,
//! 4. publishes to each requested platform in order, bounded by the
//!    publish timeout,
//! 5. writes the aggregated outcome once.
//!
//! Nothing inside a tick is fatal. Store errors are logged and counted in the
//! [`TickReport`], and the remaining posts are still processed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::config::DispatchConfig;
use crate::credentials::CredentialResolver;
use crate::db::Database;
use crate::error::PlatformError;
use crate::outcome::{DispatchOutcome, PlatformOutcome};
use crate::platforms::Publishers;
use crate::types::{Platform, PostStatus, ScheduledPost};

/// Counters for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Due posts found
    pub due: usize,
    /// Posts this tick claimed
    pub claimed: usize,
    pub posted: usize,
    pub failed: usize,
    /// Due posts that were gone from `pending` by claim time
    pub skipped: usize,
    pub store_errors: usize,
    /// Stale claims moved to `failed`
    pub recovered: u64,
}

enum PostResult {
    Skipped,
    Finished(PostStatus),
    StoreError { claimed: bool },
}

pub struct Dispatcher {
    db: Arc<Database>,
    resolver: Arc<dyn CredentialResolver>,
    publishers: Publishers,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        db: Arc<Database>,
        resolver: Arc<dyn CredentialResolver>,
        publishers: Publishers,
        config: DispatchConfig,
    ) -> Self {
        Self {
            db,
            resolver,
            publishers,
            config,
        }
    }

    /// Run one tick against the current clock
    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now().timestamp()).await
    }

    /// Run one tick as if the time were `now` (unix seconds)
    ///
    /// `now` selects due posts and gates credentials. Each claim is stamped
    /// with `now` plus the time the tick has been running.
    pub async fn tick_at(&self, now: i64) -> TickReport {
        let mut report = TickReport::default();
        let started = Instant::now();

        let cutoff = now.saturating_sub(self.config.stale_claim_after as i64);
        match self.db.fail_stale_claims(cutoff, now).await {
            Ok(0) => {}
            Ok(recovered) => {
                warn!(recovered, "failed posts left in publishing by an interrupted dispatch");
                report.recovered = recovered;
            }
            Err(e) => {
                error!(error = %e, "stale claim recovery failed");
                report.store_errors += 1;
            }
        }

        let due = match self.db.find_due(now).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "could not load due posts");
                report.store_errors += 1;
                return report;
            }
        };

        report.due = due.len();
        if due.is_empty() {
            debug!("no posts due");
            return report;
        }

        info!(due = report.due, "found post(s) due for publishing");

        let results: Vec<PostResult> = stream::iter(due)
            .map(|post| self.dispatch_post(post, now, started))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for result in results {
            match result {
                PostResult::Skipped => report.skipped += 1,
                PostResult::Finished(status) => {
                    report.claimed += 1;
                    if status == PostStatus::Posted {
                        report.posted += 1;
                    } else {
                        report.failed += 1;
                    }
                }
                PostResult::StoreError { claimed } => {
                    if claimed {
                        report.claimed += 1;
                    }
                    report.store_errors += 1;
                }
            }
        }

        info!(
            due = report.due,
            claimed = report.claimed,
            posted = report.posted,
            failed = report.failed,
            skipped = report.skipped,
            store_errors = report.store_errors,
            "tick complete"
        );
        report
    }

    /// Tick immediately, then every poll interval, until `shutdown` is set
    ///
    /// The flag is checked every second while waiting; a tick in progress
    /// always runs to completion.
    pub async fn run(&self, shutdown: Arc<AtomicBool>) {
        info!(
            poll_interval = self.config.poll_interval,
            concurrency = self.config.concurrency,
            "dispatch loop starting"
        );

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping dispatch loop");
                break;
            }

            self.tick().await;

            for _ in 0..self.config.poll_interval {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                sleep(Duration::from_secs(1)).await;
            }
        }
    }

    async fn dispatch_post(&self, post: ScheduledPost, now: i64, started: Instant) -> PostResult {
        let claimed_at = now.saturating_add(started.elapsed().as_secs() as i64);
        match self.db.claim(&post.id, claimed_at).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(post_id = %post.id, "post no longer pending, skipping");
                return PostResult::Skipped;
            }
            Err(e) => {
                error!(post_id = %post.id, error = %e, "claim failed");
                return PostResult::StoreError { claimed: false };
            }
        }

        let mut outcome = DispatchOutcome::new();
        for platform in post.platform.platforms() {
            let result = self.publish_one(&post, *platform, now).await;
            outcome.record(*platform, result);
        }

        let status = outcome.final_status(post.platform);
        for (platform, reason) in outcome.failures() {
            warn!(post_id = %post.id, platform = %platform, error = reason, "platform failed");
        }

        match self.db.update_outcome(&post.id, &outcome, status, now).await {
            Ok(true) => {
                info!(post_id = %post.id, status = %status, "dispatch finished");
                PostResult::Finished(status)
            }
            Ok(false) => {
                warn!(post_id = %post.id, "post vanished before its outcome was written");
                PostResult::StoreError { claimed: true }
            }
            Err(e) => {
                error!(post_id = %post.id, error = %e, "could not write dispatch outcome");
                PostResult::StoreError { claimed: true }
            }
        }
    }

    async fn publish_one(&self, post: &ScheduledPost, platform: Platform, now: i64) -> PlatformOutcome {
        let credential = match self.resolver.resolve(&post.user_id, platform, now).await {
            Ok(Ok(credential)) => credential,
            Ok(Err(gate)) => {
                debug!(post_id = %post.id, platform = %platform, ?gate, "credential gate closed");
                return PlatformOutcome::from_gate(platform, gate);
            }
            Err(e) => {
                error!(post_id = %post.id, platform = %platform, error = %e, "credential lookup failed");
                return PlatformOutcome::failed(format!("credential lookup failed: {}", e));
            }
        };

        let publisher = self.publishers.get(platform);
        let limit = self.config.publish_timeout();

        match timeout(limit, publisher.publish_text(&credential, &post.content)).await {
            Ok(Ok(platform_post_id)) => {
                info!(
                    post_id = %post.id,
                    platform = %platform,
                    platform_post_id = %platform_post_id,
                    "published"
                );
                PlatformOutcome::published(platform_post_id, now)
            }
            Ok(Err(e)) => PlatformOutcome::from_platform_error(&e),
            Err(_) => PlatformOutcome::from_platform_error(&PlatformError::Timeout(format!(
                "timed out after {}s",
                limit.as_secs()
            ))),
        }
    }
}
