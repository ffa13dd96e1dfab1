//! Database operations for Buzzalicious
//!
//! Every status transition is a conditional `UPDATE` on the current status,
//! so concurrent dispatchers and user requests cannot both win the same row.

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::error::{BuzzError, DbError, Result};
use crate::outcome::DispatchOutcome;
use crate::types::{
    Credential, CredentialSummary, NewScheduledPost, Platform, PlatformFields, PostStatus,
    ScheduledPost, TargetPlatform, User,
};

/// Error written to requested platforms of a post whose claim went stale
pub const INTERRUPTED_ERROR: &str = "dispatch interrupted";

const POST_COLUMNS: &str = r#"
    id, user_id, content, platform, scheduled_for, status,
    twitter_post_id, twitter_posted_at, twitter_error,
    linkedin_post_id, linkedin_posted_at, linkedin_error,
    generation_id, claimed_at, created_at, updated_at
"#;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database and run migrations
    pub async fn new(db_path: &str) -> Result<Self> {
        let expanded_path = shellexpand::tilde(db_path).to_string();
        let path = Path::new(&expanded_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(DbError::IoError)?;
            }
        }

        // mode=rwc creates the file if it doesn't exist
        let db_url = format!("sqlite://{}?mode=rwc", expanded_path.replace('\\', "/"));

        let pool = SqlitePool::connect(&db_url)
            .await
            .map_err(DbError::SqlxError)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DbError::MigrationError)?;

        Ok(Self { pool })
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Return the user with `email`, creating it if needed
    pub async fn ensure_user(&self, email: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(BuzzError::InvalidInput("User email cannot be empty".to_string()));
        }

        let user = User::new(email.clone());
        sqlx::query(
            r#"
            INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)
            ON CONFLICT(email) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        self.find_user_by_email(&email)
            .await?
            .ok_or_else(|| BuzzError::NotFound(format!("user {}", email)))
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, created_at FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            email: r.get("email"),
            created_at: r.get("created_at"),
        }))
    }

    /// Delete a user together with its posts and credentials
    pub async fn delete_user(&self, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------
    // Credentials
    // ------------------------------------------------------------------

    /// Store or replace a user's credential for one platform
    pub async fn upsert_credential(&self, user_id: &str, credential: &Credential) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO platform_credentials
                (user_id, platform, access_token, account_id, expires_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, platform) DO UPDATE SET
                access_token = excluded.access_token,
                account_id = excluded.account_id,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(credential.platform.as_str())
        .bind(credential.token())
        .bind(&credential.account_id)
        .bind(credential.expires_at)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(())
    }

    pub async fn get_credential(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<Credential>> {
        let row = sqlx::query(
            r#"
            SELECT access_token, account_id, expires_at
            FROM platform_credentials WHERE user_id = ? AND platform = ?
            "#,
        )
        .bind(user_id)
        .bind(platform.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(row.map(|r| Credential {
            platform,
            access_token: r.get::<String, _>("access_token").into(),
            account_id: r.get("account_id"),
            expires_at: r.get("expires_at"),
        }))
    }

    pub async fn delete_credential(&self, user_id: &str, platform: Platform) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM platform_credentials WHERE user_id = ? AND platform = ?")
                .bind(user_id)
                .bind(platform.as_str())
                .execute(&self.pool)
                .await
                .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_credentials(&self, user_id: &str) -> Result<Vec<CredentialSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT platform, account_id, expires_at, updated_at
            FROM platform_credentials WHERE user_id = ? ORDER BY platform
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        rows.iter()
            .map(|r| -> Result<CredentialSummary> {
                let platform: String = r.get("platform");
                Ok(CredentialSummary {
                    platform: platform.parse::<Platform>().map_err(|_| DbError::CorruptRow {
                        id: user_id.to_string(),
                        reason: format!("unknown platform '{}'", platform),
                    })?,
                    account_id: r.get("account_id"),
                    expires_at: r.get("expires_at"),
                    updated_at: r.get("updated_at"),
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Scheduled posts
    // ------------------------------------------------------------------

    /// Insert a new pending post
    pub async fn create_scheduled_post(&self, new_post: &NewScheduledPost) -> Result<ScheduledPost> {
        let now = chrono::Utc::now().timestamp();
        let post = ScheduledPost {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new_post.user_id.clone(),
            content: new_post.content.clone(),
            platform: new_post.platform,
            scheduled_for: new_post.scheduled_for,
            status: PostStatus::Pending,
            twitter: PlatformFields::default(),
            linkedin: PlatformFields::default(),
            generation_id: new_post.generation_id.clone(),
            claimed_at: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO scheduled_posts
                (id, user_id, content, platform, scheduled_for, status,
                 generation_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.user_id)
        .bind(&post.content)
        .bind(post.platform.as_str())
        .bind(post.scheduled_for)
        .bind(&post.generation_id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(post)
    }

    /// Pending posts with `scheduled_for <= now`, oldest first
    pub async fn find_due(&self, now: i64) -> Result<Vec<ScheduledPost>> {
        let query = format!(
            "SELECT {} FROM scheduled_posts
             WHERE status = 'pending' AND scheduled_for <= ?
             ORDER BY scheduled_for, created_at",
            POST_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    /// Move a post from `pending` to `publishing`
    ///
    /// Returns `false` when the post is no longer pending (cancelled, or
    /// claimed by someone else).
    pub async fn claim(&self, post_id: &str, now: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts
            SET status = 'publishing', claimed_at = ?, updated_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Write the aggregated outcome of a claimed post
    ///
    /// Only platforms present in `outcome` have their columns written. Returns
    /// `false` if the post is gone or no longer `publishing`.
    pub async fn update_outcome(
        &self,
        post_id: &str,
        outcome: &DispatchOutcome,
        status: PostStatus,
        now: i64,
    ) -> Result<bool> {
        let twitter = outcome.twitter.as_ref().map(|o| o.fields());
        let linkedin = outcome.linkedin.as_ref().map(|o| o.fields());

        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts SET
                status = ?,
                updated_at = ?,
                twitter_post_id    = CASE WHEN ? THEN ? ELSE twitter_post_id END,
                twitter_posted_at  = CASE WHEN ? THEN ? ELSE twitter_posted_at END,
                twitter_error      = CASE WHEN ? THEN ? ELSE twitter_error END,
                linkedin_post_id   = CASE WHEN ? THEN ? ELSE linkedin_post_id END,
                linkedin_posted_at = CASE WHEN ? THEN ? ELSE linkedin_posted_at END,
                linkedin_error     = CASE WHEN ? THEN ? ELSE linkedin_error END
            WHERE id = ? AND status = 'publishing'
            "#,
        )
        .bind(status.as_str())
        .bind(now)
        .bind(twitter.is_some())
        .bind(twitter.as_ref().and_then(|f| f.post_id.clone()))
        .bind(twitter.is_some())
        .bind(twitter.as_ref().and_then(|f| f.posted_at))
        .bind(twitter.is_some())
        .bind(twitter.as_ref().and_then(|f| f.error.clone()))
        .bind(linkedin.is_some())
        .bind(linkedin.as_ref().and_then(|f| f.post_id.clone()))
        .bind(linkedin.is_some())
        .bind(linkedin.as_ref().and_then(|f| f.posted_at))
        .bind(linkedin.is_some())
        .bind(linkedin.as_ref().and_then(|f| f.error.clone()))
        .bind(post_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected() == 1)
    }

    /// Fail posts stuck in `publishing` since before `cutoff`
    ///
    /// Requested platforms with no recorded outcome get [`INTERRUPTED_ERROR`].
    /// The posts are not retried, so nothing is published twice.
    pub async fn fail_stale_claims(&self, cutoff: i64, now: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts SET
                status = 'failed',
                updated_at = ?,
                twitter_error = CASE
                    WHEN platform IN ('twitter', 'both')
                         AND twitter_post_id IS NULL AND twitter_error IS NULL
                    THEN ? ELSE twitter_error END,
                linkedin_error = CASE
                    WHEN platform IN ('linkedin', 'both')
                         AND linkedin_post_id IS NULL AND linkedin_error IS NULL
                    THEN ? ELSE linkedin_error END
            WHERE status = 'publishing' AND claimed_at <= ?
            "#,
        )
        .bind(now)
        .bind(INTERRUPTED_ERROR)
        .bind(INTERRUPTED_ERROR)
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        Ok(result.rows_affected())
    }

    /// Fetch a post regardless of owner
    pub async fn get_post(&self, post_id: &str) -> Result<Option<ScheduledPost>> {
        let query = format!("SELECT {} FROM scheduled_posts WHERE id = ?", POST_COLUMNS);

        let row = sqlx::query(&query)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_post).transpose()
    }

    /// Fetch a post owned by `user_id`
    pub async fn find_by_id(&self, post_id: &str, user_id: &str) -> Result<Option<ScheduledPost>> {
        let query = format!(
            "SELECT {} FROM scheduled_posts WHERE id = ? AND user_id = ?",
            POST_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(post_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::SqlxError)?;

        row.as_ref().map(row_to_post).transpose()
    }

    /// List a user's posts, soonest first, optionally filtered by status
    pub async fn list_by_owner(
        &self,
        user_id: &str,
        status: Option<PostStatus>,
    ) -> Result<Vec<ScheduledPost>> {
        let rows = match status {
            Some(status) => {
                let query = format!(
                    "SELECT {} FROM scheduled_posts WHERE user_id = ? AND status = ?
                     ORDER BY scheduled_for, created_at",
                    POST_COLUMNS
                );
                sqlx::query(&query)
                    .bind(user_id)
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {} FROM scheduled_posts WHERE user_id = ?
                     ORDER BY scheduled_for, created_at",
                    POST_COLUMNS
                );
                sqlx::query(&query)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(DbError::SqlxError)?;

        rows.iter().map(row_to_post).collect()
    }

    /// Cancel a pending post
    ///
    /// Fails with `NotFound` for unknown ids (or another user's post) and
    /// `InvalidState` for posts that have left `pending`.
    pub async fn cancel(&self, post_id: &str, user_id: &str) -> Result<ScheduledPost> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts SET status = 'cancelled', updated_at = ?
            WHERE id = ? AND user_id = ? AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        self.after_pending_update(post_id, user_id, result.rows_affected(), "cancelled")
            .await
    }

    /// Move a pending post to `scheduled_for`, which must be after `now`
    pub async fn reschedule(
        &self,
        post_id: &str,
        user_id: &str,
        scheduled_for: i64,
        now: i64,
    ) -> Result<ScheduledPost> {
        if scheduled_for <= now {
            return Err(BuzzError::InvalidInput(
                "Scheduled time must be in the future".to_string(),
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE scheduled_posts SET scheduled_for = ?, updated_at = ?
            WHERE id = ? AND user_id = ? AND status = 'pending'
            "#,
        )
        .bind(scheduled_for)
        .bind(now)
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(DbError::SqlxError)?;

        self.after_pending_update(post_id, user_id, result.rows_affected(), "rescheduled")
            .await
    }

    /// Shared tail of the pending-only updates: reload the row, or explain
    /// why nothing changed.
    async fn after_pending_update(
        &self,
        post_id: &str,
        user_id: &str,
        rows_affected: u64,
        action: &str,
    ) -> Result<ScheduledPost> {
        let post = self
            .find_by_id(post_id, user_id)
            .await?
            .ok_or_else(|| BuzzError::NotFound(format!("Post not found: {}", post_id)))?;

        if rows_affected == 0 {
            return Err(BuzzError::InvalidState(format!(
                "Post {} is {}; only pending posts can be {}",
                post_id, post.status, action
            )));
        }

        Ok(post)
    }
}

fn row_to_post(r: &SqliteRow) -> Result<ScheduledPost> {
    let id: String = r.get("id");
    let corrupt = |reason: String| DbError::CorruptRow {
        id: id.clone(),
        reason,
    };

    let platform: String = r.get("platform");
    let platform: TargetPlatform = platform
        .parse()
        .map_err(|_| corrupt(format!("unknown platform '{}'", platform)))?;

    let status: String = r.get("status");
    let status: PostStatus = status
        .parse()
        .map_err(|_| corrupt(format!("unknown status '{}'", status)))?;

    Ok(ScheduledPost {
        id: id.clone(),
        user_id: r.get("user_id"),
        content: r.get("content"),
        platform,
        scheduled_for: r.get("scheduled_for"),
        status,
        twitter: PlatformFields {
            post_id: r.get("twitter_post_id"),
            posted_at: r.get("twitter_posted_at"),
            error: r.get("twitter_error"),
        },
        linkedin: PlatformFields {
            post_id: r.get("linkedin_post_id"),
            posted_at: r.get("linkedin_posted_at"),
            error: r.get("linkedin_error"),
        },
        generation_id: r.get("generation_id"),
        claimed_at: r.get("claimed_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::PlatformOutcome;
    use tempfile::TempDir;

    async fn setup() -> (Database, User, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
        let user = db.ensure_user("owner@example.com").await.unwrap();
        (db, user, temp_dir)
    }

    async fn create(db: &Database, user: &User, platform: TargetPlatform, at: i64) -> ScheduledPost {
        db.create_scheduled_post(&NewScheduledPost {
            user_id: user.id.clone(),
            content: "Hello".to_string(),
            platform,
            scheduled_for: at,
            generation_id: None,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_database_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("dir").join("buzz.db");
        let db = Database::new(db_path.to_str().unwrap()).await;
        assert!(db.is_ok());
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent_and_case_insensitive() {
        let (db, user, _temp_dir) = setup().await;
        let again = db.ensure_user("  Owner@Example.com ").await.unwrap();
        assert_eq!(again.id, user.id);

        let empty = db.ensure_user("   ").await;
        assert!(matches!(empty, Err(BuzzError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_and_find_post() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Both, 2_000_000_000).await;

        let found = db.find_by_id(&post.id, &user.id).await.unwrap().unwrap();
        assert_eq!(found, post);
        assert_eq!(found.status, PostStatus::Pending);
        assert!(found.twitter.is_empty());
        assert!(found.linkedin.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_respects_owner() {
        let (db, user, _temp_dir) = setup().await;
        let other = db.ensure_user("other@example.com").await.unwrap();
        let post = create(&db, &user, TargetPlatform::Twitter, 2_000_000_000).await;

        assert!(db.find_by_id(&post.id, &other.id).await.unwrap().is_none());
        assert!(db.get_post(&post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_due_only_returns_pending_past_posts() {
        let (db, user, _temp_dir) = setup().await;
        let due = create(&db, &user, TargetPlatform::Twitter, 100).await;
        let exact = create(&db, &user, TargetPlatform::Twitter, 200).await;
        let _future = create(&db, &user, TargetPlatform::Twitter, 300).await;
        let cancelled = create(&db, &user, TargetPlatform::Twitter, 50).await;
        db.cancel(&cancelled.id, &user.id).await.unwrap();

        let found: Vec<String> = db.find_due(200).await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(found, vec![due.id, exact.id]);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 100).await;

        assert!(db.claim(&post.id, 150).await.unwrap());
        assert!(!db.claim(&post.id, 151).await.unwrap());

        let claimed = db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(claimed.status, PostStatus::Publishing);
        assert_eq!(claimed.claimed_at, Some(150));
        assert!(db.find_due(200).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_outcome_writes_only_requested_platforms() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 100).await;
        db.claim(&post.id, 150).await.unwrap();

        let mut outcome = DispatchOutcome::new();
        outcome.record(Platform::Twitter, PlatformOutcome::published("123", 160));
        assert!(db
            .update_outcome(&post.id, &outcome, PostStatus::Posted, 160)
            .await
            .unwrap());

        let stored = db.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Posted);
        assert_eq!(stored.twitter.post_id.as_deref(), Some("123"));
        assert_eq!(stored.twitter.posted_at, Some(160));
        assert!(stored.twitter.error.is_none());
        assert!(stored.linkedin.is_empty());
        assert_eq!(stored.updated_at, 160);
    }

    #[tokio::test]
    async fn test_update_outcome_requires_claim() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 100).await;

        let mut outcome = DispatchOutcome::new();
        outcome.record(Platform::Twitter, PlatformOutcome::failed("boom"));
        let written = db
            .update_outcome(&post.id, &outcome, PostStatus::Failed, 160)
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(
            db.get_post(&post.id).await.unwrap().unwrap().status,
            PostStatus::Pending
        );

        let missing = db
            .update_outcome("no-such-post", &outcome, PostStatus::Failed, 160)
            .await
            .unwrap();
        assert!(!missing);
    }

    #[tokio::test]
    async fn test_cancel_pending_then_reject_second_cancel() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::LinkedIn, 2_000_000_000).await;

        let cancelled = db.cancel(&post.id, &user.id).await.unwrap();
        assert_eq!(cancelled.status, PostStatus::Cancelled);

        let again = db.cancel(&post.id, &user.id).await;
        assert!(matches!(again, Err(BuzzError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_cancel_claimed_post_is_rejected() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 100).await;
        db.claim(&post.id, 150).await.unwrap();

        let result = db.cancel(&post.id, &user.id).await;
        match result {
            Err(BuzzError::InvalidState(msg)) => assert!(msg.contains("publishing")),
            other => panic!("Expected InvalidState, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancel_unknown_post_is_not_found() {
        let (db, user, _temp_dir) = setup().await;
        let result = db.cancel("missing", &user.id).await;
        assert!(matches!(result, Err(BuzzError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reschedule_rules() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 1_000).await;

        let past = db.reschedule(&post.id, &user.id, 400, 500).await;
        assert!(matches!(past, Err(BuzzError::InvalidInput(_))));

        let moved = db.reschedule(&post.id, &user.id, 5_000, 500).await.unwrap();
        assert_eq!(moved.scheduled_for, 5_000);

        db.cancel(&post.id, &user.id).await.unwrap();
        let after_cancel = db.reschedule(&post.id, &user.id, 6_000, 500).await;
        assert!(matches!(after_cancel, Err(BuzzError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_with_status_filter() {
        let (db, user, _temp_dir) = setup().await;
        let other = db.ensure_user("other@example.com").await.unwrap();
        let first = create(&db, &user, TargetPlatform::Twitter, 3_000_000_000).await;
        let second = create(&db, &user, TargetPlatform::Both, 2_000_000_000).await;
        create(&db, &other, TargetPlatform::Twitter, 2_000_000_000).await;
        db.cancel(&first.id, &user.id).await.unwrap();

        let all = db.list_by_owner(&user.id, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id, "soonest first");

        let pending = db.list_by_owner(&user.id, Some(PostStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        let cancelled = db
            .list_by_owner(&user.id, Some(PostStatus::Cancelled))
            .await
            .unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, first.id);
    }

    #[tokio::test]
    async fn test_fail_stale_claims() {
        let (db, user, _temp_dir) = setup().await;
        let stale = create(&db, &user, TargetPlatform::Both, 100).await;
        let fresh = create(&db, &user, TargetPlatform::Twitter, 100).await;
        db.claim(&stale.id, 100).await.unwrap();
        db.claim(&fresh.id, 1_000).await.unwrap();

        let recovered = db.fail_stale_claims(500, 1_100).await.unwrap();
        assert_eq!(recovered, 1);

        let stale = db.get_post(&stale.id).await.unwrap().unwrap();
        assert_eq!(stale.status, PostStatus::Failed);
        assert_eq!(stale.twitter.error.as_deref(), Some(INTERRUPTED_ERROR));
        assert_eq!(stale.linkedin.error.as_deref(), Some(INTERRUPTED_ERROR));

        let fresh = db.get_post(&fresh.id).await.unwrap().unwrap();
        assert_eq!(fresh.status, PostStatus::Publishing);
    }

    #[tokio::test]
    async fn test_credentials_round_trip() {
        let (db, user, _temp_dir) = setup().await;
        assert!(db.get_credential(&user.id, Platform::Twitter).await.unwrap().is_none());

        let credential = Credential::new(Platform::LinkedIn, "li-token")
            .with_account_id("abc123")
            .with_expiry(2_000_000_000);
        db.upsert_credential(&user.id, &credential).await.unwrap();

        let stored = db
            .get_credential(&user.id, Platform::LinkedIn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.token(), "li-token");
        assert_eq!(stored.account_id.as_deref(), Some("abc123"));
        assert_eq!(stored.expires_at, Some(2_000_000_000));

        db.upsert_credential(&user.id, &Credential::new(Platform::LinkedIn, "rotated"))
            .await
            .unwrap();
        let rotated = db
            .get_credential(&user.id, Platform::LinkedIn)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rotated.token(), "rotated");
        assert!(rotated.expires_at.is_none());

        let summaries = db.list_credentials(&user.id).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].platform, Platform::LinkedIn);

        assert!(db.delete_credential(&user.id, Platform::LinkedIn).await.unwrap());
        assert!(!db.delete_credential(&user.id, Platform::LinkedIn).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (db, user, _temp_dir) = setup().await;
        let post = create(&db, &user, TargetPlatform::Twitter, 2_000_000_000).await;
        db.upsert_credential(&user.id, &Credential::new(Platform::Twitter, "t"))
            .await
            .unwrap();

        assert!(db.delete_user(&user.id).await.unwrap());
        assert!(db.get_post(&post.id).await.unwrap().is_none());
        assert!(db.get_credential(&user.id, Platform::Twitter).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_post_for_unknown_user_fails() {
        let (db, _user, _temp_dir) = setup().await;
        let result = db
            .create_scheduled_post(&NewScheduledPost {
                user_id: "ghost".to_string(),
                content: "Hello".to_string(),
                platform: TargetPlatform::Twitter,
                scheduled_for: 2_000_000_000,
                generation_id: None,
            })
            .await;
        assert!(matches!(result, Err(BuzzError::Database(_))));
    }
}
