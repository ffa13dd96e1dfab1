//! Credential lookup with the expiry gate applied
//!
//! The dispatcher never reads tokens from the store directly. It asks a
//! [`CredentialResolver`], which either hands back a usable [`Credential`]
//! or explains why the platform must be skipped.

use std::sync::Arc;

use async_trait::async_trait;

use crate::db::Database;
use crate::error::Result;
use crate::types::{Credential, Platform};

/// Why a credential cannot be used for publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialGate {
    /// No credential stored, or an empty token
    Missing,
    /// `expires_at` has been reached
    Expired,
}

impl CredentialGate {
    /// Per-platform error text recorded on the post
    pub fn message(&self, platform: Platform) -> String {
        match self {
            CredentialGate::Missing => format!("{} not authorized", platform),
            CredentialGate::Expired => format!("{} token expired", platform),
        }
    }
}

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve `owner`'s credential for `platform` as of `now`
    ///
    /// The outer `Result` carries store failures; the inner one carries the
    /// gate decision.
    async fn resolve(
        &self,
        owner: &str,
        platform: Platform,
        now: i64,
    ) -> Result<std::result::Result<Credential, CredentialGate>>;
}

/// Resolver backed by the `platform_credentials` table
pub struct StoreCredentialResolver {
    db: Arc<Database>,
}

impl StoreCredentialResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

/// Apply the gate to a stored credential
pub fn gate(
    credential: Option<Credential>,
    now: i64,
) -> std::result::Result<Credential, CredentialGate> {
    match credential {
        None => Err(CredentialGate::Missing),
        Some(credential) if credential.token().trim().is_empty() => Err(CredentialGate::Missing),
        Some(credential) if credential.is_expired(now) => Err(CredentialGate::Expired),
        Some(credential) => Ok(credential),
    }
}

#[async_trait]
impl CredentialResolver for StoreCredentialResolver {
    async fn resolve(
        &self,
        owner: &str,
        platform: Platform,
        now: i64,
    ) -> Result<std::result::Result<Credential, CredentialGate>> {
        let stored = self.db.get_credential(owner, platform).await?;
        Ok(gate(stored, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gate_messages() {
        assert_eq!(
            CredentialGate::Missing.message(Platform::Twitter),
            "twitter not authorized"
        );
        assert_eq!(
            CredentialGate::Expired.message(Platform::LinkedIn),
            "linkedin token expired"
        );
    }

    #[test]
    fn test_gate_rules() {
        assert_eq!(gate(None, 100).unwrap_err(), CredentialGate::Missing);

        let blank = Credential::new(Platform::Twitter, "  ");
        assert_eq!(gate(Some(blank), 100).unwrap_err(), CredentialGate::Missing);

        let expired = Credential::new(Platform::Twitter, "t").with_expiry(100);
        assert_eq!(gate(Some(expired), 100).unwrap_err(), CredentialGate::Expired);

        let valid = Credential::new(Platform::Twitter, "t").with_expiry(101);
        assert!(gate(Some(valid), 100).is_ok());

        let no_expiry = Credential::new(Platform::Twitter, "t");
        assert!(gate(Some(no_expiry), 100).is_ok());
    }

    #[tokio::test]
    async fn test_store_resolver() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::new(db_path.to_str().unwrap()).await.unwrap());
        let user = db.ensure_user("owner@example.com").await.unwrap();

        db.upsert_credential(
            &user.id,
            &Credential::new(Platform::LinkedIn, "li").with_expiry(1_000),
        )
        .await
        .unwrap();

        let resolver = StoreCredentialResolver::new(db.clone());

        let twitter = resolver.resolve(&user.id, Platform::Twitter, 500).await.unwrap();
        assert_eq!(twitter.unwrap_err(), CredentialGate::Missing);

        let linkedin = resolver.resolve(&user.id, Platform::LinkedIn, 500).await.unwrap();
        assert_eq!(linkedin.unwrap().token(), "li");

        let later = resolver.resolve(&user.id, Platform::LinkedIn, 1_000).await.unwrap();
        assert_eq!(later.unwrap_err(), CredentialGate::Expired);
    }
}
