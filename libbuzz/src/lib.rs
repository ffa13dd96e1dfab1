//! Buzzalicious - scheduled publishing to Twitter and LinkedIn
//!
//! This library holds the scheduled post store, the platform publishers and
//! the dispatcher that drives due posts to a terminal status.

pub mod config;
pub mod credentials;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod handshake;
pub mod logging;
pub mod outcome;
pub mod platforms;
pub mod scheduling;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{CredentialGate, CredentialResolver, StoreCredentialResolver};
pub use db::Database;
pub use dispatcher::{Dispatcher, TickReport};
pub use error::{BuzzError, Result};
pub use handshake::HandshakeStore;
pub use outcome::{DispatchOutcome, PlatformOutcome};
pub use platforms::{Publisher, Publishers};
pub use service::BuzzService;
pub use types::{Credential, Platform, PostStatus, ScheduledPost, TargetPlatform, User};
