//! Service layer for Buzzalicious
//!
//! `BuzzService` is the single entry point the binaries use. It owns the
//! shared `Arc<Database>` and `Arc<Config>` and hands out the sub-services:
//!
//! - `ScheduleService`: create, list, show, cancel and reschedule posts
//! - `ValidationService`: content checks against platform limits
//!
//! and builds the [`Dispatcher`] for the daemon.
//!
//! # Example
//!
//! ```no_run
//! use libbuzz::service::BuzzService;
//!
//! # async fn example() -> libbuzz::Result<()> {
//! let service = BuzzService::new().await?;
//! let user = service.database().ensure_user("me@example.com").await?;
//! let queued = service.schedule().list(&user.id, None).await?;
//! println!("{} post(s) queued", queued.len());
//! # Ok(())
//! # }
//! ```

pub mod schedule;
pub mod validation;

use std::sync::Arc;

use self::schedule::ScheduleService;
use self::validation::ValidationService;
use crate::credentials::StoreCredentialResolver;
use crate::dispatcher::Dispatcher;
use crate::platforms::Publishers;
use crate::{Config, Database, Result};

pub struct BuzzService {
    db: Arc<Database>,
    config: Arc<Config>,
    schedule: ScheduleService,
    validation: ValidationService,
}

impl BuzzService {
    /// Load configuration from the default location and open the database
    pub async fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config).await
    }

    /// Build the service from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn from_config(config: Config) -> Result<Self> {
        let db = Arc::new(Database::new(&config.database_path()).await?);
        let config = Arc::new(config);

        let validation = ValidationService::new();
        let schedule = ScheduleService::new(Arc::clone(&db), validation.clone());

        Ok(Self {
            db,
            config,
            schedule,
            validation,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn schedule(&self) -> &ScheduleService {
        &self.schedule
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// Dispatcher wired to the store, stored credentials and the real
    /// platform APIs
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher_with(Publishers::from_config(&self.config))
    }

    /// Dispatcher with caller-supplied publishers
    pub fn dispatcher_with(&self, publishers: Publishers) -> Dispatcher {
        Dispatcher::new(
            Arc::clone(&self.db),
            Arc::new(StoreCredentialResolver::new(Arc::clone(&self.db))),
            publishers,
            self.config.dispatch.clone(),
        )
    }
}
