//! Session builder

use std::path::Path;
use std::sync::Arc;

use recmap_concurrency::TransactionManager;
use recmap_core::{Clock, Result, StoreClient, SystemClock};
use recmap_mapper::EntityMapper;
use tracing::debug;

use super::config::SessionConfig;
use super::Session;

// ============================================================================
// Session Builder Pattern
// ============================================================================

/// Builder for `Session`
///
/// ```ignore
/// use recmap_engine::{Session, SessionConfig};
///
/// // Defaults: namespace "test", 5 retries, system clock
/// let session = Session::builder(store.clone()).build()?;
///
/// // From a config file with an injected clock
/// let session = Session::builder(store)
///     .config(SessionConfig::from_file(path)?)
///     .clock(clock)
///     .build()?;
/// ```
pub struct SessionBuilder {
    store: Arc<dyn StoreClient>,
    config: SessionConfig,
    clock: Option<Arc<dyn Clock>>,
}

impl SessionBuilder {
    /// Create new builder with defaults
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            store,
            config: SessionConfig::default(),
            clock: None,
        }
    }

    /// Use `config`
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the config from `path`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed.
    pub fn config_file(self, path: &Path) -> Result<Self> {
        let config = SessionConfig::from_file(path)?;
        Ok(self.config(config))
    }

    /// Override the default namespace
    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.default_namespace = namespace.into();
        self
    }

    /// Resolve expirations against `clock` instead of the system clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the session
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build(self) -> Result<Session> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let mapper = EntityMapper::new(clock);
        let transactions = TransactionManager::new(Arc::clone(&self.store), mapper.clone())
            .with_retry_config(self.config.retry_config())
            .with_default_namespace(self.config.default_namespace.as_str());

        debug!(
            target: "recmap::session",
            namespace = %self.config.default_namespace,
            max_retries = self.config.max_retries,
            "Session opened"
        );

        Ok(Session {
            store: self.store,
            mapper,
            config: self.config,
            transactions,
        })
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("custom_clock", &self.clock.is_some())
            .finish()
    }
}
