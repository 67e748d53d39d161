//! Application State
//!
//! [`AppState`] holds shared references to the service collaborators. Every
//! handler depends only on the trait objects, never a concrete backend, so
//! the same routes serve any storage implementation that passes the
//! conformance suite.

use std::sync::Arc;

use vigil_core::{CheckService, LabelService, MemoryStore};

use crate::core::Config;

/// Shared handler state; `Arc` fields make cloning cheap.
///
/// Organization validation and `org`-name resolution happen inside the check
/// service, so the handlers only need the check and label contracts.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (immutable after startup)
    pub config: Config,
    /// Check service contract
    pub checks: Arc<dyn CheckService>,
    /// Label decoration for single-check responses
    pub labels: Arc<dyn LabelService>,
}

impl AppState {
    pub fn new(config: Config, checks: Arc<dyn CheckService>, labels: Arc<dyn LabelService>) -> Self {
        Self {
            config,
            checks,
            labels,
        }
    }

    /// Wire up the default in-memory backend behind both contracts.
    pub fn initialize(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        tracing::info!(environment = %config.environment, "state initialized (memory backend)");
        Self::new(config.clone(), store.clone(), store)
    }
}
