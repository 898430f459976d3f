//! Shared, mutable configuration store
//!
//! A control surface edits the store while the pipeline side only ever
//! sees a snapshot taken at assembly time. Later edits never reach a
//! graph that is already built.

use crate::settings::PipelineConfig;
use std::sync::{Arc, PoisonError, RwLock};

/// Cloneable handle to a single `PipelineConfig`
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<PipelineConfig>>,
}

impl SharedConfig {
    /// Create a store holding `config`
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Mutate the stored configuration
    pub fn update<R>(&self, f: impl FnOnce(&mut PipelineConfig) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> PipelineConfig {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        tracing::trace!("Configuration snapshot taken");
        guard.clone()
    }
}
