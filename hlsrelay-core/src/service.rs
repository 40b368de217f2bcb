//! Relay service
//!
//! Glue between the persisted configuration and the supervisor. The HTTP
//! layer and the binary talk to this type only.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::models::{RelayConfig, RelayProfile};
use crate::store::ConfigStore;
use crate::supervisor::{RelayStatus, RelaySupervisor};
use crate::Result;

pub struct RelayService {
    store: ConfigStore,
    supervisor: Arc<RelaySupervisor>,
    /// Serialises save+restart so the persisted and running config agree
    apply_lock: Mutex<()>,
}

impl RelayService {
    pub fn new(store: ConfigStore, supervisor: Arc<RelaySupervisor>) -> Self {
        Self {
            store,
            supervisor,
            apply_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn supervisor(&self) -> &Arc<RelaySupervisor> {
        &self.supervisor
    }

    /// Currently persisted configuration
    pub async fn config(&self) -> Result<RelayConfig> {
        self.store.load().await
    }

    /// Validate, persist and restart the relay with `cfg`.
    ///
    /// Invalid configurations are rejected before anything is written.
    pub async fn apply(&self, cfg: RelayConfig) -> Result<RelayConfig> {
        cfg.validate()?;

        let _guard = self.apply_lock.lock().await;
        self.store.save(&cfg).await?;
        info!(path = %self.store.path().display(), "Saved relay configuration");

        self.supervisor.start(&cfg).await;
        Ok(cfg)
    }

    /// Start (or restart) the relay with the persisted configuration.
    pub async fn start_persisted(&self) -> Result<()> {
        let _guard = self.apply_lock.lock().await;
        let cfg = self.store.load().await?;
        self.supervisor.start(&cfg).await;
        Ok(())
    }

    pub async fn stop(&self) {
        self.supervisor.stop().await;
    }

    pub async fn status(&self) -> RelayStatus {
        self.supervisor.status().await
    }

    /// Stop the relay before the process exits.
    pub async fn shutdown(&self) {
        info!("Stopping relay for shutdown");
        self.supervisor.stop().await;
    }
}
