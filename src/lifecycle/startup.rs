//! Startup provisioning.
//!
//! # Responsibilities
//! - Derive the attacker identity from the configured secret
//! - Open the event log (with persistence when configured)
//! - Build the per-chain client table
//!
//! Any failure here is fatal; nothing is retried.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use thiserror::Error;

use crate::blockchain::{AttackerIdentity, BlockchainError, ChainClientFactory};
use crate::config::{ConfigError, DrillConfig};
use crate::events::{EventKind, EventLog};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Chain client setup failed: {0}")]
    Blockchain(#[from] BlockchainError),

    #[error("Cannot open event log file: {0}")]
    EventLog(#[from] std::io::Error),
}

/// Everything a session needs, built once per process.
pub struct Provisioned {
    pub identity: Arc<AttackerIdentity>,
    pub factory: Arc<ChainClientFactory>,
    pub events: EventLog,
}

/// Read the attacker secret named by the configuration.
pub fn load_identity(config: &DrillConfig) -> Result<Arc<AttackerIdentity>, ConfigError> {
    AttackerIdentity::from_env(&config.attacker.secret_env)
        .map(Arc::new)
        .map_err(|e| ConfigError::Secret(e.to_string()))
}

pub fn open_event_log(config: &DrillConfig) -> std::io::Result<EventLog> {
    match &config.events.persist_path {
        Some(path) => EventLog::with_persistence(config.events.capacity, Path::new(path)),
        None => Ok(EventLog::new(config.events.capacity)),
    }
}

pub fn build_factory(
    config: &DrillConfig,
    identity: Arc<AttackerIdentity>,
) -> Result<ChainClientFactory, BlockchainError> {
    ChainClientFactory::new(
        config.chains.clone(),
        identity,
        Duration::from_secs(config.drain.rpc_timeout_secs),
        Duration::from_millis(config.approval.poll_interval_ms),
    )
}

/// Provision identity, event log and clients in that order.
pub fn provision(config: &DrillConfig) -> Result<Provisioned, StartupError> {
    let identity = load_identity(config)?;
    let events = open_event_log(config)?;

    events.append(
        EventKind::AttackerIdentityDerived,
        "Malicious wallet ready",
        Some(json!({ "address": identity.address() })),
    );

    let factory = build_factory(config, identity.clone())?;

    tracing::info!(
        attacker = %identity.address(),
        chains = config.chains.len(),
        "Startup complete"
    );

    Ok(Provisioned {
        identity,
        factory: Arc::new(factory),
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_is_config_error() {
        let mut config = DrillConfig::default();
        config.attacker.secret_env = "DRAIN_DRILL_TEST_SECRET_THAT_IS_NEVER_SET".to_string();

        let err = provision(&config).err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Secret(_))));
    }

    #[test]
    fn test_in_memory_event_log_uses_capacity() {
        let mut config = DrillConfig::default();
        config.events.capacity = 7;
        let log = open_event_log(&config).unwrap();
        assert_eq!(log.capacity(), 7);
    }
}
