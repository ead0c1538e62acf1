//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the drill.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Environment variable holding the attacker signing key by default.
pub const DEFAULT_SECRET_ENV: &str = "ATTACKER_PRIVATE_KEY";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DrillConfig {
    /// Attacker identity provisioning.
    pub attacker: AttackerConfig,

    /// Networks drained in order, first to last.
    pub chains: Vec<ChainNetwork>,

    /// External protection service endpoints.
    pub protection: ProtectionConfig,

    /// Orchestration pacing and RPC limits.
    pub drain: DrainConfig,

    /// Local approval confirmation watching.
    pub approval: ApprovalConfig,

    /// Event log retention.
    pub events: EventLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            attacker: AttackerConfig::default(),
            chains: default_chains(),
            protection: ProtectionConfig::default(),
            drain: DrainConfig::default(),
            approval: ApprovalConfig::default(),
            events: EventLogConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl DrillConfig {
    /// Look up a configured network by chain id.
    pub fn chain(&self, chain_id: u64) -> Option<&ChainNetwork> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }
}

/// Attacker identity configuration. The key itself never lives in the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AttackerConfig {
    /// Name of the environment variable carrying the hex private key.
    pub secret_env: String,
}

impl Default for AttackerConfig {
    fn default() -> Self {
        Self {
            secret_env: DEFAULT_SECRET_ENV.to_string(),
        }
    }
}

/// A network the drill targets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChainNetwork {
    /// EIP-155 chain id.
    pub chain_id: u64,

    /// Display name used in events.
    pub name: String,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Token contract exposing the ERC-20 + `paused()` surface.
    pub token_address: String,
}

/// The three testnets the demo ships with, in drain order.
pub fn default_chains() -> Vec<ChainNetwork> {
    vec![
        ChainNetwork {
            chain_id: 4661,
            name: "Appchain".to_string(),
            rpc_url: "https://appchaintestnet.rpc.caldera.xyz/http".to_string(),
            token_address: "0xcF203c5f8Ef52DBC1451Fc48db1Fc4a54E0935b3".to_string(),
        },
        ChainNetwork {
            chain_id: 1918988905,
            name: "Rari".to_string(),
            rpc_url: "https://rari-testnet.calderachain.xyz/".to_string(),
            token_address: "0x1ed6fd61b72E24084A92d94999858D51161676CE".to_string(),
        },
        ChainNetwork {
            chain_id: 11142220,
            name: "Celo".to_string(),
            rpc_url: "https://forno.celo-sepolia.celo-testnet.org".to_string(),
            token_address: "0xE3347DC25e96F65E0029B18595bCAf6656Ed027e".to_string(),
        },
    ]
}

/// Protection service endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProtectionConfig {
    /// Base URL for the registration API.
    pub base_url: String,

    /// WebSocket URL for the notification stream.
    pub ws_url: String,

    /// Registration request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            ws_url: "ws://localhost:4000/ws".to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Orchestration pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DrainConfig {
    /// Pause between computing an amount and signing, in milliseconds.
    pub signing_delay_ms: u64,

    /// Pause after each chain before the next one, in milliseconds.
    pub inter_chain_delay_ms: u64,

    /// Pause before the summary event, in milliseconds.
    pub summary_delay_ms: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum wait for a drain transaction receipt, in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_ms: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            signing_delay_ms: 1000,
            inter_chain_delay_ms: 1000,
            summary_delay_ms: 5000,
            rpc_timeout_secs: 10,
            receipt_timeout_secs: 120,
            receipt_poll_ms: 2000,
        }
    }
}

/// Approval detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Delay between observing an approval and starting a run, in milliseconds.
    pub settle_delay_ms: u64,

    /// Chain the victim signs the approval on.
    pub chain_id: u64,

    /// Receipt polling interval for local confirmations, in milliseconds.
    pub poll_interval_ms: u64,

    /// Give up watching a local approval after this many seconds.
    pub confirmation_timeout_secs: u64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            chain_id: 11142220,
            poll_interval_ms: 2000,
            confirmation_timeout_secs: 300,
        }
    }
}

/// Event log retention.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Maximum number of events held in memory.
    pub capacity: usize,

    /// Append every event as a JSON line to this file.
    pub persist_path: Option<String>,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            capacity: 512,
            persist_path: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// `pretty` or `json`.
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
