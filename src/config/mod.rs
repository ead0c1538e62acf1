//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DrillConfig (validated, immutable)
//!     → handed by value/reference to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; the defaults describe the demo testnets
//! - Validation separates syntactic (serde) from semantic checks
//! - The attacker key never appears in the file, only the env var name

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApprovalConfig, ChainNetwork, DrainConfig, DrillConfig, EventLogConfig, ObservabilityConfig,
    ProtectionConfig,
};
