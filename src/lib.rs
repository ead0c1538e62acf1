//! Wallet-drain drill library.
//!
//! Demonstrates a drain of a victim's approved ERC-20 allowance across
//! several chains while a protection service freezes the token, recording
//! every step in an ordered event log.

// Core subsystems
pub mod approval;
pub mod blockchain;
pub mod config;
pub mod drain;
pub mod events;
pub mod protection;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::DrillConfig;
pub use drain::DrainOrchestrator;
pub use events::EventLog;
pub use lifecycle::ProtectionSession;
