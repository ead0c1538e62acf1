//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Derive attacker identity → Open event log → Build chain clients
//!
//! Session (session.rs):
//!     Register victim → Open notification channel → Watch approvals → Drain once
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Cancel session → Await tasks → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: a missing attacker secret is fatal before any network traffic
//! - One cancellation token per session; every long-running loop selects on it
//! - Teardown has a grace period, then gives up waiting

pub mod session;
pub mod signals;
pub mod startup;

pub use session::{ProtectionSession, SessionSettings};
pub use signals::shutdown_signal;
pub use startup::{provision, Provisioned, StartupError};
