//! Approval detection subsystem.
//!
//! # Data Flow
//! ```text
//! confirmation.rs (victim's approval receipt)  ─┐
//!                                                ├→ mpsc<ApprovalSignal> → watcher.rs
//! protection::notifications (approval_detected) ─┘       dedup by tx hash
//!                                                         → settle delay
//!                                                         → DrainRunner::drain (once)
//! ```

pub mod confirmation;
pub mod signal;
pub mod watcher;

pub use confirmation::ConfirmationWatcher;
pub use signal::{ApprovalSignal, ApprovalSource};
pub use watcher::{ApprovalSender, ApprovalWatcher, DrainRunner};
