//! Protection event pipeline.
//!
//! # Data Flow
//! ```text
//! orchestrator / notification channel / watcher / registration
//!     → EventLog::append (prepend, bounded)
//!     → broadcast feed → observers (CLI printer, tests)
//!     → optional JSON-lines file
//! ```

pub mod log;
pub mod types;

pub use log::EventLog;
pub use types::{EventKind, ProtectionEvent};
