//! Drain attempt model and outcome rules.

use std::collections::HashMap;

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};

/// Share of each chain balance a run tries to move, in percent.
pub const DRAIN_PERCENT: u64 = 10;

/// Error-text fragments that mean the token contract refused the transfer.
const REJECTION_MARKERS: [&str; 4] = ["paused", "Pausable", "revert", "execution reverted"];

/// Victim balance per chain id, in the token's native integer unit.
pub type ChainBalances = HashMap<u64, U256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrainStatus {
    Pending,
    Success,
    /// The contract rejected the transfer; the protection worked.
    Blocked,
    Error,
}

impl DrainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrainStatus::Pending => "pending",
            DrainStatus::Success => "success",
            DrainStatus::Blocked => "blocked",
            DrainStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DrainStatus::Pending)
    }
}

impl std::fmt::Display for DrainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chain-scoped attempt. Status moves pending → terminal exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainAttempt {
    pub network: String,
    pub chain_id: u64,
    status: DrainStatus,
    pub message: String,
    /// Amount in native integer units, decimal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DrainAttempt {
    pub fn pending(network: impl Into<String>, chain_id: u64) -> Self {
        Self {
            network: network.into(),
            chain_id,
            status: DrainStatus::Pending,
            message: "Attempting drain...".to_string(),
            amount: None,
            tx_hash: None,
            error: None,
        }
    }

    pub fn status(&self) -> DrainStatus {
        self.status
    }

    /// Move to a terminal status. Returns false, leaving the attempt
    /// untouched, if it already settled or `status` is `Pending`.
    pub fn settle(&mut self, status: DrainStatus, message: impl Into<String>) -> bool {
        if self.status.is_terminal() || !status.is_terminal() {
            tracing::warn!(
                network = %self.network,
                from = %self.status,
                to = %status,
                "Ignoring invalid drain attempt transition"
            );
            return false;
        }
        self.status = status;
        self.message = message.into();
        true
    }
}

/// How a finished run is summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunSummary {
    /// Every attempt was blocked.
    FundsSafe,
    /// At least one attempt succeeded.
    ProtectionIncomplete,
    /// Mixed errors and blocks, no success.
    Neutral,
}

impl RunSummary {
    pub fn of(attempts: &[DrainAttempt]) -> Self {
        if attempts.iter().all(|a| a.status() == DrainStatus::Blocked) {
            RunSummary::FundsSafe
        } else if attempts.iter().any(|a| a.status() == DrainStatus::Success) {
            RunSummary::ProtectionIncomplete
        } else {
            RunSummary::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunSummary::FundsSafe => "funds_safe",
            RunSummary::ProtectionIncomplete => "protection_incomplete",
            RunSummary::Neutral => "neutral",
        }
    }
}

/// Result of asking the orchestrator to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every configured chain reached a terminal status.
    Completed(Vec<DrainAttempt>),
    /// A run was already in progress; nothing happened.
    AlreadyRunning,
    /// The session was torn down mid-run; attempts so far.
    Cancelled(Vec<DrainAttempt>),
}

impl RunOutcome {
    pub fn attempts(&self) -> &[DrainAttempt] {
        match self {
            RunOutcome::Completed(a) | RunOutcome::Cancelled(a) => a,
            RunOutcome::AlreadyRunning => &[],
        }
    }
}

/// `floor(balance × DRAIN_PERCENT / 100)` in exact integer arithmetic.
pub fn drain_amount(balance: U256) -> U256 {
    let pct = U256::from(DRAIN_PERCENT);
    let hundred = U256::from(100u64);
    match balance.checked_mul(pct) {
        Some(scaled) => scaled / hundred,
        // floor(b·p/100) = (b/100)·p + floor((b mod 100)·p/100)
        None => (balance / hundred) * pct + (balance % hundred) * pct / hundred,
    }
}

/// Classify a failed submission or inclusion wait by its error text.
pub fn classify_failure(error_text: &str) -> DrainStatus {
    if REJECTION_MARKERS.iter().any(|m| error_text.contains(m)) {
        DrainStatus::Blocked
    } else {
        DrainStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled(status: DrainStatus) -> DrainAttempt {
        let mut a = DrainAttempt::pending("Test", 1);
        a.settle(status, "done");
        a
    }

    #[test]
    fn test_drain_amount_is_ten_percent_floor() {
        assert_eq!(drain_amount(U256::from(1_000_000u64)), U256::from(100_000u64));
        assert_eq!(drain_amount(U256::from(19u64)), U256::from(1u64));
        assert_eq!(drain_amount(U256::from(9u64)), U256::ZERO);
    }

    #[test]
    fn test_drain_amount_near_max_does_not_overflow() {
        assert_eq!(drain_amount(U256::MAX), U256::MAX / U256::from(10u64));
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(classify_failure("Pausable: paused"), DrainStatus::Blocked);
        assert_eq!(classify_failure("execution reverted: EnforcedPause()"), DrainStatus::Blocked);
        assert_eq!(classify_failure("server returned an error response: revert"), DrainStatus::Blocked);
        assert_eq!(classify_failure("error sending request: connection refused"), DrainStatus::Error);
        assert_eq!(classify_failure("RPC timeout after 10 seconds"), DrainStatus::Error);
    }

    #[test]
    fn test_attempt_moves_forward_only() {
        let mut attempt = DrainAttempt::pending("Rari", 1918988905);
        assert_eq!(attempt.status(), DrainStatus::Pending);
        assert!(!attempt.settle(DrainStatus::Pending, "still pending"));
        assert!(attempt.settle(DrainStatus::Blocked, "frozen"));
        assert!(!attempt.settle(DrainStatus::Success, "too late"));
        assert_eq!(attempt.status(), DrainStatus::Blocked);
        assert_eq!(attempt.message, "frozen");
    }

    #[test]
    fn test_summary_rules() {
        let all_blocked = vec![settled(DrainStatus::Blocked), settled(DrainStatus::Blocked)];
        assert_eq!(RunSummary::of(&all_blocked), RunSummary::FundsSafe);

        let one_success = vec![
            settled(DrainStatus::Error),
            settled(DrainStatus::Success),
            settled(DrainStatus::Blocked),
        ];
        assert_eq!(RunSummary::of(&one_success), RunSummary::ProtectionIncomplete);

        let mixed = vec![settled(DrainStatus::Error), settled(DrainStatus::Blocked)];
        assert_eq!(RunSummary::of(&mixed), RunSummary::Neutral);
    }

    #[test]
    fn test_attempt_serializes_status_lowercase() {
        let json = serde_json::to_value(settled(DrainStatus::Success)).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("tx_hash").is_none());
    }
}
