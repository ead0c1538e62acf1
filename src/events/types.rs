//! Protection event types.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// What a protection event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    AttackerIdentityDerived,
    WalletRegistered,
    NotificationConnected,
    NotificationDisconnected,
    ApprovalDetected,
    ApprovalConfirmed,
    FreezeTriggered,
    DrainInitiated,
    DrainSkipped,
    DrainAttempting,
    DrainTxSubmitting,
    DrainTxSubmitted,
    DrainSuccess,
    DrainBlocked,
    DrainError,
    /// Summary: every chain rejected the drain.
    DrainFundsSafe,
    /// Summary: at least one chain was drained.
    DrainWarning,
    /// Summary: neither of the above.
    DrainComplete,
}

impl EventKind {
    /// Stable label, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AttackerIdentityDerived => "attacker_identity_derived",
            EventKind::WalletRegistered => "wallet_registered",
            EventKind::NotificationConnected => "notification_connected",
            EventKind::NotificationDisconnected => "notification_disconnected",
            EventKind::ApprovalDetected => "approval_detected",
            EventKind::ApprovalConfirmed => "approval_confirmed",
            EventKind::FreezeTriggered => "freeze_triggered",
            EventKind::DrainInitiated => "drain_initiated",
            EventKind::DrainSkipped => "drain_skipped",
            EventKind::DrainAttempting => "drain_attempting",
            EventKind::DrainTxSubmitting => "drain_tx_submitting",
            EventKind::DrainTxSubmitted => "drain_tx_submitted",
            EventKind::DrainSuccess => "drain_success",
            EventKind::DrainBlocked => "drain_blocked",
            EventKind::DrainError => "drain_error",
            EventKind::DrainFundsSafe => "drain_funds_safe",
            EventKind::DrainWarning => "drain_warning",
            EventKind::DrainComplete => "drain_complete",
        }
    }

    /// True for the three end-of-run summary kinds.
    pub fn is_summary(&self) -> bool {
        matches!(
            self,
            EventKind::DrainFundsSafe | EventKind::DrainWarning | EventKind::DrainComplete
        )
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectionEvent {
    pub kind: EventKind,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ProtectionEvent {
    pub fn new(kind: EventKind, message: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Self {
            kind,
            timestamp_ms,
            message: message.into(),
            payload,
        }
    }
}
