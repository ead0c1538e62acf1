//! Approval observations.

use alloy::primitives::TxHash;
use serde::Serialize;

/// Where an approval observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalSource {
    /// The victim's own approval transaction was seen included on-chain.
    LocalConfirmation,
    /// The protection service pushed `approval_detected`.
    RemoteNotification,
}

impl ApprovalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalSource::LocalConfirmation => "local_confirmation",
            ApprovalSource::RemoteNotification => "remote_notification",
        }
    }
}

/// One observation of a spending authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalSignal {
    /// The approval transaction, when the source knows it.
    pub tx_hash: Option<TxHash>,
    pub source: ApprovalSource,
}

impl ApprovalSignal {
    pub fn local(tx_hash: TxHash) -> Self {
        Self {
            tx_hash: Some(tx_hash),
            source: ApprovalSource::LocalConfirmation,
        }
    }

    pub fn remote(tx_hash: Option<TxHash>) -> Self {
        Self {
            tx_hash,
            source: ApprovalSource::RemoteNotification,
        }
    }
}
