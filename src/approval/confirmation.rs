//! Local approval confirmation.
//!
//! Watches the victim's own approval transaction until it is included and
//! reports it as a `LocalConfirmation` signal.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::approval::signal::ApprovalSignal;
use crate::approval::watcher::ApprovalSender;
use crate::blockchain::{ReceiptStatus, TokenReader};
use crate::events::{EventKind, EventLog};

pub struct ConfirmationWatcher {
    reader: Arc<dyn TokenReader>,
    events: EventLog,
    approvals: ApprovalSender,
    timeout: Duration,
}

impl ConfirmationWatcher {
    pub fn new(
        reader: Arc<dyn TokenReader>,
        events: EventLog,
        approvals: ApprovalSender,
        timeout: Duration,
    ) -> Self {
        Self {
            reader,
            events,
            approvals,
            timeout,
        }
    }

    /// Wait for `tx_hash` to be included. Returns true if a confirmation was
    /// reported.
    pub async fn watch(self, tx_hash: TxHash, cancel: CancellationToken) -> bool {
        tracing::info!(tx_hash = %tx_hash, "Watching approval transaction");

        let status = tokio::select! {
            _ = cancel.cancelled() => return false,
            status = self.reader.wait_for_receipt(tx_hash, self.timeout) => status,
        };

        match status {
            Ok(ReceiptStatus::Succeeded { block_number }) => {
                self.events.append(
                    EventKind::ApprovalConfirmed,
                    "Approval transaction confirmed!",
                    Some(json!({ "txHash": tx_hash, "blockNumber": block_number })),
                );
                if self.approvals.send(ApprovalSignal::local(tx_hash)).await.is_err() {
                    tracing::warn!(tx_hash = %tx_hash, "Approval watcher gone, confirmation dropped");
                    return false;
                }
                true
            }
            Ok(ReceiptStatus::Reverted { .. }) => {
                tracing::warn!(tx_hash = %tx_hash, "Approval transaction reverted, nothing to drain");
                false
            }
            Ok(ReceiptStatus::Pending) => false,
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Stopped watching approval transaction");
                false
            }
        }
    }
}
