//! Approval watcher: one "approval observed" source for both signal paths.
//!
//! # Responsibilities
//! - Consume local confirmations and remote notifications from one queue
//! - Deduplicate by approval transaction hash
//! - Schedule at most one drain run at a time, after the settling delay
//!
//! Signals that arrive while a run is scheduled or in progress are dropped,
//! not queued.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::TxHash;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::approval::signal::ApprovalSignal;
use crate::drain::RunOutcome;

/// Queue depth for approval signals.
const SIGNAL_QUEUE: usize = 32;

/// Approval hashes remembered for deduplication.
const SEEN_CAPACITY: usize = 256;

/// Bounded set of observed approvals; the oldest hash is forgotten first.
struct SeenApprovals {
    order: VecDeque<TxHash>,
    members: HashSet<TxHash>,
    capacity: usize,
}

impl SeenApprovals {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false if `tx_hash` is already remembered.
    fn insert(&mut self, tx_hash: TxHash) -> bool {
        if !self.members.insert(tx_hash) {
            return false;
        }
        self.order.push_back(tx_hash);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        true
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.order.len()
    }
}

/// What the watcher triggers once an approval has settled.
#[async_trait]
pub trait DrainRunner: Send + Sync {
    async fn drain(&self, signal: ApprovalSignal) -> RunOutcome;

    fn is_running(&self) -> bool;
}

/// Handle used by signal sources to report approvals.
pub type ApprovalSender = mpsc::Sender<ApprovalSignal>;

pub struct ApprovalWatcher {
    runner: Arc<dyn DrainRunner>,
    settle_delay: Duration,
    signals: mpsc::Receiver<ApprovalSignal>,
    seen: SeenApprovals,
    scheduled: Arc<AtomicBool>,
    in_flight: Option<JoinHandle<()>>,
}

impl ApprovalWatcher {
    pub fn new(runner: Arc<dyn DrainRunner>, settle_delay: Duration) -> (Self, ApprovalSender) {
        let (tx, signals) = mpsc::channel(SIGNAL_QUEUE);
        let watcher = Self {
            runner,
            settle_delay,
            signals,
            seen: SeenApprovals::new(SEEN_CAPACITY),
            scheduled: Arc::new(AtomicBool::new(false)),
            in_flight: None,
        };
        (watcher, tx)
    }

    /// Consume signals until cancelled or every sender is dropped, then wait
    /// for an in-flight run to wind down.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::debug!(settle_ms = self.settle_delay.as_millis() as u64, "Approval watcher started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                signal = self.signals.recv() => match signal {
                    Some(signal) => self.observe(signal, &cancel),
                    None => break,
                },
            }
        }

        if let Some(handle) = self.in_flight.take() {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Drain task failed");
            }
        }
        tracing::debug!("Approval watcher stopped");
    }

    fn observe(&mut self, signal: ApprovalSignal, cancel: &CancellationToken) {
        if let Some(tx_hash) = signal.tx_hash {
            if !self.seen.insert(tx_hash) {
                tracing::debug!(
                    tx_hash = %tx_hash,
                    source = signal.source.as_str(),
                    "Approval already observed, ignoring"
                );
                return;
            }
        }

        if self.scheduled.load(Ordering::Acquire) || self.runner.is_running() {
            tracing::warn!(
                source = signal.source.as_str(),
                "Drain run already scheduled or in progress, not scheduling another"
            );
            return;
        }

        tracing::info!(
            tx_hash = ?signal.tx_hash,
            source = signal.source.as_str(),
            settle_ms = self.settle_delay.as_millis() as u64,
            "Approval observed, scheduling drain run"
        );

        self.scheduled.store(true, Ordering::Release);
        let runner = self.runner.clone();
        let scheduled = self.scheduled.clone();
        let delay = self.settle_delay;
        let cancel = cancel.clone();

        self.in_flight = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    scheduled.store(false, Ordering::Release);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            let outcome = runner.drain(signal).await;
            scheduled.store(false, Ordering::Release);

            match outcome {
                RunOutcome::Completed(attempts) => {
                    tracing::debug!(attempts = attempts.len(), "Scheduled drain run completed")
                }
                RunOutcome::AlreadyRunning => {
                    tracing::debug!("Scheduled drain run refused by orchestrator guard")
                }
                RunOutcome::Cancelled(_) => tracing::debug!("Scheduled drain run cancelled"),
            }
        }));
    }
}
