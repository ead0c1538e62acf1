//! Drain orchestration.
//!
//! # Responsibilities
//! - One sequential pass over the configured chains per approval
//! - Per chain: compute the amount, sign `transferFrom` as the attacker,
//!   await inclusion, classify the outcome
//! - Append progress and exactly one summary to the event log
//! - Refuse overlapping runs; stop quietly when the session is cancelled
//!
//! A chain's failure never aborts the run and nothing is retried.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, U256};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::blockchain::{BlockchainError, ClientResolver, ReceiptStatus};
use crate::config::{ChainNetwork, DrainConfig};
use crate::drain::types::{
    classify_failure, drain_amount, ChainBalances, DrainAttempt, DrainStatus, RunOutcome,
    RunSummary, DRAIN_PERCENT,
};
use crate::events::{EventKind, EventLog};
use crate::observability::metrics;

/// Fixed pauses a run observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainTiming {
    /// Before signing each chain's transaction.
    pub signing_delay: Duration,
    /// After each chain, before the next.
    pub inter_chain_delay: Duration,
    /// Before the summary event.
    pub summary_delay: Duration,
    /// Upper bound on waiting for a drain receipt.
    pub receipt_timeout: Duration,
}

impl From<&DrainConfig> for DrainTiming {
    fn from(config: &DrainConfig) -> Self {
        Self {
            signing_delay: Duration::from_millis(config.signing_delay_ms),
            inter_chain_delay: Duration::from_millis(config.inter_chain_delay_ms),
            summary_delay: Duration::from_millis(config.summary_delay_ms),
            receipt_timeout: Duration::from_secs(config.receipt_timeout_secs),
        }
    }
}

impl Default for DrainTiming {
    fn default() -> Self {
        Self::from(&DrainConfig::default())
    }
}

/// The session was cancelled while awaiting.
struct Interrupted;

/// How a chain's attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainEnd {
    /// Nothing was sent; move straight on to the next chain.
    Early,
    /// The chain went through signing and submission; pace before the next.
    Paced,
}

/// Appends on behalf of one run, going silent once the run is cancelled.
struct RunEmitter<'a> {
    events: &'a EventLog,
    cancel: &'a CancellationToken,
}

impl RunEmitter<'_> {
    fn emit(&self, kind: EventKind, message: String, payload: Option<serde_json::Value>) {
        if self.cancel.is_cancelled() {
            tracing::debug!(kind = %kind, "Suppressing event from cancelled run");
            return;
        }
        self.events.append(kind, message, payload);
    }
}

/// Clears the running flag however the run ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DrainOrchestrator {
    resolver: Arc<dyn ClientResolver>,
    events: EventLog,
    timing: DrainTiming,
    running: AtomicBool,
    progress: Mutex<Vec<DrainAttempt>>,
}

impl DrainOrchestrator {
    pub fn new(resolver: Arc<dyn ClientResolver>, events: EventLog, timing: DrainTiming) -> Self {
        Self {
            resolver,
            events,
            timing,
            running: AtomicBool::new(false),
            progress: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Attempts of the current (or most recent) run, in chain order.
    pub fn progress(&self) -> Vec<DrainAttempt> {
        match self.progress.lock() {
            Ok(p) => p.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record_progress(&self, attempts: &[DrainAttempt], current: Option<&DrainAttempt>) {
        let mut progress = match self.progress.lock() {
            Ok(p) => p,
            Err(poisoned) => poisoned.into_inner(),
        };
        progress.clear();
        progress.extend_from_slice(attempts);
        progress.extend(current.cloned());
    }

    /// Read the victim's token balance on every configured chain.
    ///
    /// A chain whose balance cannot be read counts as empty.
    pub async fn snapshot_balances(&self, victim: Address) -> ChainBalances {
        let mut balances = ChainBalances::new();

        for network in self.resolver.networks() {
            let balance = match self.resolver.resolve(network.chain_id) {
                Ok(clients) => match clients.reader.balance_of(victim).await {
                    Ok(balance) => balance,
                    Err(e) => {
                        tracing::warn!(
                            chain_id = network.chain_id,
                            error = %e,
                            "Balance read failed, treating as zero"
                        );
                        U256::ZERO
                    }
                },
                Err(e) => {
                    tracing::warn!(chain_id = network.chain_id, error = %e, "No clients for chain");
                    U256::ZERO
                }
            };
            balances.insert(network.chain_id, balance);
        }

        balances
    }

    /// Run one full pass over the configured chains.
    ///
    /// Returns `AlreadyRunning` without side effects if another run holds the
    /// guard.
    pub async fn run(
        &self,
        victim: Address,
        balances: &ChainBalances,
        cancel: &CancellationToken,
    ) -> RunOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(victim = %victim, "Drain run already in progress, ignoring trigger");
            return RunOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(&self.running);

        let emitter = RunEmitter {
            events: &self.events,
            cancel,
        };
        let attacker = self.resolver.attacker();
        let networks = self.resolver.networks();

        tracing::info!(
            victim = %victim,
            attacker = %attacker,
            chains = networks.len(),
            "Drain run starting"
        );
        self.record_progress(&[], None);

        emitter.emit(
            EventKind::DrainInitiated,
            format!(
                "Malicious wallet attempting to drain {}% of funds across all networks...",
                DRAIN_PERCENT
            ),
            Some(json!({ "victim": victim, "attacker": attacker, "chains": networks.len() })),
        );

        let mut attempts = Vec::with_capacity(networks.len());

        for network in networks {
            let balance = balances.get(&network.chain_id).copied().unwrap_or(U256::ZERO);
            let mut attempt = DrainAttempt::pending(&network.name, network.chain_id);
            self.record_progress(&attempts, Some(&attempt));

            let end = match self
                .drain_chain(network, victim, attacker, balance, &mut attempt, &emitter, cancel)
                .await
            {
                Ok(end) => end,
                Err(Interrupted) => {
                    attempt.settle(DrainStatus::Error, "Cancelled");
                    attempts.push(attempt);
                    return self.cancelled(attempts);
                }
            };

            metrics::record_drain_attempt(&network.name, attempt.status().as_str());
            tracing::info!(
                chain_id = network.chain_id,
                network = %network.name,
                status = %attempt.status(),
                "Drain attempt finished"
            );
            attempts.push(attempt);
            self.record_progress(&attempts, None);

            if end == ChainEnd::Paced
                && pause(self.timing.inter_chain_delay, cancel).await.is_err()
            {
                return self.cancelled(attempts);
            }
        }

        if pause(self.timing.summary_delay, cancel).await.is_err() {
            return self.cancelled(attempts);
        }

        let summary = RunSummary::of(&attempts);
        let (kind, message) = match summary {
            RunSummary::FundsSafe => (
                EventKind::DrainFundsSafe,
                "All drain attempts blocked! Your funds are safe across all networks.",
            ),
            RunSummary::ProtectionIncomplete => (
                EventKind::DrainWarning,
                "Some drain attempts succeeded! Protection may not be fully active.",
            ),
            RunSummary::Neutral => (
                EventKind::DrainComplete,
                "Drain attempts completed. Check results above.",
            ),
        };
        let statuses: Vec<_> = attempts
            .iter()
            .map(|a| json!({ "network": a.network, "status": a.status() }))
            .collect();
        emitter.emit(kind, message.to_string(), Some(json!({ "attempts": statuses })));

        metrics::record_run(summary.as_str());
        tracing::info!(victim = %victim, summary = summary.as_str(), "Drain run complete");

        RunOutcome::Completed(attempts)
    }

    fn cancelled(&self, attempts: Vec<DrainAttempt>) -> RunOutcome {
        tracing::info!(processed = attempts.len(), "Drain run cancelled");
        metrics::record_run("cancelled");
        self.record_progress(&attempts, None);
        RunOutcome::Cancelled(attempts)
    }

    #[allow(clippy::too_many_arguments)]
    async fn drain_chain(
        &self,
        network: &ChainNetwork,
        victim: Address,
        attacker: Address,
        balance: U256,
        attempt: &mut DrainAttempt,
        emitter: &RunEmitter<'_>,
        cancel: &CancellationToken,
    ) -> Result<ChainEnd, Interrupted> {
        let name = &network.name;

        if balance.is_zero() {
            attempt.amount = Some("0".to_string());
            attempt.settle(DrainStatus::Error, "No balance to drain");
            emitter.emit(
                EventKind::DrainSkipped,
                format!("{}: No balance available", name),
                Some(json!({ "network": name })),
            );
            return Ok(ChainEnd::Early);
        }

        let amount = drain_amount(balance);
        let amount_text = amount.to_string();
        attempt.amount = Some(amount_text.clone());
        attempt.message = format!("Attempting to drain {}...", amount_text);
        emitter.emit(
            EventKind::DrainAttempting,
            format!(
                "{}: Attempting to drain {} ({}% of balance)",
                name, amount_text, DRAIN_PERCENT
            ),
            Some(json!({ "network": name, "amount": amount_text })),
        );

        pause(self.timing.signing_delay, cancel).await?;

        let clients = match self.resolver.resolve(network.chain_id) {
            Ok(clients) => clients,
            Err(e) => {
                let text = e.to_string();
                attempt.error = Some(text.clone());
                attempt.settle(
                    DrainStatus::Error,
                    format!("Failed to create wallet client: {}", text),
                );
                emitter.emit(
                    EventKind::DrainError,
                    format!("{}: Drain attempt failed", name),
                    Some(json!({ "network": name, "error": text })),
                );
                return Ok(ChainEnd::Early);
            }
        };

        attempt.message = format!(
            "Attacker submitting transaction to drain {}...",
            amount_text
        );
        emitter.emit(
            EventKind::DrainTxSubmitting,
            format!("{}: Attacker attempting to drain {}", name, amount_text),
            Some(json!({ "network": name, "amount": amount_text })),
        );

        let submitted =
            until_cancelled(cancel, clients.signer.transfer_from(victim, attacker, amount)).await?;
        let tx_hash = match submitted {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                self.settle_failure(network, attempt, &amount_text, e, emitter);
                return Ok(ChainEnd::Paced);
            }
        };

        attempt.tx_hash = Some(tx_hash);
        attempt.message = format!("Transaction submitted: {}", tx_hash);
        tracing::info!(chain_id = network.chain_id, tx_hash = %tx_hash, "Drain transaction submitted");
        emitter.emit(
            EventKind::DrainTxSubmitted,
            format!("{}: Transaction submitted by attacker - {}", name, tx_hash),
            Some(json!({ "network": name, "txHash": tx_hash, "amount": amount_text })),
        );

        let included = until_cancelled(
            cancel,
            clients.reader.wait_for_receipt(tx_hash, self.timing.receipt_timeout),
        )
        .await?;

        match included {
            Ok(ReceiptStatus::Succeeded { .. }) => {
                attempt.settle(
                    DrainStatus::Success,
                    format!("Drain successful! {} transferred", amount_text),
                );
                emitter.emit(
                    EventKind::DrainSuccess,
                    format!("{}: Drain succeeded - {} transferred", name, amount_text),
                    Some(json!({ "network": name, "txHash": tx_hash, "amount": amount_text })),
                );
            }
            Ok(ReceiptStatus::Reverted { .. }) => {
                attempt.settle(DrainStatus::Blocked, "Blocked - Transaction reverted");
                emitter.emit(
                    EventKind::DrainBlocked,
                    format!("{}: Drain blocked - Transaction reverted", name),
                    Some(json!({ "network": name, "txHash": tx_hash, "amount": amount_text })),
                );
            }
            Ok(ReceiptStatus::Pending) => {
                let e = BlockchainError::ConfirmationTimeout(self.timing.receipt_timeout.as_secs());
                self.settle_failure(network, attempt, &amount_text, e, emitter);
            }
            Err(e) => self.settle_failure(network, attempt, &amount_text, e, emitter),
        }

        Ok(ChainEnd::Paced)
    }

    fn settle_failure(
        &self,
        network: &ChainNetwork,
        attempt: &mut DrainAttempt,
        amount_text: &str,
        error: BlockchainError,
        emitter: &RunEmitter<'_>,
    ) {
        let text = error.to_string();
        let name = &network.name;
        attempt.error = Some(text.clone());

        match classify_failure(&text) {
            DrainStatus::Blocked => {
                attempt.settle(
                    DrainStatus::Blocked,
                    "Blocked - Token frozen by protection system",
                );
                emitter.emit(
                    EventKind::DrainBlocked,
                    format!("{}: Drain successfully blocked - Token is frozen", name),
                    Some(json!({ "network": name, "amount": amount_text, "error": text })),
                );
            }
            _ => {
                tracing::warn!(chain_id = network.chain_id, error = %text, "Drain attempt failed");
                attempt.settle(DrainStatus::Error, format!("Error: {}", text));
                emitter.emit(
                    EventKind::DrainError,
                    format!("{}: Drain attempt failed", name),
                    Some(json!({ "network": name, "error": text })),
                );
            }
        }
    }
}

impl std::fmt::Debug for DrainOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrainOrchestrator")
            .field("timing", &self.timing)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), Interrupted> {
    until_cancelled(cancel, tokio::time::sleep(duration)).await
}

async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted),
        out = fut => Ok(out),
    }
}
