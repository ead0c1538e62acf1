//! One protection session bound to a victim address.
//!
//! # Responsibilities
//! - Register the victim with the protection service
//! - Run the notification channel and the approval watcher
//! - Turn a settled approval into balance snapshot + one drain run
//! - Cancel everything on teardown and wait for the tasks to finish
//!
//! Every task runs inside the session span, tagged with a UUID.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::approval::{ApprovalSender, ApprovalSignal, ApprovalWatcher, ConfirmationWatcher, DrainRunner};
use crate::blockchain::{BlockchainResult, ClientResolver};
use crate::config::DrillConfig;
use crate::drain::{DrainAttempt, DrainOrchestrator, DrainTiming, RunOutcome};
use crate::events::EventLog;
use crate::protection::{NotificationChannel, RegistrationClient};

/// Upper bound on waiting for session tasks during teardown.
const TEARDOWN_GRACE: Duration = Duration::from_secs(10);

/// Connects the approval watcher to the orchestrator for one victim.
struct OrchestratorRunner {
    orchestrator: Arc<DrainOrchestrator>,
    victim: Address,
    cancel: CancellationToken,
}

#[async_trait]
impl DrainRunner for OrchestratorRunner {
    async fn drain(&self, signal: ApprovalSignal) -> RunOutcome {
        tracing::info!(
            victim = %self.victim,
            source = signal.source.as_str(),
            tx_hash = ?signal.tx_hash,
            "Approval settled, draining"
        );

        let balances = tokio::select! {
            _ = self.cancel.cancelled() => return RunOutcome::Cancelled(Vec::new()),
            balances = self.orchestrator.snapshot_balances(self.victim) => balances,
        };

        self.orchestrator.run(self.victim, &balances, &self.cancel).await
    }

    fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }
}

/// Timings and endpoints a session reads from configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub base_url: String,
    pub ws_url: String,
    pub request_timeout: Duration,
    pub settle_delay: Duration,
    pub approval_chain_id: u64,
    pub confirmation_timeout: Duration,
    pub timing: DrainTiming,
}

impl From<&DrillConfig> for SessionSettings {
    fn from(config: &DrillConfig) -> Self {
        Self {
            base_url: config.protection.base_url.clone(),
            ws_url: config.protection.ws_url.clone(),
            request_timeout: Duration::from_secs(config.protection.request_timeout_secs),
            settle_delay: Duration::from_millis(config.approval.settle_delay_ms),
            approval_chain_id: config.approval.chain_id,
            confirmation_timeout: Duration::from_secs(config.approval.confirmation_timeout_secs),
            timing: DrainTiming::from(&config.drain),
        }
    }
}

pub struct ProtectionSession {
    id: Uuid,
    victim: Address,
    span: tracing::Span,
    settings: SessionSettings,
    resolver: Arc<dyn ClientResolver>,
    events: EventLog,
    orchestrator: Arc<DrainOrchestrator>,
    approvals: ApprovalSender,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ProtectionSession {
    /// Spawn registration, the notification channel and the approval watcher.
    pub fn start(
        settings: SessionSettings,
        victim: Address,
        resolver: Arc<dyn ClientResolver>,
        events: EventLog,
    ) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!("session", session_id = %id, victim = %victim);
        let cancel = CancellationToken::new();

        let orchestrator = Arc::new(DrainOrchestrator::new(
            resolver.clone(),
            events.clone(),
            settings.timing,
        ));
        let runner = Arc::new(OrchestratorRunner {
            orchestrator: orchestrator.clone(),
            victim,
            cancel: cancel.clone(),
        });
        let (watcher, approvals) = ApprovalWatcher::new(runner, settings.settle_delay);

        let mut tasks = Vec::with_capacity(3);

        tasks.push(tokio::spawn(
            watcher.run(cancel.clone()).instrument(span.clone()),
        ));

        match RegistrationClient::new(&settings.base_url, settings.request_timeout) {
            Ok(client) => {
                let events = events.clone();
                let cancel = cancel.clone();
                tasks.push(tokio::spawn(
                    async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = client.register_session(victim, &events) => {}
                        }
                    }
                    .instrument(span.clone()),
                ));
            }
            Err(e) => tracing::error!(parent: &span, error = %e, "Registration client unavailable"),
        }

        let channel = NotificationChannel::new(settings.ws_url.clone(), events.clone(), approvals.clone());
        let channel_cancel = cancel.clone();
        tasks.push(tokio::spawn(
            async move {
                if let Err(e) = channel.run(channel_cancel).await {
                    tracing::error!(error = %e, "Notification channel unavailable");
                }
            }
            .instrument(span.clone()),
        ));

        tracing::info!(parent: &span, "Protection session started");

        Self {
            id,
            victim,
            span,
            settings,
            resolver,
            events,
            orchestrator,
            approvals,
            cancel,
            tasks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn victim(&self) -> Address {
        self.victim
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Sender for approval observations from outside the session.
    pub fn approvals(&self) -> ApprovalSender {
        self.approvals.clone()
    }

    pub fn is_draining(&self) -> bool {
        self.orchestrator.is_running()
    }

    /// Attempts of the current or most recent run.
    pub fn progress(&self) -> Vec<DrainAttempt> {
        self.orchestrator.progress()
    }

    /// Watch the victim's approval transaction on the approval chain and
    /// report it once included.
    pub fn watch_approval(&mut self, tx_hash: TxHash) -> BlockchainResult<()> {
        let clients = self.resolver.resolve(self.settings.approval_chain_id)?;
        let watcher = ConfirmationWatcher::new(
            clients.reader,
            self.events.clone(),
            self.approvals.clone(),
            self.settings.confirmation_timeout,
        );
        let cancel = self.cancel.clone();

        self.tasks.push(tokio::spawn(
            async move {
                watcher.watch(tx_hash, cancel).await;
            }
            .instrument(self.span.clone()),
        ));
        Ok(())
    }

    /// Resolves once teardown has started.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Cancel every task, then wait for them to wind down.
    pub async fn shutdown(self) {
        let span = self.span.clone();
        tracing::info!(parent: &span, "Tearing down protection session");
        self.cancel.cancel();
        drop(self.approvals);

        let join_all = async move {
            for task in self.tasks {
                if let Err(e) = task.await {
                    tracing::error!(error = %e, "Session task failed");
                }
            }
        };

        if tokio::time::timeout(TEARDOWN_GRACE, join_all.instrument(span.clone()))
            .await
            .is_err()
        {
            tracing::warn!(parent: &span, "Session tasks did not stop within grace period");
        }
        tracing::info!(parent: &span, "Protection session closed");
    }
}

impl std::fmt::Debug for ProtectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtectionSession")
            .field("id", &self.id)
            .field("victim", &self.victim)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
