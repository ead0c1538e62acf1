//! drain-drill
//!
//! Runs the wallet-drain demonstration against a protection service.
//!
//! # Architecture Overview
//!
//! ```text
//!   victim address ──▶ ┌──────────────────────────────────────────────────────┐
//!                      │                 PROTECTION SESSION                    │
//!                      │                                                       │
//!                      │  registration ──▶ protection service (HTTP)           │
//!                      │  notifications ◀── protection service (WebSocket)     │
//!                      │        │                                              │
//!                      │        ▼                                              │
//!   approval tx ──────▶│  approval watcher ──(settle)──▶ drain orchestrator ───┼──▶ chains
//!                      │                                        │              │
//!                      │                                        ▼              │
//!                      │                                    event log ─────────┼──▶ stdout / JSONL
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;

use drain_drill::blockchain::ClientResolver;
use drain_drill::config::{load_config, DrillConfig};
use drain_drill::events::{EventLog, ProtectionEvent};
use drain_drill::lifecycle::{provision, shutdown_signal, ProtectionSession, SessionSettings};
use drain_drill::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "drain-drill")]
#[command(about = "Cross-chain wallet-drain drill against a token protection service", long_about = None)]
struct Cli {
    /// TOML configuration; built-in demo networks when omitted.
    #[arg(short, long, env = "DRAIN_DRILL_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the victim, listen for approvals and drain once approved
    Run {
        /// Address whose approved allowance is drained
        #[arg(long, env = "DRAIN_DRILL_VICTIM")]
        victim: Address,

        /// Victim's approval transaction to watch for inclusion
        #[arg(long)]
        approval_tx: Option<TxHash>,
    },
    /// Show balance, allowance and pause state on every chain
    Balances {
        /// Defaults to the attacker address
        #[arg(long)]
        victim: Option<Address>,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

fn load(path: Option<&PathBuf>) -> Result<DrillConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(DrillConfig::default()),
    }
}

fn print_event(event: &ProtectionEvent) {
    println!("[{}] {:<26} {}", event.timestamp_ms, event.kind.as_str(), event.message);
}

/// Print events as they are appended.
fn spawn_printer(events: &EventLog) -> tokio::task::JoinHandle<()> {
    let mut feed = events.subscribe();
    tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "drain-drill starting");

    match cli.command {
        Commands::CheckConfig => {
            println!("Configuration OK");
            for network in &config.chains {
                println!(
                    "  {:<14} chain {:<12} token {}  rpc {}",
                    network.name, network.chain_id, network.token_address, network.rpc_url
                );
            }
            println!("  protection     {} / {}", config.protection.base_url, config.protection.ws_url);
            Ok(())
        }
        Commands::Balances { victim } => {
            let provisioned = provision(&config)?;
            let attacker = provisioned.identity.address();
            let victim = victim.unwrap_or(attacker);

            for network in provisioned.factory.networks() {
                let clients = provisioned.factory.resolve(network.chain_id)?;
                let reported = clients.reader.chain_id().await;
                let balance = clients.reader.balance_of(victim).await;
                let allowance = clients.reader.allowance(victim, attacker).await;
                let paused = clients.reader.paused().await;

                println!("{} ({})", network.name, network.chain_id);
                match reported {
                    Ok(id) if id == network.chain_id => println!("  node chain id  ok"),
                    Ok(id) => println!("  node chain id  MISMATCH (node reports {})", id),
                    Err(e) => println!("  node chain id  error: {}", e),
                }
                match balance {
                    Ok(v) => println!("  balance        {}", v),
                    Err(e) => println!("  balance        error: {}", e),
                }
                match allowance {
                    Ok(v) => println!("  allowance      {}", v),
                    Err(e) => println!("  allowance      error: {}", e),
                }
                match paused {
                    Ok(v) => println!("  paused         {}", v),
                    Err(e) => println!("  paused         error: {}", e),
                }
            }
            Ok(())
        }
        Commands::Run { victim, approval_tx } => {
            if config.observability.metrics_enabled {
                if let Ok(addr) = config.observability.metrics_address.parse() {
                    metrics::init_metrics(addr);
                } else {
                    tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    );
                }
            }

            let provisioned = provision(&config)?;
            for event in provisioned.events.snapshot().iter().rev() {
                print_event(event);
            }
            let printer = spawn_printer(&provisioned.events);

            let resolver: Arc<dyn ClientResolver> = provisioned.factory.clone();
            let mut session = ProtectionSession::start(
                SessionSettings::from(&config),
                victim,
                resolver,
                provisioned.events.clone(),
            );
            tracing::info!(session_id = %session.id(), victim = %victim, "Waiting for approval");

            if let Some(tx_hash) = approval_tx {
                session.watch_approval(tx_hash)?;
            }

            shutdown_signal().await;

            let attempts = session.progress();
            session.shutdown().await;
            printer.abort();

            if !attempts.is_empty() {
                println!();
                println!("Drain attempts:");
                for attempt in &attempts {
                    println!(
                        "  {:<14} {:<8} amount {:<24} {}",
                        attempt.network,
                        attempt.status(),
                        attempt.amount.as_deref().unwrap_or("-"),
                        attempt.message
                    );
                }
            }

            tracing::info!("Shutdown complete");
            Ok(())
        }
    }
}
