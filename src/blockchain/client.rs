//! Per-chain token clients and the factory that hands them out.
//!
//! # Responsibilities
//! - Map a chain id to its static network configuration (table lookup)
//! - Build one read client and one attacker-bound signing client per chain
//! - Bound every RPC call with a timeout and translate failures into
//!   `BlockchainError`
//!
//! The orchestrator only sees the `TokenReader`/`TokenSigner` traits, so
//! tests substitute scripted clients without a node.

use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use tokio::time::{interval, timeout, Instant};

use crate::blockchain::identity::AttackerIdentity;
use crate::blockchain::token::IPausableToken;
use crate::blockchain::types::{BlockchainError, BlockchainResult, ReceiptStatus};
use crate::config::ChainNetwork;

/// Read-only view of one chain's token contract.
#[async_trait]
pub trait TokenReader: Send + Sync {
    /// Chain id reported by the node.
    async fn chain_id(&self) -> BlockchainResult<u64>;

    async fn balance_of(&self, account: Address) -> BlockchainResult<U256>;

    async fn allowance(&self, owner: Address, spender: Address) -> BlockchainResult<U256>;

    async fn paused(&self) -> BlockchainResult<bool>;

    /// Current inclusion state of a transaction.
    async fn receipt_status(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptStatus>;

    /// Poll until the transaction is included or `wait` elapses.
    async fn wait_for_receipt(&self, tx_hash: TxHash, wait: Duration)
        -> BlockchainResult<ReceiptStatus>;
}

/// Attacker-signed writes against one chain's token contract.
#[async_trait]
pub trait TokenSigner: Send + Sync {
    /// Submit `transferFrom(from, to, amount)`; returns once the node accepts it.
    async fn transfer_from(&self, from: Address, to: Address, amount: U256)
        -> BlockchainResult<TxHash>;
}

/// Clients for one chain.
#[derive(Clone)]
pub struct ChainClients {
    pub network: ChainNetwork,
    pub reader: Arc<dyn TokenReader>,
    pub signer: Arc<dyn TokenSigner>,
}

impl std::fmt::Debug for ChainClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClients")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

/// Source of per-chain clients, keyed by chain id.
pub trait ClientResolver: Send + Sync {
    /// Configured networks in drain order.
    fn networks(&self) -> &[ChainNetwork];

    /// Address the signing clients send from.
    fn attacker(&self) -> Address;

    fn resolve(&self, chain_id: u64) -> BlockchainResult<ChainClients>;
}

/// Wrap an RPC future with the per-call timeout.
async fn bounded<T, E, F>(limit: Duration, fut: F) -> BlockchainResult<T>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(BlockchainError::Rpc(e.to_string())),
        Err(_) => Err(BlockchainError::Timeout(limit.as_secs())),
    }
}

/// JSON-RPC backed `TokenReader`.
pub struct RpcTokenReader {
    provider: DynProvider,
    token: Address,
    timeout_duration: Duration,
    poll_interval: Duration,
}

impl RpcTokenReader {
    fn contract(&self) -> IPausableToken::IPausableTokenInstance<DynProvider> {
        IPausableToken::new(self.token, self.provider.clone())
    }
}

#[async_trait]
impl TokenReader for RpcTokenReader {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        bounded(self.timeout_duration, self.provider.get_chain_id()).await
    }

    async fn balance_of(&self, account: Address) -> BlockchainResult<U256> {
        let contract = self.contract();
        bounded(self.timeout_duration, contract.balanceOf(account).call()).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> BlockchainResult<U256> {
        let contract = self.contract();
        bounded(self.timeout_duration, contract.allowance(owner, spender).call()).await
    }

    async fn paused(&self) -> BlockchainResult<bool> {
        let contract = self.contract();
        bounded(self.timeout_duration, contract.paused().call()).await
    }

    async fn receipt_status(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptStatus> {
        let receipt = bounded(
            self.timeout_duration,
            self.provider.get_transaction_receipt(tx_hash),
        )
        .await?;

        Ok(match receipt {
            None => ReceiptStatus::Pending,
            Some(r) if r.status() => ReceiptStatus::Succeeded { block_number: r.block_number },
            Some(r) => ReceiptStatus::Reverted { block_number: r.block_number },
        })
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        wait: Duration,
    ) -> BlockchainResult<ReceiptStatus> {
        let deadline = Instant::now() + wait;
        let mut ticker = interval(self.poll_interval);

        loop {
            ticker.tick().await;

            match self.receipt_status(tx_hash).await {
                Ok(status) if status.is_final() => return Ok(status),
                Ok(_) => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
                Err(e) => tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed"),
            }

            if Instant::now() >= deadline {
                return Err(BlockchainError::ConfirmationTimeout(wait.as_secs()));
            }
        }
    }
}

/// JSON-RPC backed `TokenSigner` holding the attacker wallet.
pub struct RpcTokenSigner {
    provider: DynProvider,
    token: Address,
    timeout_duration: Duration,
}

#[async_trait]
impl TokenSigner for RpcTokenSigner {
    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> BlockchainResult<TxHash> {
        let contract = IPausableToken::new(self.token, self.provider.clone());
        let call = contract.transferFrom(from, to, amount);

        match timeout(self.timeout_duration, call.send()).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => Err(BlockchainError::Submission(e.to_string())),
            Err(_) => Err(BlockchainError::Timeout(self.timeout_duration.as_secs())),
        }
    }
}

/// Table-driven factory over the static chain configuration.
pub struct ChainClientFactory {
    networks: Vec<ChainNetwork>,
    clients: HashMap<u64, ChainClients>,
    identity: Arc<AttackerIdentity>,
}

impl ChainClientFactory {
    /// Build clients for every configured network.
    ///
    /// Fails if any RPC URL or token address does not parse; no network
    /// traffic happens here.
    pub fn new(
        networks: Vec<ChainNetwork>,
        identity: Arc<AttackerIdentity>,
        rpc_timeout: Duration,
        poll_interval: Duration,
    ) -> BlockchainResult<Self> {
        let mut clients = HashMap::with_capacity(networks.len());

        for network in &networks {
            let rpc_url: url::Url = network.rpc_url.parse().map_err(|e| {
                BlockchainError::Configuration(format!(
                    "Invalid RPC URL '{}' for {}: {}",
                    network.rpc_url, network.name, e
                ))
            })?;
            let token: Address = network.token_address.parse().map_err(|e| {
                BlockchainError::Configuration(format!(
                    "Invalid token address '{}' for {}: {}",
                    network.token_address, network.name, e
                ))
            })?;

            let read_provider = ProviderBuilder::new().connect_http(rpc_url.clone()).erased();
            let signing_provider = ProviderBuilder::new()
                .wallet(identity.wallet())
                .connect_http(rpc_url)
                .erased();

            let entry = ChainClients {
                network: network.clone(),
                reader: Arc::new(RpcTokenReader {
                    provider: read_provider,
                    token,
                    timeout_duration: rpc_timeout,
                    poll_interval,
                }),
                signer: Arc::new(RpcTokenSigner {
                    provider: signing_provider,
                    token,
                    timeout_duration: rpc_timeout,
                }),
            };

            if clients.insert(network.chain_id, entry).is_some() {
                return Err(BlockchainError::Configuration(format!(
                    "Duplicate chain id {}",
                    network.chain_id
                )));
            }

            tracing::debug!(
                chain_id = network.chain_id,
                name = %network.name,
                token = %token,
                "Chain clients prepared"
            );
        }

        Ok(Self {
            networks,
            clients,
            identity,
        })
    }
}

impl ClientResolver for ChainClientFactory {
    fn networks(&self) -> &[ChainNetwork] {
        &self.networks
    }

    fn attacker(&self) -> Address {
        self.identity.address()
    }

    fn resolve(&self, chain_id: u64) -> BlockchainResult<ChainClients> {
        self.clients
            .get(&chain_id)
            .cloned()
            .ok_or(BlockchainError::UnknownChain(chain_id))
    }
}

impl std::fmt::Debug for ChainClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClientFactory")
            .field("networks", &self.networks)
            .field("attacker", &self.identity.address())
            .finish()
    }
}
