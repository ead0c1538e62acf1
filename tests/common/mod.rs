//! Shared utilities for integration tests: scripted chain clients and a
//! mock protection service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use drain_drill::blockchain::{
    BlockchainError, BlockchainResult, ChainClients, ClientResolver, ReceiptStatus, TokenReader,
    TokenSigner,
};
use drain_drill::config::schema::default_chains;
use drain_drill::config::ChainNetwork;
use drain_drill::events::{EventKind, EventLog};

pub const PAUSED_REVERT: &str = "execution reverted: Pausable: paused";

pub fn attacker() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn victim() -> Address {
    Address::repeat_byte(0xbb)
}

/// How a scripted chain treats a drain transaction.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Accepted and included successfully.
    Included,
    /// Accepted, then the receipt shows a revert.
    Reverted,
    /// Refused at submission with this error text.
    Rejected(String),
    /// Accepted but never included.
    Unconfirmed,
}

/// A token contract on one chain, scripted for tests.
pub struct ScriptedToken {
    pub chain_id: u64,
    pub balance: U256,
    pub outcome: Outcome,
    pub submit_delay: Duration,
    pub transfers: Mutex<Vec<(Address, Address, U256)>>,
}

impl ScriptedToken {
    pub fn new(chain_id: u64, balance: u64, outcome: Outcome) -> Self {
        Self {
            chain_id,
            balance: U256::from(balance),
            outcome,
            submit_delay: Duration::ZERO,
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn transfers(&self) -> Vec<(Address, Address, U256)> {
        self.transfers.lock().unwrap().clone()
    }

    fn tx_hash(&self) -> TxHash {
        TxHash::left_padding_from(&self.chain_id.to_be_bytes())
    }
}

#[async_trait]
impl TokenReader for ScriptedToken {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(self.chain_id)
    }

    async fn balance_of(&self, _account: Address) -> BlockchainResult<U256> {
        Ok(self.balance)
    }

    async fn allowance(&self, _owner: Address, _spender: Address) -> BlockchainResult<U256> {
        Ok(U256::MAX)
    }

    async fn paused(&self) -> BlockchainResult<bool> {
        Ok(matches!(self.outcome, Outcome::Rejected(_)))
    }

    async fn receipt_status(&self, _tx_hash: TxHash) -> BlockchainResult<ReceiptStatus> {
        Ok(match self.outcome {
            Outcome::Included => ReceiptStatus::Succeeded { block_number: Some(1) },
            Outcome::Reverted => ReceiptStatus::Reverted { block_number: Some(1) },
            _ => ReceiptStatus::Pending,
        })
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _wait: Duration,
    ) -> BlockchainResult<ReceiptStatus> {
        self.receipt_status(tx_hash).await
    }
}

#[async_trait]
impl TokenSigner for ScriptedToken {
    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> BlockchainResult<TxHash> {
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        self.transfers.lock().unwrap().push((from, to, amount));

        match &self.outcome {
            Outcome::Rejected(text) => Err(BlockchainError::Submission(text.clone())),
            _ => Ok(self.tx_hash()),
        }
    }
}

/// Resolver over scripted tokens. Networks without a token resolve to
/// `UnknownChain`.
pub struct MockResolver {
    networks: Vec<ChainNetwork>,
    tokens: HashMap<u64, Arc<ScriptedToken>>,
}

impl MockResolver {
    pub fn new(networks: Vec<ChainNetwork>) -> Self {
        Self {
            networks,
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: ScriptedToken) -> Self {
        self.tokens.insert(token.chain_id, Arc::new(token));
        self
    }

    pub fn token(&self, chain_id: u64) -> Arc<ScriptedToken> {
        self.tokens[&chain_id].clone()
    }
}

impl ClientResolver for MockResolver {
    fn networks(&self) -> &[ChainNetwork] {
        &self.networks
    }

    fn attacker(&self) -> Address {
        attacker()
    }

    fn resolve(&self, chain_id: u64) -> BlockchainResult<ChainClients> {
        let token = self
            .tokens
            .get(&chain_id)
            .cloned()
            .ok_or(BlockchainError::UnknownChain(chain_id))?;
        let network = self
            .networks
            .iter()
            .find(|n| n.chain_id == chain_id)
            .cloned()
            .ok_or(BlockchainError::UnknownChain(chain_id))?;

        Ok(ChainClients {
            network,
            reader: token.clone(),
            signer: token,
        })
    }
}

/// The three demo chains, each scripted with the same balance and outcome.
pub fn demo_resolver(balance: u64, outcome: Outcome) -> MockResolver {
    let networks = default_chains();
    let mut resolver = MockResolver::new(networks.clone());
    for network in &networks {
        resolver = resolver.with_token(ScriptedToken::new(network.chain_id, balance, outcome.clone()));
    }
    resolver
}

pub fn kinds(events: &EventLog) -> Vec<EventKind> {
    events.snapshot().iter().map(|e| e.kind).collect()
}

pub fn count(events: &EventLog, kind: EventKind) -> usize {
    events.of_kind(kind).len()
}

/// Poll `cond` until it holds or `limit` elapses.
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, cond: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Sentinel pushed through the mock service to close every socket.
pub const CLOSE: &str = "__close__";

#[derive(Clone)]
struct ServiceState {
    accept_registration: bool,
    registrations: Arc<Mutex<Vec<Value>>>,
    listeners: Arc<AtomicUsize>,
    push: broadcast::Sender<String>,
}

/// A protection service stand-in: `/register-wallet` plus a `/ws` that
/// forwards whatever the test pushes.
pub struct MockProtectionService {
    pub addr: SocketAddr,
    registrations: Arc<Mutex<Vec<Value>>>,
    listeners: Arc<AtomicUsize>,
    push: broadcast::Sender<String>,
}

impl MockProtectionService {
    pub async fn start(accept_registration: bool) -> Self {
        let (push, _) = broadcast::channel(64);
        let state = ServiceState {
            accept_registration,
            registrations: Arc::new(Mutex::new(Vec::new())),
            listeners: Arc::new(AtomicUsize::new(0)),
            push: push.clone(),
        };

        let app = Router::new()
            .route("/register-wallet", post(register))
            .route("/ws", get(ws_upgrade))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            registrations: state.registrations,
            listeners: state.listeners,
            push,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn registrations(&self) -> Vec<Value> {
        self.registrations.lock().unwrap().clone()
    }

    /// Sockets currently subscribed to pushes.
    pub fn listeners(&self) -> usize {
        self.listeners.load(Ordering::SeqCst)
    }

    pub fn push(&self, text: impl Into<String>) {
        let _ = self.push.send(text.into());
    }

    pub fn push_json(&self, value: Value) {
        self.push(value.to_string());
    }

    pub fn close_all(&self) {
        self.push(CLOSE);
    }
}

async fn register(State(state): State<ServiceState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.registrations.lock().unwrap().push(body.clone());
    if state.accept_registration {
        (StatusCode::OK, Json(json!({ "success": true, "address": body["address"] })))
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "registration disabled" })))
    }
}

async fn ws_upgrade(State(state): State<ServiceState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| forward(socket, state))
}

async fn forward(mut socket: WebSocket, state: ServiceState) {
    let mut pushes = state.push.subscribe();
    state.listeners.fetch_add(1, Ordering::SeqCst);

    loop {
        tokio::select! {
            pushed = pushes.recv() => match pushed {
                Ok(text) if text == CLOSE => {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
                Ok(text) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    state.listeners.fetch_sub(1, Ordering::SeqCst);
}
