//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (attacker private key)
//!     → identity.rs (derive once, share via Arc)
//!     → client.rs (chain id → read client + signing client, with timeouts)
//!     → token.rs (pausable ERC-20 ABI)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod identity;
pub mod token;
pub mod types;

pub use client::{ChainClientFactory, ChainClients, ClientResolver, TokenReader, TokenSigner};
pub use identity::AttackerIdentity;
pub use types::{BlockchainError, BlockchainResult, ChainId, ReceiptStatus};
