//! Chain-specific types and error definitions.

use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// No network is configured for this chain id.
    #[error("Unsupported chain: {0}")]
    UnknownChain(u64),

    /// Static network configuration is unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Attacker identity could not be derived.
    #[error("Identity error: {0}")]
    Identity(String),

    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// The node refused the transaction (simulation revert, pause, funds).
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Transaction was not included within the wait window.
    #[error("Transaction not included after {0} seconds")]
    ConfirmationTimeout(u64),
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Inclusion state of a transaction as seen through its receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// No receipt yet.
    Pending,
    /// Included and executed successfully.
    Succeeded { block_number: Option<u64> },
    /// Included but reverted.
    Reverted { block_number: Option<u64> },
}

impl ReceiptStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, ReceiptStatus::Pending)
    }
}
