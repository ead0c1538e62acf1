//! Attacker signing identity.
//!
//! # Security
//! - The private key is loaded ONLY from an environment variable
//! - Keys are never logged or serialized
//! - One identity per process, shared read-only behind an `Arc`

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// The signing identity every drain transaction is sent from.
#[derive(Clone)]
pub struct AttackerIdentity {
    signer: PrivateKeySigner,
}

impl AttackerIdentity {
    /// Derive the identity from a hex-encoded private key (with or without 0x).
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Identity(format!("Invalid private key format: {}", e)))?;

        tracing::info!(address = %signer.address(), "Attacker identity derived");

        Ok(Self { signer })
    }

    /// Load the identity from the named environment variable.
    pub fn from_env(var: &str) -> BlockchainResult<Self> {
        let private_key = std::env::var(var).map_err(|_| {
            BlockchainError::Identity(format!("Environment variable {} not set", var))
        })?;

        Self::from_private_key(&private_key)
    }

    /// The attacker's address; the destination of every drain.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// A transaction-signing wallet for provider construction.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for AttackerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackerIdentity")
            .field("address", &self.address())
            .field("signer", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_identity_from_private_key() {
        let identity = AttackerIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(
            identity.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_identity_with_0x_prefix() {
        let identity =
            AttackerIdentity::from_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(
            identity.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_invalid_private_key() {
        let result = AttackerIdentity::from_private_key("invalid_key");
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    #[test]
    fn test_missing_env_var() {
        let result = AttackerIdentity::from_env("DRAIN_DRILL_TEST_UNSET_SECRET");
        assert!(result.unwrap_err().to_string().contains("not set"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let identity = AttackerIdentity::from_private_key(TEST_PRIVATE_KEY).unwrap();
        let rendered = format!("{:?}", identity);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(TEST_PRIVATE_KEY));
    }
}
