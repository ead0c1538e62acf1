//! Protection service wire types and errors.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors talking to the protection service. Logged at the boundary, never
/// propagated into a drain run.
#[derive(Debug, Error)]
pub enum ProtectionError {
    #[error("Registration failed: {0}")]
    Registration(String),

    #[error("Notification transport error: {0}")]
    Transport(String),

    #[error("Malformed notification: {0}")]
    Parse(String),

    #[error("Unrecognized notification type '{0}'")]
    Unrecognized(String),
}

/// Body of `POST /register-wallet`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub address: Address,
}

/// Reply to a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(default)]
    pub address: Option<String>,
}

/// Typed inbound notification. Only `txHash` is acted on; every other
/// field travels untyped in `Notification::raw`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    ApprovalDetected {
        #[serde(rename = "txHash", default)]
        tx_hash: Option<TxHash>,
    },
    FreezeTriggered {
        #[serde(rename = "txHash", default)]
        tx_hash: Option<TxHash>,
    },
}

impl InboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundMessage::ApprovalDetected { .. } => "approval_detected",
            InboundMessage::FreezeTriggered { .. } => "freeze_triggered",
        }
    }
}

/// A decoded notification together with its raw JSON, kept as event payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: InboundMessage,
    pub raw: serde_json::Value,
}

/// Decode one text frame.
pub fn decode_notification(text: &str) -> Result<Notification, ProtectionError> {
    let raw: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtectionError::Parse(e.to_string()))?;

    let kind = match raw.get("type").and_then(|t| t.as_str()) {
        Some(kind) => kind.to_string(),
        None => return Err(ProtectionError::Parse("missing 'type' field".to_string())),
    };

    match serde_json::from_value::<InboundMessage>(raw.clone()) {
        Ok(message) => Ok(Notification { message, raw }),
        Err(e) if matches!(kind.as_str(), "approval_detected" | "freeze_triggered") => {
            Err(ProtectionError::Parse(e.to_string()))
        }
        Err(_) => Err(ProtectionError::Unrecognized(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_approval_detected() {
        let text = r#"{"type":"approval_detected","txHash":"0x1111111111111111111111111111111111111111111111111111111111111111","owner":"0x70997970C51812dc3A010C7d01b50e0d17dc79C8","chainId":11142220}"#;
        let n = decode_notification(text).unwrap();
        match n.message {
            InboundMessage::ApprovalDetected { tx_hash } => {
                assert_eq!(tx_hash, Some(TxHash::repeat_byte(0x11)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(n.raw["type"], "approval_detected");
        assert_eq!(n.raw["chainId"], 11142220);
    }

    #[test]
    fn test_loosely_typed_extras_still_decode() {
        let text = r#"{"type":"approval_detected","txHash":"0x1111111111111111111111111111111111111111111111111111111111111111","chainId":"11142220","owner":42}"#;
        let n = decode_notification(text).unwrap();
        assert_eq!(
            n.message,
            InboundMessage::ApprovalDetected { tx_hash: Some(TxHash::repeat_byte(0x11)) }
        );
        assert_eq!(n.raw["chainId"], "11142220");

        let n = decode_notification(r#"{"type":"freeze_triggered","chains":["Celo","Rari"]}"#).unwrap();
        assert_eq!(n.message, InboundMessage::FreezeTriggered { tx_hash: None });
        assert_eq!(n.raw["chains"][0], "Celo");
    }

    #[test]
    fn test_decode_freeze_without_fields() {
        let n = decode_notification(r#"{"type":"freeze_triggered"}"#).unwrap();
        assert_eq!(n.message.kind(), "freeze_triggered");
    }

    #[test]
    fn test_unknown_type_is_unrecognized() {
        let err = decode_notification(r#"{"type":"heartbeat"}"#).unwrap_err();
        assert!(matches!(err, ProtectionError::Unrecognized(k) if k == "heartbeat"));
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            decode_notification("not json").unwrap_err(),
            ProtectionError::Parse(_)
        ));
        assert!(matches!(
            decode_notification(r#"{"txHash":"0x00"}"#).unwrap_err(),
            ProtectionError::Parse(_)
        ));
        assert!(matches!(
            decode_notification(r#"{"type":"approval_detected","txHash":"zzz"}"#).unwrap_err(),
            ProtectionError::Parse(_)
        ));
    }

    #[test]
    fn test_register_request_shape() {
        let body = serde_json::to_value(RegisterRequest { address: Address::ZERO }).unwrap();
        assert_eq!(body["address"], "0x0000000000000000000000000000000000000000");
    }
}
