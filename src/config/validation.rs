//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Chain table integrity (non-empty, unique ids, parseable URLs and addresses)
//! - Value ranges (timeouts > 0, capacity > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DrillConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;

use alloy::primitives::Address;

use crate::config::schema::DrillConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DrillConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.chains.is_empty() {
        errors.push(ValidationError::new("chains", "at least one chain is required"));
    }

    let mut seen = HashSet::new();
    for (i, chain) in config.chains.iter().enumerate() {
        let field = format!("chains[{}]", i);
        if !seen.insert(chain.chain_id) {
            errors.push(ValidationError::new(
                format!("{}.chain_id", field),
                format!("duplicate chain id {}", chain.chain_id),
            ));
        }
        if chain.name.trim().is_empty() {
            errors.push(ValidationError::new(format!("{}.name", field), "must not be empty"));
        }
        if let Err(e) = chain.rpc_url.parse::<url::Url>() {
            errors.push(ValidationError::new(
                format!("{}.rpc_url", field),
                format!("invalid URL '{}': {}", chain.rpc_url, e),
            ));
        }
        if chain.token_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                format!("{}.token_address", field),
                format!("invalid address '{}'", chain.token_address),
            ));
        }
    }

    if config.attacker.secret_env.trim().is_empty() {
        errors.push(ValidationError::new("attacker.secret_env", "must not be empty"));
    }

    if let Err(e) = config.protection.base_url.parse::<url::Url>() {
        errors.push(ValidationError::new("protection.base_url", e.to_string()));
    }
    match config.protection.ws_url.parse::<url::Url>() {
        Ok(url) if url.scheme() == "ws" || url.scheme() == "wss" => {}
        Ok(url) => errors.push(ValidationError::new(
            "protection.ws_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("protection.ws_url", e.to_string())),
    }

    let positive = [
        ("protection.request_timeout_secs", config.protection.request_timeout_secs),
        ("drain.rpc_timeout_secs", config.drain.rpc_timeout_secs),
        ("drain.receipt_timeout_secs", config.drain.receipt_timeout_secs),
        ("drain.receipt_poll_ms", config.drain.receipt_poll_ms),
        ("approval.poll_interval_ms", config.approval.poll_interval_ms),
        ("approval.confirmation_timeout_secs", config.approval.confirmation_timeout_secs),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.events.capacity == 0 {
        errors.push(ValidationError::new("events.capacity", "must be greater than zero"));
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'pretty' or 'json', got '{}'", other),
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
