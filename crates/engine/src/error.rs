//! Errors the engine can return.
//!
//! Every failure is surfaced synchronously to the caller; the engine never
//! retries on its own and never leaves a transaction half-applied.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("\"{0}\" still referenced!")]
    Referenced(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Entitlement expired: {0}")]
    EntitlementExpired(String),
    #[error("Entitlement exhausted: {0}")]
    EntitlementExhausted(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidPhone(a), Self::InvalidPhone(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Referenced(a), Self::Referenced(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::EntitlementExpired(a), Self::EntitlementExpired(b)) => a == b,
            (Self::EntitlementExhausted(a), Self::EntitlementExhausted(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
