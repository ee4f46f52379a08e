//! Error taxonomy shared by every simulation component.

use thiserror::Error;

/// Errors reported synchronously by the ledger, allocator, effect engine
/// and session control.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Negative or otherwise out-of-range numeric argument.
    #[error("invalid amount: {0}")]
    InvalidAmount(i64),
    /// Allocation would exceed the raw CPU capacity.
    #[error("insufficient capacity: requested {requested} cpu, only {available} available")]
    InsufficientCapacity { requested: i64, available: i64 },
    /// Allocation target is neither a sentinel nor a known technology.
    #[error("unknown cpu consumer: {0}")]
    UnknownConsumer(String),
    /// Technology is locked by prerequisites or already researched.
    #[error("technology {0} cannot be researched right now")]
    TechUnavailable(String),
    #[error("unknown faction: {0}")]
    UnknownFaction(String),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("unknown facility: {0}")]
    UnknownFacility(u32),
    /// Effect instruction could not be parsed.
    #[error("invalid effect instruction: {0}")]
    InvalidEffect(String),
    /// Malformed or version-mismatched save data.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Fault contained by the safety wrapper.
    #[error("unhandled fault in {operation}: {message}")]
    UnhandledFault { operation: String, message: String },
}
