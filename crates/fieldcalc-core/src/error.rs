//! Error types for fieldcalc
//!
//! The field algebra itself is total: tier mismatches and illegal conversions
//! are rejected by the compiler. Recoverable errors only arise at the
//! boundary helpers that accept runtime data.

use thiserror::Error;

/// Top-level error type for fieldcalc
#[derive(Debug, Error)]
pub enum FieldCalcError {
    #[error("Field error: {0}")]
    Field(#[from] FieldError),

    #[error("Tier error: {0}")]
    Tier(#[from] TierError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),
}

/// Errors related to neighbour data supplied by the message layer
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("Mismatched neighbour data: {ids} ids but {values} values (expected ids + 1)")]
    LengthMismatch { ids: usize, values: usize },

    #[error("Mismatched field data: {ids} ids but {values} neighbour values (expected one per id)")]
    ValueCountMismatch { ids: usize, values: usize },

    #[error("Missing self value")]
    MissingDefault,

    #[error("Neighbour ids not strictly increasing at position {0}")]
    UnsortedIds(usize),
}

/// Errors related to device tiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierError {
    #[error("Tier {0:#x} is not atomic (exactly one bit must be set)")]
    NotAtomic(u32),

    #[error("Tier bit {index} is out of range (tiers_max = {max})")]
    OutOfRange { index: u32, max: u32 },

    #[error("No tier configured for this device")]
    Unconfigured,

    #[error("Invalid tier configuration: {0}")]
    InvalidConfig(String),
}

/// Errors related to encoding values for transmission
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Trailing bytes after value: {0}")]
    TrailingBytes(usize),
}

/// Result type alias using FieldCalcError
pub type FieldCalcResult<T> = Result<T, FieldCalcError>;
