//! Error types for ssz_tree

use thiserror::Error;

/// Result type alias for ssz_tree operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, navigating or decoding trees and views
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Unsupported mutation: {0}")]
    UnsupportedMutation(String),

    #[error("Type {0} has a dynamic byte length")]
    LengthIsDynamic(String),

    #[error("Too many nodes: {count} do not fit in a tree of depth {depth}")]
    TooManyNodes { count: u64, depth: u32 },

    #[error("Limit exceeded: length {length} is above limit {limit}")]
    LimitExceeded { length: u64, limit: u64 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

impl Error {
    pub(crate) fn navigation(msg: impl Into<String>) -> Self {
        Error::Navigation(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::debug!(reason = %msg, "rejecting input");
        Error::Decode(msg)
    }
}
