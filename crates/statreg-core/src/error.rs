//! Shared error type across statreg crates.

use thiserror::Error;

/// Stable reason codes surfaced to hosts and script bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    /// Name already present in the namespace.
    DuplicateName,
    /// Name or handle never created in the namespace.
    UnknownAddress,
    /// Malformed call (empty name, null handle, bad scale).
    InvalidArgument,
    /// Sink reports collection is off.
    CollectionDisabled,
    /// Stop with no matching start.
    EmptyStack,
    /// Cycle stack not empty at a frame boundary.
    UnbalancedStack,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Invalid configuration or replay input.
    BadConfig,
    /// Internal failure (I/O, poisoned lock).
    Internal,
}

impl ReasonCode {
    /// String representation used in logs and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::DuplicateName => "DUPLICATE_NAME",
            ReasonCode::UnknownAddress => "UNKNOWN_ADDRESS",
            ReasonCode::InvalidArgument => "INVALID_ARGUMENT",
            ReasonCode::CollectionDisabled => "COLLECTION_DISABLED",
            ReasonCode::EmptyStack => "EMPTY_STACK",
            ReasonCode::UnbalancedStack => "UNBALANCED_STACK",
            ReasonCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ReasonCode::BadConfig => "BAD_CONFIG",
            ReasonCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatRegError>;

/// Unified error type used by core and host.
#[derive(Debug, Error, PartialEq)]
pub enum StatRegError {
    #[error("duplicate {namespace} name: {name}")]
    DuplicateName { namespace: &'static str, name: String },
    #[error("unknown {namespace} address: {address}")]
    UnknownAddress { namespace: &'static str, address: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("stat collection disabled")]
    CollectionDisabled,
    #[error("cycle counter stack is empty")]
    EmptyStack,
    #[error("cycle counter stack unbalanced at frame boundary (depth={depth})")]
    UnbalancedStack { depth: usize },
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl StatRegError {
    /// Map an error to its stable reason code.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            StatRegError::DuplicateName { .. } => ReasonCode::DuplicateName,
            StatRegError::UnknownAddress { .. } => ReasonCode::UnknownAddress,
            StatRegError::InvalidArgument(_) => ReasonCode::InvalidArgument,
            StatRegError::CollectionDisabled => ReasonCode::CollectionDisabled,
            StatRegError::EmptyStack => ReasonCode::EmptyStack,
            StatRegError::UnbalancedStack { .. } => ReasonCode::UnbalancedStack,
            StatRegError::UnsupportedVersion => ReasonCode::UnsupportedVersion,
            StatRegError::BadConfig(_) => ReasonCode::BadConfig,
            StatRegError::Internal(_) => ReasonCode::Internal,
        }
    }
}
