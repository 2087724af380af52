//! Error handling for the settlement engine
//!
//! Rejecting a transaction is never an error: it is a normal outcome reported
//! through `Verdict`/`Rejection`. The variants here cover the faults that
//! abort an epoch or a surrounding operation (storage, config, I/O).

use std::fmt;

/// Result type alias for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;

/// Error types for settlement operations
#[derive(Debug, Clone)]
pub enum SettlementError {
    /// Snapshot database errors
    Database(String),
    /// Cryptographic operation errors (key generation, signing)
    Crypto(String),
    /// Errors while building or signing a transaction
    Transaction(String),
    /// Configuration errors
    Config(String),
    /// Serialization/deserialization errors
    Serialization(String),
    /// File I/O errors
    Io(String),
    /// The ledger snapshot itself is inconsistent; the epoch cannot proceed
    LedgerIntegrity(String),
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementError::Database(msg) => write!(f, "Database error: {msg}"),
            SettlementError::Crypto(msg) => write!(f, "Cryptographic error: {msg}"),
            SettlementError::Transaction(msg) => write!(f, "Transaction error: {msg}"),
            SettlementError::Config(msg) => write!(f, "Configuration error: {msg}"),
            SettlementError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            SettlementError::Io(msg) => write!(f, "I/O error: {msg}"),
            SettlementError::LedgerIntegrity(msg) => write!(f, "Ledger integrity violation: {msg}"),
        }
    }
}

impl std::error::Error for SettlementError {}

impl From<std::io::Error> for SettlementError {
    fn from(err: std::io::Error) -> Self {
        SettlementError::Io(err.to_string())
    }
}

impl From<sled::Error> for SettlementError {
    fn from(err: sled::Error) -> Self {
        SettlementError::Database(err.to_string())
    }
}

impl From<bincode::error::EncodeError> for SettlementError {
    fn from(err: bincode::error::EncodeError) -> Self {
        SettlementError::Serialization(err.to_string())
    }
}

impl From<bincode::error::DecodeError> for SettlementError {
    fn from(err: bincode::error::DecodeError) -> Self {
        SettlementError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SettlementError {
    fn from(err: serde_json::Error) -> Self {
        SettlementError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SettlementError {
    fn from(err: toml::de::Error) -> Self {
        SettlementError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SettlementError::LedgerIntegrity("negative output".to_string());
        assert_eq!(err.to_string(), "Ledger integrity violation: negative output");

        let err = SettlementError::Config("bad policy".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad policy");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: SettlementError = io.into();
        assert!(matches!(err, SettlementError::Io(_)));
    }
}
