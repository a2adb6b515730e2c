// ledger-primitives/src/lib.rs

//! Primitive types shared by the ledger crates
//!
//! This crate provides:
//! - Account addresses (20 bytes, hex encoded)
//! - Token amounts in base units (arbitrary precision, 18 implied decimals)
//! - SHA-256 hashing for state digests

pub mod address;
pub mod amount;
pub mod hash;

pub use address::Address;
pub use amount::{Amount, DEFAULT_DECIMALS, MAX_BPS};
pub use hash::{Hash, Hashable};

/// Result type for primitive conversions
pub type PrimitivesResult<T> = Result<T, PrimitivesError>;

/// Errors that can occur while parsing or converting primitives
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitivesError {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidAddressLength(usize),

    #[error("Invalid hash length: expected 32 bytes, got {0}")]
    InvalidHashLength(usize),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PrimitivesError::InvalidAddressLength(3);
        assert_eq!(err.to_string(), "Invalid address length: expected 20 bytes, got 3");
    }
}
