// token-ledger/src/lib.rs

//! Tiered transfer-and-burn token ledger
//!
//! This crate implements a fungible ledger where every transfer may burn part of the
//! transferred value:
//! - Tier registry: per-account burn fee in basis points, with a default tier
//! - Access gate: blacklist, skip-burn-fee list and a ledger-wide pause flag
//! - Ledger core: balances, total supply and the transfer-with-burn algorithm
//! - Admin controller: a single fixed authority gating every privileged mutation
//!
//! All state is owned by one [`TokenLedger`] instance. Every call either applies fully or
//! fails with no observable mutation.

pub mod access;
pub mod admin;
pub mod call;
pub mod events;
pub mod ledger;
pub mod snapshot;
pub mod tier;
pub mod token;

pub use access::{AccessGate, BlacklistPolicy};
pub use admin::AdminController;
pub use call::{CallOutput, LedgerCall, LedgerCommand, LedgerQuery};
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use ledger::{LedgerCore, TokenMetadata, TransferReceipt};
pub use snapshot::{LedgerSnapshot, LedgerState, SCHEMA_VERSION};
pub use tier::{Tier, TierRegistry, DEFAULT_BURN_FEE_BPS};
pub use token::{LedgerInfo, LedgerSettings, TokenLedger};

use ledger_primitives::{Address, Amount, Hash};
use serde::Serialize;

/// Result type for ledger calls
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reasons a ledger call is rejected
///
/// A rejected call never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind")]
pub enum LedgerError {
    #[error("Ledger is not initialized")]
    NotInitialized,

    #[error("Ledger is already initialized")]
    AlreadyInitialized,

    #[error("Unauthorized: {caller} is not the ledger authority")]
    Unauthorized { caller: Address },

    #[error("Ledger is paused")]
    Paused,

    #[error("Account {account} is blacklisted")]
    Blacklisted { account: Address },

    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },

    #[error("Invalid fee: {fee_bps} bps exceeds 10000")]
    InvalidFee { fee_bps: u16 },
}

/// Result type for snapshot persistence
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors raised while saving or loading a ledger snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported snapshot schema version: expected {expected}, found {found}")]
    SchemaVersion { expected: u32, found: u32 },

    #[error("State root mismatch: recorded {recorded}, computed {computed}")]
    StateRootMismatch { recorded: Hash, computed: Hash },

    #[error("Snapshot state is invalid: {0}")]
    Invalid(#[from] LedgerError),

    #[error("Snapshot state is inconsistent: {0}")]
    Inconsistent(String),

    #[error("Snapshot violates supply conservation")]
    ConservationViolated,
}
