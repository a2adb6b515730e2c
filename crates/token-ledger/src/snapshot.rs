// token-ledger/src/snapshot.rs

use crate::{
    access::AccessGate,
    admin::AdminController,
    events::EventLog,
    ledger::{LedgerCore, TokenMetadata},
    tier::{Tier, TierRegistry},
    token::{LedgerSettings, TokenLedger},
    SnapshotError, SnapshotResult,
};
use ledger_primitives::{Address, Amount, Hash, Hashable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Snapshot layout version, bumped on any incompatible change to [`LedgerState`]
pub const SCHEMA_VERSION: u32 = 1;

/// Complete ledger state in canonical (address-sorted) form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub settings: LedgerSettings,
    pub authority: Option<Address>,
    pub metadata: Option<TokenMetadata>,
    pub balances: BTreeMap<Address, Amount>,
    pub total_supply: Amount,
    pub initial_supply: Amount,
    pub total_burned: Amount,
    pub paused: bool,
    pub blacklist: BTreeSet<Address>,
    pub skip_burn_fee: BTreeSet<Address>,
    pub default_tier: Tier,
    pub tiers: BTreeMap<Address, Tier>,
    pub next_event_sequence: u64,
}

impl LedgerState {
    /// SHA-256 over the bincode encoding
    pub fn state_root(&self) -> SnapshotResult<Hash> {
        let bytes = bincode::serialize(self)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        Ok(bytes.hash())
    }
}

impl TokenLedger {
    /// Export the state in canonical form. Pending events are not part of it.
    pub fn to_state(&self) -> LedgerState {
        LedgerState {
            settings: self.settings.clone(),
            authority: self.admin.authority(),
            metadata: self.core.metadata.clone(),
            balances: self.core.balances.iter().map(|(a, b)| (*a, b.clone())).collect(),
            total_supply: self.core.total_supply.clone(),
            initial_supply: self.core.initial_supply.clone(),
            total_burned: self.core.total_burned.clone(),
            paused: self.gate.paused,
            blacklist: self.gate.blacklist.iter().copied().collect(),
            skip_burn_fee: self.gate.skip_burn_fee.iter().copied().collect(),
            default_tier: self.tiers.default_tier(),
            tiers: self.tiers.explicit_tiers().map(|(a, t)| (*a, *t)).collect(),
            next_event_sequence: self.events.next_sequence(),
        }
    }

    /// Rebuild a ledger from exported state
    pub fn from_state(state: LedgerState) -> SnapshotResult<Self> {
        let mut core = LedgerCore::new(state.settings.decimals);
        core.metadata = state.metadata;
        core.balances = state
            .balances
            .into_iter()
            .filter(|(_, balance)| !balance.is_zero())
            .collect();
        core.total_supply = state.total_supply;
        core.initial_supply = state.initial_supply;
        core.total_burned = state.total_burned;

        if core.is_initialized() != state.authority.is_some() {
            return Err(SnapshotError::Inconsistent(
                "authority and metadata must be present together".into(),
            ));
        }
        if let Some(metadata) = core.metadata() {
            if metadata.decimals != state.settings.decimals {
                return Err(SnapshotError::Inconsistent(format!(
                    "token decimals {} differ from settings decimals {}",
                    metadata.decimals, state.settings.decimals
                )));
            }
        }
        if !core.check_conservation() {
            return Err(SnapshotError::ConservationViolated);
        }

        let mut gate = AccessGate::new(state.settings.blacklist_policy);
        gate.paused = state.paused;
        gate.blacklist = state.blacklist.into_iter().collect();
        gate.skip_burn_fee = state.skip_burn_fee.into_iter().collect();

        let tiers = TierRegistry::restore(state.default_tier, state.tiers.into_iter().collect())?;

        Ok(Self {
            settings: state.settings,
            core,
            gate,
            tiers,
            admin: AdminController::with_authority(state.authority),
            events: EventLog::starting_at(state.next_event_sequence),
        })
    }
}

/// Versioned, self-verifying image of a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub schema_version: u32,
    /// Unix seconds
    pub saved_at: i64,
    pub state_root: Hash,
    pub state: LedgerState,
}

impl LedgerSnapshot {
    pub fn capture(ledger: &TokenLedger) -> SnapshotResult<Self> {
        let state = ledger.to_state();
        Ok(Self {
            schema_version: SCHEMA_VERSION,
            saved_at: chrono::Utc::now().timestamp(),
            state_root: state.state_root()?,
            state,
        })
    }

    /// Check schema version and state root
    pub fn verify(&self) -> SnapshotResult<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(SnapshotError::SchemaVersion {
                expected: SCHEMA_VERSION,
                found: self.schema_version,
            });
        }

        let computed = self.state.state_root()?;
        if computed != self.state_root {
            return Err(SnapshotError::StateRootMismatch {
                recorded: self.state_root,
                computed,
            });
        }
        Ok(())
    }

    pub fn restore(self) -> SnapshotResult<TokenLedger> {
        self.verify()?;
        TokenLedger::from_state(self.state)
    }

    /// Write as pretty JSON through a temporary file and rename
    pub fn save(&self, path: impl AsRef<Path>) -> SnapshotResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;

        tracing::debug!("Snapshot saved to {} (root {})", path.display(), self.state_root);
        Ok(())
    }

    /// Read and verify a snapshot file
    pub fn load(path: impl AsRef<Path>) -> SnapshotResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let snapshot: Self = serde_json::from_str(&contents)
            .map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        snapshot.verify()?;
        Ok(snapshot)
    }
}
