// token-ledger/src/events.rs

use ledger_primitives::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Observable side effects of applied calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Initialized {
        authority: Address,
        name: String,
        symbol: String,
        supply: Amount,
    },
    /// `value` is the net amount the recipient received
    Transfer {
        from: Address,
        to: Address,
        value: Amount,
    },
    Burn {
        from: Address,
        value: Amount,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
    BlacklistUpdated {
        account: Address,
        listed: bool,
    },
    SkipBurnFeeUpdated {
        account: Address,
        exempt: bool,
    },
    TierUpdated {
        account: Address,
        fee_bps: u16,
    },
}

/// Event with its position in the ledger's event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: LedgerEvent,
}

/// Pending events awaiting collection by the host
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    next_sequence: u64,
    pending: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume numbering at `next_sequence`
    pub fn starting_at(next_sequence: u64) -> Self {
        Self {
            next_sequence,
            pending: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: LedgerEvent) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(EventRecord { sequence, event });
        sequence
    }

    pub fn pending(&self) -> &[EventRecord] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.pending)
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }
}
