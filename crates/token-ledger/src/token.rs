// token-ledger/src/token.rs

use crate::{
    access::{AccessGate, BlacklistPolicy},
    admin::AdminController,
    events::{EventLog, EventRecord, LedgerEvent},
    ledger::{LedgerCore, TransferReceipt},
    tier::{Tier, TierRegistry, DEFAULT_BURN_FEE_BPS},
    LedgerError, LedgerResult,
};
use ledger_primitives::{Address, Amount, DEFAULT_DECIMALS};
use serde::{Deserialize, Serialize};

/// Construction-time ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Display decimals of the token
    pub decimals: u8,
    /// Burn fee of accounts without an explicit tier
    pub default_burn_fee_bps: u16,
    pub blacklist_policy: BlacklistPolicy,
    /// Whether the authority may still transfer while the ledger is paused
    pub authority_bypasses_pause: bool,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            decimals: DEFAULT_DECIMALS as u8,
            default_burn_fee_bps: DEFAULT_BURN_FEE_BPS,
            blacklist_policy: BlacklistPolicy::SenderOnly,
            authority_bypasses_pause: true,
        }
    }
}

/// Summary of the ledger's public state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub initialized: bool,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: u8,
    pub authority: Option<Address>,
    pub total_supply: Amount,
    pub total_burned: Amount,
    pub initial_supply: Amount,
    pub paused: bool,
    pub holders: usize,
    pub default_tier: Tier,
    pub blacklist_policy: BlacklistPolicy,
}

/// The ledger instance: every component plus the event log
#[derive(Debug, Clone)]
pub struct TokenLedger {
    pub(crate) settings: LedgerSettings,
    pub(crate) core: LedgerCore,
    pub(crate) gate: AccessGate,
    pub(crate) tiers: TierRegistry,
    pub(crate) admin: AdminController,
    pub(crate) events: EventLog,
}

impl TokenLedger {
    /// Create an uninitialized ledger
    pub fn new(settings: LedgerSettings) -> LedgerResult<Self> {
        Ok(Self {
            core: LedgerCore::new(settings.decimals),
            gate: AccessGate::new(settings.blacklist_policy),
            tiers: TierRegistry::new(settings.default_burn_fee_bps)?,
            admin: AdminController::new(),
            events: EventLog::new(),
            settings,
        })
    }

    /// One-time genesis: `caller` becomes the authority and receives `max_supply`
    pub fn initialize(
        &mut self,
        caller: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        max_supply: Amount,
    ) -> LedgerResult<()> {
        if self.admin.is_initialized() || self.core.is_initialized() {
            return Err(LedgerError::AlreadyInitialized);
        }

        let name = name.into();
        let symbol = symbol.into();
        self.core.initialize(caller, name.clone(), symbol.clone(), max_supply.clone())?;
        self.admin.set_authority(caller)?;

        tracing::info!(
            "Ledger initialized: {} ({}) supply={} authority={}",
            name,
            symbol,
            max_supply,
            caller
        );
        self.events.emit(LedgerEvent::Initialized {
            authority: caller,
            name,
            symbol,
            supply: max_supply,
        });
        Ok(())
    }

    /// Transfer `amount` from `caller` to `to`, burning the caller's tier fee
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
    ) -> LedgerResult<TransferReceipt> {
        if !self.is_initialized() {
            return Err(LedgerError::NotInitialized);
        }

        let privileged = self.settings.authority_bypasses_pause && self.admin.is_authority(&caller);
        self.gate.authorize_transfer(&caller, &to, privileged)?;

        let fee_bps = if self.gate.is_skip_burn_fee(&caller) {
            0
        } else {
            self.tiers.fee_for(&caller)
        };

        let receipt = self.core.apply_transfer(&caller, &to, &amount, fee_bps)?;

        tracing::debug!(
            "Transfer {} -> {}: amount={} net={} burned={} ({} bps)",
            caller,
            to,
            receipt.amount,
            receipt.net_amount,
            receipt.burned,
            fee_bps
        );
        self.events.emit(LedgerEvent::Transfer {
            from: caller,
            to,
            value: receipt.net_amount.clone(),
        });
        if !receipt.burned.is_zero() {
            self.events.emit(LedgerEvent::Burn {
                from: caller,
                value: receipt.burned.clone(),
            });
        }
        Ok(receipt)
    }

    // ==================== READS ====================

    pub fn is_initialized(&self) -> bool {
        self.admin.is_initialized()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.core.balance_of(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.core.total_supply().clone()
    }

    pub fn total_burned(&self) -> Amount {
        self.core.total_burned().clone()
    }

    pub fn name(&self) -> Option<&str> {
        self.core.metadata().map(|m| m.name.as_str())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.core.metadata().map(|m| m.symbol.as_str())
    }

    pub fn decimals(&self) -> u8 {
        self.core.decimals()
    }

    pub fn authority(&self) -> Option<Address> {
        self.admin.authority()
    }

    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    pub fn is_blacklisted(&self, account: &Address) -> bool {
        self.gate.is_blacklisted(account)
    }

    pub fn is_skip_burn_fee(&self, account: &Address) -> bool {
        self.gate.is_skip_burn_fee(account)
    }

    pub fn get_user_tier(&self, account: &Address) -> Tier {
        self.tiers.get_user_tier(account)
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub fn check_conservation(&self) -> bool {
        self.core.check_conservation()
    }

    pub fn info(&self) -> LedgerInfo {
        LedgerInfo {
            initialized: self.is_initialized(),
            name: self.name().map(str::to_string),
            symbol: self.symbol().map(str::to_string),
            decimals: self.decimals(),
            authority: self.authority(),
            total_supply: self.total_supply(),
            total_burned: self.total_burned(),
            initial_supply: self.core.initial_supply().clone(),
            paused: self.is_paused(),
            holders: self.core.holder_count(),
            default_tier: self.tiers.default_tier(),
            blacklist_policy: self.gate.policy(),
        }
    }

    // ==================== EVENTS ====================

    pub fn events(&self) -> &[EventRecord] {
        self.events.pending()
    }

    pub fn drain_events(&mut self) -> Vec<EventRecord> {
        self.events.drain()
    }
}
