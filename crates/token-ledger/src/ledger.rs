// token-ledger/src/ledger.rs

use crate::{LedgerError, LedgerResult};
use ledger_primitives::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive token metadata fixed at initialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Outcome of an applied transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    /// Amount debited from the sender
    pub amount: Amount,
    /// Amount credited to the recipient
    pub net_amount: Amount,
    /// Amount removed from total supply
    pub burned: Amount,
    /// Fee rate the burn was computed with
    pub fee_bps: u16,
}

/// Balances and supply accounting
#[derive(Debug, Clone)]
pub struct LedgerCore {
    pub(crate) metadata: Option<TokenMetadata>,
    /// Zero balances are never stored
    pub(crate) balances: HashMap<Address, Amount>,
    pub(crate) total_supply: Amount,
    pub(crate) initial_supply: Amount,
    pub(crate) total_burned: Amount,
    decimals: u8,
}

impl LedgerCore {
    /// Create an empty, uninitialized ledger
    pub fn new(decimals: u8) -> Self {
        Self {
            metadata: None,
            balances: HashMap::new(),
            total_supply: Amount::zero(),
            initial_supply: Amount::zero(),
            total_burned: Amount::zero(),
            decimals,
        }
    }

    /// Genesis mint: the whole supply goes to `authority`
    pub fn initialize(
        &mut self,
        authority: Address,
        name: String,
        symbol: String,
        max_supply: Amount,
    ) -> LedgerResult<()> {
        if self.metadata.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }

        self.metadata = Some(TokenMetadata {
            name,
            symbol,
            decimals: self.decimals,
        });
        self.set_balance(authority, max_supply.clone());
        self.initial_supply = max_supply.clone();
        self.total_supply = max_supply;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).cloned().unwrap_or_else(Amount::zero)
    }

    pub fn total_supply(&self) -> &Amount {
        &self.total_supply
    }

    pub fn total_burned(&self) -> &Amount {
        &self.total_burned
    }

    pub fn initial_supply(&self) -> &Amount {
        &self.initial_supply
    }

    pub fn metadata(&self) -> Option<&TokenMetadata> {
        self.metadata.as_ref()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Number of accounts holding a non-zero balance
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Move `amount` from `from` to `to`, burning `floor(amount * fee_bps / 10000)`
    ///
    /// Every check runs before the first write, so an error leaves the ledger untouched.
    pub fn apply_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Amount,
        fee_bps: u16,
    ) -> LedgerResult<TransferReceipt> {
        let from_balance = self.balance_of(from);
        let remaining = from_balance.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientBalance {
                have: from_balance.clone(),
                need: amount.clone(),
            }
        })?;

        let burned = amount.bps_share(fee_bps);
        let net_amount = amount
            .checked_sub(&burned)
            .ok_or(LedgerError::InvalidFee { fee_bps })?;

        self.set_balance(*from, remaining);
        // Read after the debit so a self-transfer nets out correctly
        let credited = self.balance_of(to) + net_amount.clone();
        self.set_balance(*to, credited);

        self.total_supply = self.total_supply.saturating_sub(&burned);
        self.total_burned = self.total_burned.clone() + burned.clone();

        Ok(TransferReceipt {
            from: *from,
            to: *to,
            amount: amount.clone(),
            net_amount,
            burned,
            fee_bps,
        })
    }

    /// `sum(balances) + burned == initial` and `initial - burned == supply`
    pub fn check_conservation(&self) -> bool {
        let held: Amount = self.balances.values().sum();
        let accounted = held + self.total_burned.clone();
        let remaining = self.initial_supply.checked_sub(&self.total_burned);
        accounted == self.initial_supply && remaining.as_ref() == Some(&self.total_supply)
    }

    fn set_balance(&mut self, account: Address, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }
}

impl Default for LedgerCore {
    fn default() -> Self {
        Self::new(ledger_primitives::DEFAULT_DECIMALS as u8)
    }
}
