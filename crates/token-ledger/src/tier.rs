// token-ledger/src/tier.rs

use crate::{LedgerError, LedgerResult};
use ledger_primitives::{Address, Amount, MAX_BPS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Burn fee applied to accounts without an explicit tier (0.1%)
pub const DEFAULT_BURN_FEE_BPS: u16 = 10;

/// Burn-fee profile of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Share of every outgoing transfer that is burned (basis points, 0-10000)
    pub transaction_burn_fee_bps: u16,
}

impl Tier {
    pub fn new(transaction_burn_fee_bps: u16) -> LedgerResult<Self> {
        if transaction_burn_fee_bps > MAX_BPS {
            return Err(LedgerError::InvalidFee { fee_bps: transaction_burn_fee_bps });
        }
        Ok(Self { transaction_burn_fee_bps })
    }

    /// Amount burned when `amount` is sent under this tier
    pub fn burn_fee(&self, amount: &Amount) -> Amount {
        amount.bps_share(self.transaction_burn_fee_bps)
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self { transaction_burn_fee_bps: DEFAULT_BURN_FEE_BPS }
    }
}

/// Account to tier mapping with a fallback default tier
#[derive(Debug, Clone)]
pub struct TierRegistry {
    default_tier: Tier,
    tiers: HashMap<Address, Tier>,
}

impl TierRegistry {
    /// Create a registry whose default tier burns `default_fee_bps`
    pub fn new(default_fee_bps: u16) -> LedgerResult<Self> {
        Ok(Self {
            default_tier: Tier::new(default_fee_bps)?,
            tiers: HashMap::new(),
        })
    }

    /// Assign an explicit tier. Returns whether the stored tier changed.
    pub fn set_tier(&mut self, account: Address, fee_bps: u16) -> LedgerResult<bool> {
        let tier = Tier::new(fee_bps)?;
        Ok(self.tiers.insert(account, tier) != Some(tier))
    }

    pub fn get_user_tier(&self, account: &Address) -> Tier {
        self.tiers.get(account).copied().unwrap_or(self.default_tier)
    }

    pub fn fee_for(&self, account: &Address) -> u16 {
        self.get_user_tier(account).transaction_burn_fee_bps
    }

    pub fn has_explicit_tier(&self, account: &Address) -> bool {
        self.tiers.contains_key(account)
    }

    pub fn default_tier(&self) -> Tier {
        self.default_tier
    }

    pub fn explicit_tiers(&self) -> impl Iterator<Item = (&Address, &Tier)> {
        self.tiers.iter()
    }

    pub(crate) fn restore(default_tier: Tier, tiers: HashMap<Address, Tier>) -> LedgerResult<Self> {
        for tier in std::iter::once(&default_tier).chain(tiers.values()) {
            Tier::new(tier.transaction_burn_fee_bps)?;
        }
        Ok(Self { default_tier, tiers })
    }
}

impl Default for TierRegistry {
    fn default() -> Self {
        Self {
            default_tier: Tier::default(),
            tiers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_default_tier() {
        let registry = TierRegistry::default();
        assert_eq!(registry.get_user_tier(&account(1)), Tier { transaction_burn_fee_bps: 10 });
        assert_eq!(registry.fee_for(&account(1)), DEFAULT_BURN_FEE_BPS);
        assert!(!registry.has_explicit_tier(&account(1)));
    }

    #[test]
    fn test_explicit_tier_overrides_default() {
        let mut registry = TierRegistry::default();
        assert!(registry.set_tier(account(1), 250).unwrap());

        assert_eq!(registry.fee_for(&account(1)), 250);
        assert_eq!(registry.fee_for(&account(2)), DEFAULT_BURN_FEE_BPS);
        assert!(registry.has_explicit_tier(&account(1)));
    }

    #[test]
    fn test_set_same_tier_reports_no_change() {
        let mut registry = TierRegistry::default();
        assert!(registry.set_tier(account(1), 0).unwrap());
        assert!(!registry.set_tier(account(1), 0).unwrap());
        assert!(registry.set_tier(account(1), 5).unwrap());
    }

    #[test]
    fn test_invalid_fee_rejected() {
        let mut registry = TierRegistry::default();
        assert_eq!(
            registry.set_tier(account(1), 10_001),
            Err(LedgerError::InvalidFee { fee_bps: 10_001 })
        );
        assert!(!registry.has_explicit_tier(&account(1)));

        // 100% is still a valid tier
        assert!(registry.set_tier(account(1), 10_000).is_ok());
    }

    #[test]
    fn test_custom_default_fee() {
        let registry = TierRegistry::new(100).unwrap();
        assert_eq!(registry.fee_for(&account(9)), 100);
        assert!(TierRegistry::new(20_000).is_err());
    }

    #[test]
    fn test_many_tiers_coexist() {
        let mut registry = TierRegistry::default();
        for n in 1..=5u8 {
            registry.set_tier(account(n), n as u16 * 100).unwrap();
        }
        assert_eq!(registry.explicit_tiers().count(), 5);
        assert_eq!(registry.fee_for(&account(3)), 300);
    }

    #[test]
    fn test_tier_burn_fee() {
        let tier = Tier::new(10).unwrap();
        assert_eq!(tier.burn_fee(&Amount::from_u64(1000)), Amount::from_u64(1));
    }
}
