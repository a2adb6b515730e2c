// token-ledger/src/access.rs

use crate::{LedgerError, LedgerResult};
use ledger_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Which side of a transfer the blacklist applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlacklistPolicy {
    /// Only a blacklisted sender is rejected
    #[default]
    SenderOnly,
    /// A blacklisted recipient is rejected too
    SenderAndRecipient,
}

impl FromStr for BlacklistPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sender-only" => Ok(BlacklistPolicy::SenderOnly),
            "sender-and-recipient" => Ok(BlacklistPolicy::SenderAndRecipient),
            other => Err(format!(
                "unknown blacklist policy '{}', expected sender-only or sender-and-recipient",
                other
            )),
        }
    }
}

/// Blacklist, skip-burn-fee list and pause flag
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    pub(crate) blacklist: HashSet<Address>,
    pub(crate) skip_burn_fee: HashSet<Address>,
    pub(crate) paused: bool,
    pub(crate) policy: BlacklistPolicy,
}

impl AccessGate {
    pub fn new(policy: BlacklistPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Check that `account` may act right now
    ///
    /// Privileged callers pass through a pause but never through the blacklist.
    pub fn authorize(&self, account: &Address, is_privileged: bool) -> LedgerResult<()> {
        if self.paused && !is_privileged {
            return Err(LedgerError::Paused);
        }
        if self.blacklist.contains(account) {
            tracing::warn!("Rejected call from blacklisted account {}", account);
            return Err(LedgerError::Blacklisted { account: *account });
        }
        Ok(())
    }

    /// Check a transfer attempt according to the blacklist policy
    pub fn authorize_transfer(
        &self,
        from: &Address,
        to: &Address,
        is_privileged: bool,
    ) -> LedgerResult<()> {
        self.authorize(from, is_privileged)?;

        if self.policy == BlacklistPolicy::SenderAndRecipient && self.blacklist.contains(to) {
            tracing::warn!("Rejected transfer to blacklisted account {}", to);
            return Err(LedgerError::Blacklisted { account: *to });
        }
        Ok(())
    }

    /// Returns true when the account was not listed before
    pub fn add_to_blacklist(&mut self, account: Address) -> bool {
        self.blacklist.insert(account)
    }

    pub fn remove_from_blacklist(&mut self, account: &Address) -> bool {
        self.blacklist.remove(account)
    }

    pub fn add_to_skip_burn_fees_list(&mut self, account: Address) -> bool {
        self.skip_burn_fee.insert(account)
    }

    pub fn remove_from_skip_burn_fees_list(&mut self, account: &Address) -> bool {
        self.skip_burn_fee.remove(account)
    }

    /// Returns true when the flag flipped
    pub fn pause(&mut self) -> bool {
        !std::mem::replace(&mut self.paused, true)
    }

    pub fn unpause(&mut self) -> bool {
        std::mem::replace(&mut self.paused, false)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_blacklisted(&self, account: &Address) -> bool {
        self.blacklist.contains(account)
    }

    pub fn is_skip_burn_fee(&self, account: &Address) -> bool {
        self.skip_burn_fee.contains(account)
    }

    pub fn policy(&self) -> BlacklistPolicy {
        self.policy
    }
}
