// token-ledger/src/admin.rs

use crate::{events::LedgerEvent, token::TokenLedger, LedgerError, LedgerResult};
use ledger_primitives::Address;

/// Holder of the single ledger authority
///
/// The authority is fixed by `initialize` and can never change afterwards.
#[derive(Debug, Clone, Default)]
pub struct AdminController {
    authority: Option<Address>,
}

impl AdminController {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_authority(authority: Option<Address>) -> Self {
        Self { authority }
    }

    pub(crate) fn set_authority(&mut self, authority: Address) -> LedgerResult<()> {
        if self.authority.is_some() {
            return Err(LedgerError::AlreadyInitialized);
        }
        self.authority = Some(authority);
        Ok(())
    }

    pub fn authority(&self) -> Option<Address> {
        self.authority
    }

    pub fn is_initialized(&self) -> bool {
        self.authority.is_some()
    }

    pub fn is_authority(&self, caller: &Address) -> bool {
        self.authority.as_ref() == Some(caller)
    }

    pub fn ensure_authority(&self, caller: &Address) -> LedgerResult<()> {
        match self.authority {
            None => Err(LedgerError::NotInitialized),
            Some(authority) if authority == *caller => Ok(()),
            Some(_) => {
                tracing::warn!("Rejected admin call from non-authority {}", caller);
                Err(LedgerError::Unauthorized { caller: *caller })
            }
        }
    }
}

// Privileged mutations. Events are emitted only when state actually changes.
impl TokenLedger {
    pub fn pause(&mut self, caller: Address) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.pause() {
            tracing::info!("Ledger paused by {}", caller);
            self.events.emit(LedgerEvent::Paused { by: caller });
        }
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.unpause() {
            tracing::info!("Ledger unpaused by {}", caller);
            self.events.emit(LedgerEvent::Unpaused { by: caller });
        }
        Ok(())
    }

    pub fn add_to_blacklist(&mut self, caller: Address, account: Address) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.add_to_blacklist(account) {
            tracing::info!("Blacklisted {}", account);
            self.events.emit(LedgerEvent::BlacklistUpdated { account, listed: true });
        }
        Ok(())
    }

    pub fn remove_from_blacklist(&mut self, caller: Address, account: Address) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.remove_from_blacklist(&account) {
            tracing::info!("Removed {} from blacklist", account);
            self.events.emit(LedgerEvent::BlacklistUpdated { account, listed: false });
        }
        Ok(())
    }

    pub fn add_to_skip_burn_fees_list(
        &mut self,
        caller: Address,
        account: Address,
    ) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.add_to_skip_burn_fees_list(account) {
            tracing::info!("Exempted {} from burn fees", account);
            self.events.emit(LedgerEvent::SkipBurnFeeUpdated { account, exempt: true });
        }
        Ok(())
    }

    pub fn remove_from_skip_burn_fees_list(
        &mut self,
        caller: Address,
        account: Address,
    ) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.gate.remove_from_skip_burn_fees_list(&account) {
            tracing::info!("Burn fees apply to {} again", account);
            self.events.emit(LedgerEvent::SkipBurnFeeUpdated { account, exempt: false });
        }
        Ok(())
    }

    pub fn set_tier(
        &mut self,
        caller: Address,
        account: Address,
        fee_bps: u16,
    ) -> LedgerResult<()> {
        self.admin.ensure_authority(&caller)?;
        if self.tiers.set_tier(account, fee_bps)? {
            tracing::info!("Tier of {} set to {} bps", account, fee_bps);
            self.events.emit(LedgerEvent::TierUpdated { account, fee_bps });
        }
        Ok(())
    }
}
