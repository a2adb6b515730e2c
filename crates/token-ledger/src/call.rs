// token-ledger/src/call.rs

//! Serializable call surface
//!
//! Hosts submit `(caller, LedgerCall)` pairs. Queries never mutate and never fail;
//! commands go through the same checks as the typed methods on [`TokenLedger`].

use crate::{
    ledger::TransferReceipt,
    tier::Tier,
    token::{LedgerInfo, TokenLedger},
    LedgerResult,
};
use ledger_primitives::{Address, Amount};
use serde::{Deserialize, Serialize};

/// Read-only calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LedgerQuery {
    BalanceOf { account: Address },
    TotalSupply,
    TotalBurned,
    Name,
    Symbol,
    Decimals,
    Authority,
    IsPaused,
    IsBlacklisted { account: Address },
    IsSkipBurnFee { account: Address },
    GetUserTier { account: Address },
    Info,
}

/// State-changing calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum LedgerCommand {
    Initialize {
        name: String,
        symbol: String,
        max_supply: Amount,
    },
    /// The sender is always the caller
    Transfer { to: Address, amount: Amount },
    Pause,
    Unpause,
    AddToBlacklist { account: Address },
    RemoveFromBlacklist { account: Address },
    AddToSkipBurnFeesList { account: Address },
    RemoveFromSkipBurnFeesList { account: Address },
    SetTier { account: Address, fee_bps: u16 },
}

/// Any call accepted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LedgerCall {
    Query(LedgerQuery),
    Command(LedgerCommand),
}

impl LedgerCall {
    /// Whether the call needs exclusive access to the ledger
    pub fn is_mutating(&self) -> bool {
        matches!(self, LedgerCall::Command(_))
    }

    pub fn method(&self) -> &'static str {
        match self {
            LedgerCall::Query(query) => match query {
                LedgerQuery::BalanceOf { .. } => "balance_of",
                LedgerQuery::TotalSupply => "total_supply",
                LedgerQuery::TotalBurned => "total_burned",
                LedgerQuery::Name => "name",
                LedgerQuery::Symbol => "symbol",
                LedgerQuery::Decimals => "decimals",
                LedgerQuery::Authority => "authority",
                LedgerQuery::IsPaused => "is_paused",
                LedgerQuery::IsBlacklisted { .. } => "is_blacklisted",
                LedgerQuery::IsSkipBurnFee { .. } => "is_skip_burn_fee",
                LedgerQuery::GetUserTier { .. } => "get_user_tier",
                LedgerQuery::Info => "info",
            },
            LedgerCall::Command(command) => match command {
                LedgerCommand::Initialize { .. } => "initialize",
                LedgerCommand::Transfer { .. } => "transfer",
                LedgerCommand::Pause => "pause",
                LedgerCommand::Unpause => "unpause",
                LedgerCommand::AddToBlacklist { .. } => "add_to_blacklist",
                LedgerCommand::RemoveFromBlacklist { .. } => "remove_from_blacklist",
                LedgerCommand::AddToSkipBurnFeesList { .. } => "add_to_skip_burn_fees_list",
                LedgerCommand::RemoveFromSkipBurnFeesList { .. } => {
                    "remove_from_skip_burn_fees_list"
                }
                LedgerCommand::SetTier { .. } => "set_tier",
            },
        }
    }
}

impl From<LedgerQuery> for LedgerCall {
    fn from(query: LedgerQuery) -> Self {
        LedgerCall::Query(query)
    }
}

impl From<LedgerCommand> for LedgerCall {
    fn from(command: LedgerCommand) -> Self {
        LedgerCall::Command(command)
    }
}

/// Value returned by a successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CallOutput {
    /// Command applied, nothing to return
    Done,
    Amount(Amount),
    Text(Option<String>),
    Decimals(u8),
    Account(Option<Address>),
    Flag(bool),
    Tier(Tier),
    Transfer(TransferReceipt),
    Info(LedgerInfo),
}

impl TokenLedger {
    /// Dispatch any call on behalf of `caller`
    pub fn execute(&mut self, caller: Address, call: LedgerCall) -> LedgerResult<CallOutput> {
        match call {
            LedgerCall::Query(query) => Ok(self.query(&query)),
            LedgerCall::Command(command) => self.apply(caller, command),
        }
    }

    pub fn query(&self, query: &LedgerQuery) -> CallOutput {
        match query {
            LedgerQuery::BalanceOf { account } => CallOutput::Amount(self.balance_of(account)),
            LedgerQuery::TotalSupply => CallOutput::Amount(self.total_supply()),
            LedgerQuery::TotalBurned => CallOutput::Amount(self.total_burned()),
            LedgerQuery::Name => CallOutput::Text(self.name().map(str::to_string)),
            LedgerQuery::Symbol => CallOutput::Text(self.symbol().map(str::to_string)),
            LedgerQuery::Decimals => CallOutput::Decimals(self.decimals()),
            LedgerQuery::Authority => CallOutput::Account(self.authority()),
            LedgerQuery::IsPaused => CallOutput::Flag(self.is_paused()),
            LedgerQuery::IsBlacklisted { account } => {
                CallOutput::Flag(self.is_blacklisted(account))
            }
            LedgerQuery::IsSkipBurnFee { account } => {
                CallOutput::Flag(self.is_skip_burn_fee(account))
            }
            LedgerQuery::GetUserTier { account } => CallOutput::Tier(self.get_user_tier(account)),
            LedgerQuery::Info => CallOutput::Info(self.info()),
        }
    }

    pub fn apply(&mut self, caller: Address, command: LedgerCommand) -> LedgerResult<CallOutput> {
        match command {
            LedgerCommand::Initialize { name, symbol, max_supply } => {
                self.initialize(caller, name, symbol, max_supply)?;
            }
            LedgerCommand::Transfer { to, amount } => {
                return self.transfer(caller, to, amount).map(CallOutput::Transfer);
            }
            LedgerCommand::Pause => self.pause(caller)?,
            LedgerCommand::Unpause => self.unpause(caller)?,
            LedgerCommand::AddToBlacklist { account } => self.add_to_blacklist(caller, account)?,
            LedgerCommand::RemoveFromBlacklist { account } => {
                self.remove_from_blacklist(caller, account)?
            }
            LedgerCommand::AddToSkipBurnFeesList { account } => {
                self.add_to_skip_burn_fees_list(caller, account)?
            }
            LedgerCommand::RemoveFromSkipBurnFeesList { account } => {
                self.remove_from_skip_burn_fees_list(caller, account)?
            }
            LedgerCommand::SetTier { account, fee_bps } => self.set_tier(caller, account, fee_bps)?,
        }
        Ok(CallOutput::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{token::LedgerSettings, LedgerError};

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    #[test]
    fn test_parse_command_json() {
        let json = r#"{"method":"transfer","to":"0x0202020202020202020202020202020202020202","amount":"1000"}"#;
        let call: LedgerCall = serde_json::from_str(json).unwrap();

        assert_eq!(
            call,
            LedgerCall::Command(LedgerCommand::Transfer {
                to: account(2),
                amount: Amount::from_u64(1000),
            })
        );
        assert!(call.is_mutating());
        assert_eq!(call.method(), "transfer");
    }

    #[test]
    fn test_parse_query_json() {
        let call: LedgerCall = serde_json::from_str(r#"{"method":"total_supply"}"#).unwrap();
        assert_eq!(call, LedgerCall::Query(LedgerQuery::TotalSupply));
        assert!(!call.is_mutating());

        let call: LedgerCall = serde_json::from_str(r#"{"method":"pause"}"#).unwrap();
        assert_eq!(call, LedgerCall::Command(LedgerCommand::Pause));
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(serde_json::from_str::<LedgerCall>(r#"{"method":"mint"}"#).is_err());
    }

    #[test]
    fn test_execute_roundtrip() {
        let mut ledger = TokenLedger::new(LedgerSettings::default()).unwrap();
        let init = LedgerCommand::Initialize {
            name: "Test".into(),
            symbol: "TST".into(),
            max_supply: Amount::from_u64(10_000),
        };
        assert_eq!(ledger.execute(account(1), init.into()), Ok(CallOutput::Done));

        let transfer = LedgerCommand::Transfer {
            to: account(2),
            amount: Amount::from_u64(1000),
        };
        let output = ledger.execute(account(1), transfer.into()).unwrap();
        match output {
            CallOutput::Transfer(receipt) => assert_eq!(receipt.net_amount, Amount::from_u64(999)),
            other => panic!("unexpected output {:?}", other),
        }

        assert_eq!(
            ledger.execute(account(3), LedgerQuery::BalanceOf { account: account(2) }.into()),
            Ok(CallOutput::Amount(Amount::from_u64(999)))
        );
        assert_eq!(
            ledger.execute(account(3), LedgerQuery::Symbol.into()),
            Ok(CallOutput::Text(Some("TST".into())))
        );
    }

    #[test]
    fn test_execute_surfaces_specific_error() {
        let mut ledger = TokenLedger::new(LedgerSettings::default()).unwrap();
        ledger.initialize(account(1), "Test", "TST", Amount::from_u64(100)).unwrap();

        assert_eq!(
            ledger.execute(account(2), LedgerCommand::Pause.into()),
            Err(LedgerError::Unauthorized { caller: account(2) })
        );
    }

    #[test]
    fn test_output_json_shape() {
        let json = serde_json::to_value(CallOutput::Flag(true)).unwrap();
        assert_eq!(json["kind"], "flag");
        assert_eq!(json["value"], true);
    }
}
