// ledger-node/src/runtime.rs
use crate::NodeConfig;
use ledger_primitives::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use token_ledger::{
    CallOutput, EventRecord, LedgerCall, LedgerCommand, LedgerError, LedgerInfo, LedgerSnapshot,
    TokenLedger,
};

/// One entry of a call batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub caller: Address,
    pub call: LedgerCall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallOutcome {
    Applied { output: CallOutput },
    Rejected { error: LedgerError },
}

/// What the host reports back for a submitted call
#[derive(Debug, Clone, Serialize)]
pub struct CallReceipt {
    pub caller: Address,
    pub method: &'static str,
    pub outcome: CallOutcome,
    pub events: Vec<EventRecord>,
}

impl CallReceipt {
    pub fn is_applied(&self) -> bool {
        matches!(self.outcome, CallOutcome::Applied { .. })
    }
}

/// Hosts a single ledger instance and serializes access to it
pub struct LedgerRuntime {
    config: NodeConfig,
    ledger: Arc<RwLock<TokenLedger>>,
}

impl LedgerRuntime {
    /// Start from an empty, uninitialized ledger
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        let ledger = TokenLedger::new(config.to_settings())?;
        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(ledger)),
        })
    }

    /// Resume from the configured snapshot, or start empty if there is none
    pub fn open(config: NodeConfig) -> anyhow::Result<Self> {
        let path = config.snapshot_path();
        if !path.exists() {
            tracing::info!("No snapshot at {}, starting empty ledger", path.display());
            return Self::new(config);
        }

        let snapshot = LedgerSnapshot::load(&path)?;
        tracing::info!(
            "Loaded snapshot from {} (saved_at={}, root={})",
            path.display(),
            snapshot.saved_at,
            snapshot.state_root
        );
        // Token settings are fixed at genesis
        let configured = config.to_settings();
        if snapshot.state.settings != configured {
            anyhow::bail!(
                "[token] section of the configuration does not match the snapshot: \
                 configured {:?}, snapshot {:?}",
                configured,
                snapshot.state.settings
            );
        }

        let ledger = snapshot.restore()?;
        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(ledger)),
        })
    }

    /// Create a ledger, run the genesis mint and write the first snapshot
    pub async fn genesis(
        config: NodeConfig,
        authority: Address,
        name: String,
        symbol: String,
        max_supply: Amount,
    ) -> anyhow::Result<Self> {
        let path = config.snapshot_path();
        if path.exists() {
            anyhow::bail!("Snapshot already exists at {}", path.display());
        }

        let runtime = Self::new(config)?;
        let receipt = runtime
            .submit(authority, LedgerCommand::Initialize { name, symbol, max_supply }.into())
            .await?;
        if let CallOutcome::Rejected { error } = receipt.outcome {
            anyhow::bail!("Genesis rejected: {}", error);
        }

        runtime.persist().await?;
        Ok(runtime)
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn ledger(&self) -> Arc<RwLock<TokenLedger>> {
        self.ledger.clone()
    }

    /// Apply one call on behalf of `caller`
    ///
    /// A rejected call is reported in the receipt, not as an error. Errors are reserved for
    /// host failures such as a snapshot that cannot be written.
    pub async fn submit(&self, caller: Address, call: LedgerCall) -> anyhow::Result<CallReceipt> {
        let method = call.method();

        let command = match call {
            LedgerCall::Query(query) => {
                let ledger = self.ledger.read().await;
                return Ok(CallReceipt {
                    caller,
                    method,
                    outcome: CallOutcome::Applied { output: ledger.query(&query) },
                    events: Vec::new(),
                });
            }
            LedgerCall::Command(command) => command,
        };

        let mut ledger = self.ledger.write().await;
        // Restored if the snapshot cannot be written
        let checkpoint = self.config.storage.persist_after_call.then(|| ledger.to_state());

        let outcome = match ledger.apply(caller, command) {
            Ok(output) => {
                if let Some(checkpoint) = checkpoint {
                    if let Err(err) = self.save_snapshot(&ledger) {
                        *ledger = TokenLedger::from_state(checkpoint)?;
                        tracing::error!("{} from {} rolled back: {:#}", method, caller, err);
                        return Err(err.context(format!("{} rolled back", method)));
                    }
                }
                CallOutcome::Applied { output }
            }
            Err(error) => {
                tracing::warn!("{} from {} rejected: {}", method, caller, error);
                CallOutcome::Rejected { error }
            }
        };

        let events = ledger.drain_events();
        for record in &events {
            tracing::debug!("Event #{}: {:?}", record.sequence, record.event);
        }

        Ok(CallReceipt { caller, method, outcome, events })
    }

    /// Apply a batch in order. Rejected calls do not stop the batch.
    pub async fn replay(&self, requests: Vec<CallRequest>) -> anyhow::Result<Vec<CallReceipt>> {
        let mut receipts = Vec::with_capacity(requests.len());
        for request in requests {
            receipts.push(self.submit(request.caller, request.call).await?);
        }

        let rejected = receipts.iter().filter(|r| !r.is_applied()).count();
        tracing::info!("Replayed {} calls ({} rejected)", receipts.len(), rejected);
        Ok(receipts)
    }

    /// Write a snapshot of the current state
    pub async fn persist(&self) -> anyhow::Result<()> {
        let ledger = self.ledger.read().await;
        self.save_snapshot(&ledger)
    }

    pub async fn info(&self) -> LedgerInfo {
        self.ledger.read().await.info()
    }

    /// Display decimals of the hosted token
    pub async fn decimals(&self) -> u8 {
        self.ledger.read().await.decimals()
    }

    pub async fn check_conservation(&self) -> bool {
        self.ledger.read().await.check_conservation()
    }

    fn save_snapshot(&self, ledger: &TokenLedger) -> anyhow::Result<()> {
        LedgerSnapshot::capture(ledger)?.save(self.config.snapshot_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use token_ledger::LedgerQuery;

    fn account(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn config_in(dir: &TempDir) -> NodeConfig {
        NodeConfig {
            data_dir: dir.path().to_string_lossy().into_owned(),
            ..NodeConfig::default()
        }
    }

    async fn genesis_runtime(dir: &TempDir) -> LedgerRuntime {
        LedgerRuntime::genesis(
            config_in(dir),
            account(1),
            "Test".into(),
            "TST".into(),
            Amount::from_u64(1_000_000),
        )
        .await
        .unwrap()
    }

    fn transfer(to: Address, amount: u64) -> LedgerCall {
        LedgerCommand::Transfer { to, amount: Amount::from_u64(amount) }.into()
    }

    #[tokio::test]
    async fn test_genesis_writes_snapshot() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        assert!(runtime.config().snapshot_path().exists());
        let info = runtime.info().await;
        assert_eq!(info.authority, Some(account(1)));
        assert_eq!(info.total_supply, Amount::from_u64(1_000_000));
    }

    #[tokio::test]
    async fn test_genesis_refuses_existing_snapshot() {
        let dir = TempDir::new().unwrap();
        genesis_runtime(&dir).await;

        let second = LedgerRuntime::genesis(
            config_in(&dir),
            account(2),
            "Other".into(),
            "OTH".into(),
            Amount::from_u64(1),
        )
        .await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_submit_reports_events() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        let receipt = runtime.submit(account(1), transfer(account(2), 1000)).await.unwrap();
        assert!(receipt.is_applied());
        assert_eq!(receipt.method, "transfer");
        assert_eq!(receipt.events.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_call_is_reported() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        let receipt = runtime.submit(account(2), LedgerCommand::Pause.into()).await.unwrap();
        assert_eq!(
            receipt.outcome,
            CallOutcome::Rejected { error: LedgerError::Unauthorized { caller: account(2) } }
        );
        assert!(receipt.events.is_empty());
        assert!(!runtime.info().await.paused);
    }

    #[tokio::test]
    async fn test_query_before_initialize() {
        let dir = TempDir::new().unwrap();
        let runtime = LedgerRuntime::new(config_in(&dir)).unwrap();

        let receipt = runtime.submit(account(1), LedgerQuery::TotalSupply.into()).await.unwrap();
        assert_eq!(
            receipt.outcome,
            CallOutcome::Applied { output: CallOutput::Amount(Amount::zero()) }
        );
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let runtime = genesis_runtime(&dir).await;
            runtime.submit(account(1), transfer(account(2), 1000)).await.unwrap();
            runtime
                .submit(account(1), LedgerCommand::AddToBlacklist { account: account(3) }.into())
                .await
                .unwrap();
        }

        let reopened = LedgerRuntime::open(config_in(&dir)).unwrap();
        let ledger = reopened.ledger();
        let ledger = ledger.read().await;
        assert_eq!(ledger.balance_of(&account(2)), Amount::from_u64(999));
        assert!(ledger.is_blacklisted(&account(3)));
    }

    #[tokio::test]
    async fn test_replay_continues_after_rejection() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        let batch: Vec<CallRequest> = serde_json::from_str(&format!(
            r#"[
                {{"caller":"{a}","call":{{"method":"transfer","to":"{b}","amount":"1000"}}}},
                {{"caller":"{b}","call":{{"method":"pause"}}}},
                {{"caller":"{b}","call":{{"method":"balance_of","account":"{b}"}}}}
            ]"#,
            a = account(1),
            b = account(2)
        ))
        .unwrap();

        let receipts = runtime.replay(batch).await.unwrap();
        assert_eq!(receipts.len(), 3);
        assert!(receipts[0].is_applied());
        assert!(!receipts[1].is_applied());
        assert_eq!(
            receipts[2].outcome,
            CallOutcome::Applied { output: CallOutput::Amount(Amount::from_u64(999)) }
        );
    }

    #[tokio::test]
    async fn test_concurrent_submitters_are_serialized() {
        let dir = TempDir::new().unwrap();
        let runtime = Arc::new(genesis_runtime(&dir).await);

        let handles: Vec<_> = (2u8..12)
            .map(|n| {
                let runtime = runtime.clone();
                tokio::spawn(async move {
                    runtime.submit(account(1), transfer(account(n), 1000)).await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().unwrap().is_applied());
        }

        let info = runtime.info().await;
        assert_eq!(info.total_burned, Amount::from_u64(10));
        assert_eq!(info.total_supply, Amount::from_u64(999_990));
        assert!(runtime.check_conservation().await);
    }

    #[tokio::test]
    async fn test_failed_snapshot_write_rolls_back_call() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        // A non-empty directory in place of the snapshot makes the rename fail
        let path = runtime.config().snapshot_path();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("blocker"), b"x").unwrap();

        let result = runtime.submit(account(1), transfer(account(2), 1000)).await;
        assert!(result.is_err());
        {
            let ledger = runtime.ledger();
            let ledger = ledger.read().await;
            assert_eq!(ledger.balance_of(&account(2)), Amount::zero());
            assert_eq!(ledger.balance_of(&account(1)), Amount::from_u64(1_000_000));
            assert_eq!(ledger.total_burned(), Amount::zero());
            assert!(ledger.events().is_empty());
        }

        // Once the snapshot can be written again the same call applies with the same numbering
        std::fs::remove_dir_all(&path).unwrap();
        let receipt = runtime.submit(account(1), transfer(account(2), 1000)).await.unwrap();
        assert!(receipt.is_applied());
        assert_eq!(receipt.events.len(), 2);
        assert_eq!(receipt.events[0].sequence, 1);
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_rejections_reported() {
        let dir = TempDir::new().unwrap();
        let runtime = genesis_runtime(&dir).await;

        let path = runtime.config().snapshot_path();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("blocker"), b"x").unwrap();

        // Rejected calls write nothing, so they still produce a receipt
        let receipt = runtime.submit(account(2), LedgerCommand::Pause.into()).await.unwrap();
        assert!(!receipt.is_applied());
    }

    #[tokio::test]
    async fn test_open_rejects_changed_token_settings() {
        let dir = TempDir::new().unwrap();
        genesis_runtime(&dir).await;

        let mut decimals_changed = config_in(&dir);
        decimals_changed.token.decimals = 6;
        assert!(LedgerRuntime::open(decimals_changed).is_err());

        let mut fee_changed = config_in(&dir);
        fee_changed.token.default_burn_fee_bps = 0;
        assert!(LedgerRuntime::open(fee_changed).is_err());

        // Storage settings may change freely
        let mut storage_changed = config_in(&dir);
        storage_changed.storage.persist_after_call = false;
        let runtime = LedgerRuntime::open(storage_changed).unwrap();
        assert_eq!(runtime.decimals().await, 18);
    }

    #[tokio::test]
    async fn test_decimals_follow_hosted_ledger() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.token.decimals = 6;

        let runtime = LedgerRuntime::genesis(
            config.clone(),
            account(1),
            "Six".into(),
            "SIX".into(),
            Amount::from_u64(1_000_000),
        )
        .await
        .unwrap();
        assert_eq!(runtime.decimals().await, 6);
        assert_eq!(LedgerRuntime::open(config).unwrap().decimals().await, 6);
    }
}
