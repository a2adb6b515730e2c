// ledger-node/src/main.rs
use clap::{Args, Parser, Subcommand};
use ledger_node::{config::TokenConfig, CallRequest, LedgerRuntime, NodeConfig};
use ledger_primitives::{Address, Amount};
use token_ledger::{BlacklistPolicy, LedgerCall, LedgerCommand, LedgerQuery, DEFAULT_BURN_FEE_BPS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ledger-node")]
#[command(about = "Tiered transfer-and-burn token ledger", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a data directory with a config file and a genesis snapshot
    Init {
        /// Data directory
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Account that receives the supply and becomes the authority
        #[arg(short, long)]
        authority: Address,

        /// Token name
        #[arg(long)]
        name: String,

        /// Token symbol
        #[arg(long)]
        symbol: String,

        #[command(flatten)]
        supply: SupplyArgs,

        #[command(flatten)]
        token: TokenArgs,
    },

    /// Run a single call against the ledger
    Call {
        /// Configuration file path
        #[arg(short, long, default_value = "./data/config.toml")]
        config: String,

        /// Account issuing the call
        #[arg(long)]
        caller: Address,

        #[command(subcommand)]
        command: CallCommands,
    },

    /// Apply a JSON array of `{caller, call}` entries in order
    Replay {
        /// Configuration file path
        #[arg(short, long, default_value = "./data/config.toml")]
        config: String,

        /// Path to the call batch
        #[arg(long)]
        calls: String,
    },

    /// Show ledger status
    Status {
        /// Configuration file path
        #[arg(short, long, default_value = "./data/config.toml")]
        config: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SupplyArgs {
    /// Total supply in base units
    #[arg(long)]
    max_supply: Option<Amount>,

    /// Total supply in whole tokens, e.g. 100000
    #[arg(long)]
    max_supply_tokens: Option<String>,
}

/// Token settings, fixed once the genesis snapshot is written
#[derive(Args)]
struct TokenArgs {
    /// Display decimals
    #[arg(long, default_value_t = 18)]
    decimals: u8,

    /// Burn fee of accounts without an explicit tier (basis points)
    #[arg(long, default_value_t = DEFAULT_BURN_FEE_BPS)]
    default_burn_fee_bps: u16,

    /// sender-only or sender-and-recipient
    #[arg(long, default_value = "sender-only")]
    blacklist_policy: BlacklistPolicy,

    /// Whether the authority may transfer while paused
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    authority_bypasses_pause: bool,
}

impl From<TokenArgs> for TokenConfig {
    fn from(args: TokenArgs) -> Self {
        TokenConfig {
            decimals: args.decimals,
            default_burn_fee_bps: args.default_burn_fee_bps,
            blacklist_policy: args.blacklist_policy,
            authority_bypasses_pause: args.authority_bypasses_pause,
        }
    }
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AmountArgs {
    /// Amount in base units
    #[arg(long)]
    amount: Option<Amount>,

    /// Amount in tokens, e.g. 39.96
    #[arg(long)]
    tokens: Option<String>,
}

#[derive(Subcommand)]
enum CallCommands {
    /// Balance of an account
    BalanceOf { account: Address },

    /// Current total supply
    TotalSupply,

    /// Transfer from the caller
    Transfer {
        /// Recipient
        #[arg(long)]
        to: Address,

        #[command(flatten)]
        amount: AmountArgs,
    },

    /// Pause transfers
    Pause,

    /// Resume transfers
    Unpause,

    /// Add an account to the blacklist
    BlacklistAdd { account: Address },

    /// Remove an account from the blacklist
    BlacklistRemove { account: Address },

    /// Exempt an account from burn fees
    SkipAdd { account: Address },

    /// Subject an account to burn fees again
    SkipRemove { account: Address },

    /// Burn-fee tier of an account
    GetTier { account: Address },

    /// Assign a burn-fee tier
    SetTier {
        account: Address,

        /// Burn fee (basis points)
        #[arg(long)]
        fee_bps: u16,
    },

    /// Full ledger summary
    Info,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ledger_node={0},token_ledger={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Init { data_dir, authority, name, symbol, supply, token } => {
            init_ledger(data_dir, authority, name, symbol, supply, token.into()).await?;
        }
        Commands::Call { config, caller, command } => {
            run_call(&config, caller, command).await?;
        }
        Commands::Replay { config, calls } => {
            replay_calls(&config, &calls).await?;
        }
        Commands::Status { config } => {
            show_status(&config).await?;
        }
    }

    Ok(())
}

async fn init_ledger(
    data_dir: String,
    authority: Address,
    name: String,
    symbol: String,
    supply: SupplyArgs,
    token: TokenConfig,
) -> anyhow::Result<()> {
    tracing::info!("Initializing ledger at {}", data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let config = NodeConfig {
        data_dir: data_dir.clone(),
        token,
        ..NodeConfig::default()
    };
    let max_supply = resolve_amount(
        supply.max_supply,
        supply.max_supply_tokens,
        config.token.decimals,
    )?;

    let config_path = format!("{}/config.toml", data_dir);
    config.to_file(&config_path)?;

    let runtime = LedgerRuntime::genesis(config, authority, name, symbol, max_supply).await?;
    let info = runtime.info().await;

    tracing::info!("Genesis snapshot written to {}", runtime.config().snapshot_path().display());
    tracing::info!(
        "Config written to {}. The [token] section is fixed by the genesis snapshot, \
         only [storage] may be edited",
        config_path
    );
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

async fn run_call(config_path: &str, caller: Address, command: CallCommands) -> anyhow::Result<()> {
    let config = NodeConfig::from_file(config_path)?;
    let runtime = LedgerRuntime::open(config)?;

    let call = to_ledger_call(command, runtime.decimals().await)?;
    let mutating = call.is_mutating();
    let receipt = runtime.submit(caller, call).await?;
    if mutating && receipt.is_applied() && !runtime.config().storage.persist_after_call {
        runtime.persist().await?;
    }
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}

async fn replay_calls(config_path: &str, calls_path: &str) -> anyhow::Result<()> {
    let config = NodeConfig::from_file(config_path)?;
    let runtime = LedgerRuntime::open(config)?;

    let contents = std::fs::read_to_string(calls_path)?;
    let requests: Vec<CallRequest> = serde_json::from_str(&contents)?;
    tracing::info!("Replaying {} calls from {}", requests.len(), calls_path);

    let receipts = runtime.replay(requests).await?;
    if !runtime.config().storage.persist_after_call {
        runtime.persist().await?;
    }
    println!("{}", serde_json::to_string_pretty(&receipts)?);
    Ok(())
}

async fn show_status(config_path: &str) -> anyhow::Result<()> {
    let config = NodeConfig::from_file(config_path)?;
    let runtime = LedgerRuntime::open(config)?;

    let info = runtime.info().await;
    let conserved = runtime.check_conservation().await;
    if !conserved {
        tracing::warn!("Supply conservation does not hold");
    }

    let supply_tokens = info.total_supply.to_token_string(info.decimals as u32);
    let status = serde_json::json!({
        "info": info,
        "conservation_holds": conserved,
        "total_supply_tokens": supply_tokens,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn resolve_amount(
    units: Option<Amount>,
    tokens: Option<String>,
    decimals: u8,
) -> anyhow::Result<Amount> {
    match (units, tokens) {
        (Some(units), _) => Ok(units),
        (None, Some(tokens)) => Ok(Amount::parse_tokens(&tokens, decimals as u32)?),
        (None, None) => anyhow::bail!("An amount is required"),
    }
}

fn to_ledger_call(command: CallCommands, decimals: u8) -> anyhow::Result<LedgerCall> {
    let call: LedgerCall = match command {
        CallCommands::BalanceOf { account } => LedgerQuery::BalanceOf { account }.into(),
        CallCommands::TotalSupply => LedgerQuery::TotalSupply.into(),
        CallCommands::Transfer { to, amount } => {
            let amount = resolve_amount(amount.amount, amount.tokens, decimals)?;
            LedgerCommand::Transfer { to, amount }.into()
        }
        CallCommands::Pause => LedgerCommand::Pause.into(),
        CallCommands::Unpause => LedgerCommand::Unpause.into(),
        CallCommands::BlacklistAdd { account } => LedgerCommand::AddToBlacklist { account }.into(),
        CallCommands::BlacklistRemove { account } => {
            LedgerCommand::RemoveFromBlacklist { account }.into()
        }
        CallCommands::SkipAdd { account } => {
            LedgerCommand::AddToSkipBurnFeesList { account }.into()
        }
        CallCommands::SkipRemove { account } => {
            LedgerCommand::RemoveFromSkipBurnFeesList { account }.into()
        }
        CallCommands::GetTier { account } => LedgerQuery::GetUserTier { account }.into(),
        CallCommands::SetTier { account, fee_bps } => {
            LedgerCommand::SetTier { account, fee_bps }.into()
        }
        CallCommands::Info => LedgerQuery::Info.into(),
    };
    Ok(call)
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORITY: &str = "0x0101010101010101010101010101010101010101";

    #[test]
    fn test_init_token_flags() {
        let cli = Cli::try_parse_from([
            "ledger-node",
            "init",
            "--authority",
            AUTHORITY,
            "--name",
            "Six",
            "--symbol",
            "SIX",
            "--max-supply-tokens",
            "1000",
            "--decimals",
            "6",
            "--default-burn-fee-bps",
            "25",
            "--blacklist-policy",
            "sender-and-recipient",
            "--authority-bypasses-pause",
            "false",
        ])
        .unwrap();

        let Commands::Init { token, .. } = cli.command else {
            panic!("expected init");
        };
        let token = TokenConfig::from(token);
        assert_eq!(token.decimals, 6);
        assert_eq!(token.default_burn_fee_bps, 25);
        assert_eq!(token.blacklist_policy, BlacklistPolicy::SenderAndRecipient);
        assert!(!token.authority_bypasses_pause);
    }

    #[test]
    fn test_init_defaults_match_node_config() {
        let cli = Cli::try_parse_from([
            "ledger-node",
            "init",
            "--authority",
            AUTHORITY,
            "--name",
            "T",
            "--symbol",
            "T",
            "--max-supply",
            "100",
        ])
        .unwrap();

        let Commands::Init { token, .. } = cli.command else {
            panic!("expected init");
        };
        assert_eq!(TokenConfig::from(token), NodeConfig::default().token);
    }

    #[test]
    fn test_tokens_scale_with_ledger_decimals() {
        let command = CallCommands::Transfer {
            to: Address::zero(),
            amount: AmountArgs { amount: None, tokens: Some("1".into()) },
        };
        match to_ledger_call(command, 6).unwrap() {
            LedgerCall::Command(LedgerCommand::Transfer { amount, .. }) => {
                assert_eq!(amount, Amount::from_u64(1_000_000))
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}
