// fundme - command line host for a FundMe ledger
//
// Keeps accounts, the deployed contract and its price feed in a sled
// store so each invocation runs one transaction against the saved state.

use clap::{Parser, Subcommand};
use fundme::deploy::{DeployEnv, DeployError, Deployer, NetworkConfig, PriceFeedSource, VerificationQueue};
use fundme::identity::{Address, Keypair};
use fundme::ledger::FundMe;
use fundme::oracle::{MockAggregator, OracleError, PriceOracle};
use fundme::runtime::{AccountError, Receipt, Runtime, RuntimeConfig, RuntimeError};
use fundme::storage::{FundStore, StoreError};
use fundme::units::{format_ether, format_units, parse_ether, parse_units, UnitsError};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fundme", version, about = "Fund a ledger with a USD minimum, withdraw as its owner")]
struct Cli {
    /// Directory holding the sled store
    #[arg(long, env = "FUNDME_DATA_DIR", default_value = "fundme-data")]
    data_dir: PathBuf,

    /// Target network (hardhat, localhost, rinkeby)
    #[arg(long, env = "FUNDME_NETWORK", default_value = "hardhat")]
    network: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage local accounts
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },
    /// Deploy FundMe (and a mock price feed on development networks)
    Deploy {
        /// Label of the deploying account; it becomes the owner
        #[arg(long, default_value = "deployer")]
        from: String,
    },
    /// Deposit ether into the ledger
    Fund {
        #[arg(long)]
        from: String,
        /// Amount in ether, e.g. 0.5
        #[arg(long)]
        value: String,
    },
    /// Withdraw the whole balance to the owner
    Withdraw {
        #[arg(long, default_value = "deployer")]
        from: String,
        /// Use the variant that reads the funder list once
        #[arg(long)]
        cheaper: bool,
    },
    /// Inspect or move the mock price feed
    Price {
        #[command(subcommand)]
        action: PriceCommand,
    },
    /// Show the deployment, ledger contents and gas report
    Status,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Create a labelled account
    New {
        label: String,
        /// Starting balance in ether (development networks only)
        #[arg(long, default_value = "10000")]
        balance: String,
    },
    /// List accounts and balances
    List,
}

#[derive(Subcommand, Debug)]
enum PriceCommand {
    /// Print the latest round
    Show,
    /// Report a new USD price for one ether, e.g. 2500.5
    Set { usd: String },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Invalid amount: {0}")]
    Units(#[from] UnitsError),

    #[error("Unknown account label: {0}")]
    UnknownAccount(String),

    #[error("Account label already in use: {0}")]
    DuplicateAccount(String),

    #[error("Nothing deployed on {0}; run `fundme deploy` first")]
    NotDeployed(String),

    #[error("Stored deployment targets {stored}, not {requested}")]
    NetworkMismatch { stored: String, requested: String },

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fundme=info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let network = NetworkConfig::lookup(&cli.network)?;
    let store = FundStore::open(&cli.data_dir)?;

    match cli.command {
        Command::Account { action } => match action {
            AccountCommand::New { label, balance } => new_account(&store, &network, &label, &balance),
            AccountCommand::List => list_accounts(&store),
        },
        Command::Deploy { from } => deploy(&store, &network, &from),
        Command::Fund { from, value } => {
            let sender = account_address(&store, &from)?;
            let amount = parse_ether(&value)?;
            transact(&store, &network, |runtime| runtime.fund(&sender, amount))
        }
        Command::Withdraw { from, cheaper } => {
            let sender = account_address(&store, &from)?;
            transact(&store, &network, |runtime| {
                if cheaper {
                    runtime.cheaper_withdraw(&sender)
                } else {
                    runtime.withdraw(&sender)
                }
            })
        }
        Command::Price { action } => price(&store, &network, action),
        Command::Status => status(&store, &network),
    }
}

// ============================================================================
// ACCOUNTS
// ============================================================================

fn account_address(store: &FundStore, label: &str) -> Result<Address, CliError> {
    store
        .load_keypair(label)?
        .map(|kp| kp.address())
        .ok_or_else(|| CliError::UnknownAccount(label.to_string()))
}

fn new_account(store: &FundStore, network: &NetworkConfig, label: &str, balance: &str) -> Result<(), CliError> {
    if store.load_keypair(label)?.is_some() {
        return Err(CliError::DuplicateAccount(label.to_string()));
    }

    let keypair = Keypair::generate();
    store.save_keypair(label, &keypair)?;

    let mut accounts = store.load_accounts()?;
    if network.is_development() {
        accounts.mint(keypair.address(), parse_ether(balance)?)?;
        store.save_accounts(&accounts)?;
    }
    store.flush()?;

    println!(
        "{}  {}  {} ETH",
        label,
        keypair.address(),
        format_ether(accounts.balance(&keypair.address()))
    );
    Ok(())
}

fn list_accounts(store: &FundStore) -> Result<(), CliError> {
    let accounts = store.load_accounts()?;
    for (label, keypair) in store.list_keypairs()? {
        let address = keypair.address();
        println!(
            "{:<12} {}  {} ETH  nonce {}",
            label,
            address,
            format_ether(accounts.balance(&address)),
            accounts.nonce(&address)
        );
    }
    Ok(())
}

// ============================================================================
// DEPLOYMENT
// ============================================================================

fn deploy(store: &FundStore, network: &NetworkConfig, from: &str) -> Result<(), CliError> {
    let owner = account_address(store, from)?;
    let mut accounts = store.load_accounts()?;

    let mut env = DeployEnv::from_env();
    env.network = network.name.clone();

    let mut deployer = Deployer::new(network.clone(), owner, accounts.nonce(&owner));
    deployer.deploy_mocks();

    let (fund_me, mut deployment) = deployer.deploy_fund_me(&env)?;
    accounts.set_nonce(owner, deployer.nonce());

    let mut verifications = VerificationQueue::new();
    if let Err(e) = deployer.verify_deployment(&env, &mut deployment, &mut verifications) {
        warn!(contract = %deployment.contract, error = %e, "verification not requested");
    }

    if let Some(mock) = deployer.latest_mock() {
        store.save_mock_aggregator(&mock.snapshot())?;
    }
    store.save_deployment(&deployment)?;
    store.save_ledger_state(fund_me.state())?;
    store.save_accounts(&accounts)?;
    store.flush()?;

    for request in verifications.pending() {
        info!(contract = %request.contract, "verification pending submission");
    }

    println!("FundMe deployed at {}", deployment.contract);
    println!("  owner       {}", deployment.owner);
    println!("  price feed  {}", deployment.price_feed.address());
    Ok(())
}

/// Rebuild the runtime and its mock feed from the store
///
/// Live feeds are not reachable from this host, so only mock-bound
/// deployments can be loaded.
fn load_runtime(
    store: &FundStore,
    network: &NetworkConfig,
) -> Result<(Runtime, Arc<MockAggregator>), CliError> {
    let deployment = store
        .load_deployment()?
        .ok_or_else(|| CliError::NotDeployed(network.name.clone()))?;
    if deployment.network != network.name {
        return Err(CliError::NetworkMismatch {
            stored: deployment.network,
            requested: network.name.clone(),
        });
    }

    let mock = match deployment.price_feed {
        PriceFeedSource::Mock(address) => store
            .load_mock_aggregator()?
            .filter(|snapshot| snapshot.address == address)
            .map(|snapshot| Arc::new(MockAggregator::from_snapshot(snapshot)))
            .ok_or(DeployError::FeedUnavailable(address))?,
        PriceFeedSource::Live(address) => return Err(DeployError::FeedUnavailable(address).into()),
    };

    let state = store.load_ledger_state()?.unwrap_or_default();
    let feed: Arc<dyn PriceOracle> = mock.clone();
    let contract = FundMe::from_parts(deployment.owner, feed, state);
    let config = RuntimeConfig::new()
        .with_gas_limit(network.gas_limit)
        .with_gas_price(network.gas_price);

    let runtime = Runtime::new(deployment.contract, contract, store.load_accounts()?, config)
        .with_report(store.load_gas_report()?);
    Ok((runtime, mock))
}

fn save_runtime(store: &FundStore, runtime: &Runtime) -> Result<(), CliError> {
    store.save_ledger_state(runtime.contract().state())?;
    store.save_accounts(runtime.accounts())?;
    store.save_gas_report(runtime.report())?;
    store.flush()?;
    Ok(())
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

fn transact<F>(store: &FundStore, network: &NetworkConfig, call: F) -> Result<(), CliError>
where
    F: FnOnce(&mut Runtime) -> Result<Receipt, RuntimeError>,
{
    let (mut runtime, _) = load_runtime(store, network)?;
    let receipt = call(&mut runtime)?;
    save_runtime(store, &runtime)?;

    println!("{} from {} (nonce {})", receipt.method, receipt.from, receipt.nonce);
    if receipt.value > 0 {
        println!("  value      {} ETH", format_ether(receipt.value));
    }
    if let Some(withdrawn) = receipt.withdrawn {
        println!("  withdrawn  {} ETH", format_ether(withdrawn));
    }
    println!("  gas used   {} ({} ETH)", receipt.gas_used, format_ether(receipt.gas_cost()));
    println!("  ledger     {} ETH", format_ether(runtime.contract().balance()));
    Ok(())
}

fn price(store: &FundStore, network: &NetworkConfig, action: PriceCommand) -> Result<(), CliError> {
    let (runtime, mock) = load_runtime(store, network)?;
    let feed = runtime.contract().price_feed().clone();

    match action {
        PriceCommand::Show => {}
        PriceCommand::Set { usd } => {
            let answer = parse_units(&usd, feed.decimals() as u32)?;
            let answer = i128::try_from(answer).map_err(|_| UnitsError::Overflow)?;
            mock.update_answer(answer);
            store.save_mock_aggregator(&mock.snapshot())?;
            store.flush()?;
        }
    }

    let round = mock.latest_round_data()?;
    println!(
        "{}  round {}  ${}",
        feed.description(),
        round.round_id,
        format_units(round.answer.max(0) as u128, feed.decimals() as u32)
    );
    Ok(())
}

fn status(store: &FundStore, network: &NetworkConfig) -> Result<(), CliError> {
    let (runtime, _) = load_runtime(store, network)?;
    let contract = runtime.contract();

    println!("network     {}", network.name);
    println!("contract    {}", runtime.address());
    println!("owner       {}", contract.owner());
    println!("price feed  {}", contract.price_feed().address());
    println!("balance     {} ETH", format_ether(contract.balance()));
    println!("funders     {}", contract.funder_count());

    let mut contributions: Vec<_> = contract.state().contributions().collect();
    contributions.sort();
    for (funder, amount) in contributions {
        println!("  {}  {} ETH", funder, format_ether(*amount));
    }

    if !runtime.report().is_empty() {
        println!();
        print!("{}", runtime.report().render());
    }
    Ok(())
}
