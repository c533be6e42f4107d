mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turtle_core::{Account, CoreError, RequestId};
use turtle_race::RaceError;

#[derive(Parser)]
#[command(name = "turtle")]
#[command(about = "Turtle race: double-or-nothing wagers on one of two turtles")]
#[command(version)]
struct Cli {
    /// Data directory for the house database
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the house
    Init {
        /// Owner account, also saved as the default account
        #[arg(long)]
        owner: Account,
        /// Initial pool funding in ETH
        #[arg(long)]
        fund: Option<String>,
        /// Oracle fee per wager in ETH (defaults to 0.1)
        #[arg(long)]
        oracle_fee: Option<String>,
        /// Initial oracle credit in ETH
        #[arg(long)]
        oracle_credit: Option<String>,
    },
    /// Fund the pool
    Fund {
        /// Amount in ETH
        amount: String,
        #[arg(long = "as")]
        account: Option<Account>,
    },
    /// Top up the oracle credit
    FundOracle {
        /// Amount in ETH
        amount: String,
    },
    /// Bet on a turtle
    Gamble {
        /// Turtle to back (1 or 2)
        turtle: u8,
        /// Stake in ETH
        amount: String,
        #[arg(long = "as")]
        account: Option<Account>,
    },
    /// Deliver randomness for a pending request
    Fulfill {
        request_id: RequestId,
        /// Random value (generated if omitted)
        #[arg(long)]
        value: Option<u128>,
    },
    /// Deliver randomness for every pending request
    FulfillAll,
    /// Show the pending bet behind a request
    Bet { request_id: RequestId },
    /// Show pool balances
    Pool,
    /// Show unclaimed winnings
    Due { account: Option<Account> },
    /// Withdraw unclaimed winnings
    Claim {
        #[arg(long = "as")]
        account: Option<Account>,
    },
    /// Withdraw from the pool (owner only)
    RemoveFunds {
        /// Amount in ETH
        amount: String,
        #[arg(long = "as")]
        account: Option<Account>,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List pending bets
    Pending {
        /// Only this bettor's bets
        #[arg(long = "as")]
        account: Option<Account>,
    },
    /// Show event history
    History {
        /// Only events of this kind (Requested, Fulfilled, PoolFunded, FundsClaimed, FundsRemoved)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Show race statistics
    Stats { account: Option<Account> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;
    let config = CliConfig::load(&data_dir)?;

    // Initialize logging
    let log_level = if cli.verbose || config.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "turtle={},turtle_race={},turtle_core={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match cli.command {
        Commands::Init {
            owner,
            fund,
            oracle_fee,
            oracle_credit,
        } => commands::init_house(config, owner, fund, oracle_fee, oracle_credit).await,
        Commands::Fund { amount, account } => {
            commands::fund_pool(&config, &amount, account).await
        }
        Commands::FundOracle { amount } => commands::fund_oracle(&config, &amount).await,
        Commands::Gamble {
            turtle,
            amount,
            account,
        } => commands::gamble(&config, turtle, &amount, account).await,
        Commands::Fulfill { request_id, value } => {
            commands::fulfill(&config, request_id, value).await
        }
        Commands::FulfillAll => commands::fulfill_all(&config).await,
        Commands::Bet { request_id } => commands::show_bet(&config, request_id).await,
        Commands::Pool => commands::show_pool(&config).await,
        Commands::Due { account } => commands::show_due(&config, account).await,
        Commands::Claim { account } => commands::claim(&config, account).await,
        Commands::RemoveFunds {
            amount,
            account,
            yes,
        } => commands::remove_funds(&config, &amount, account, yes).await,
        Commands::Pending { account } => commands::list_pending(&config, account).await,
        Commands::History { kind } => commands::show_history(&config, kind).await,
        Commands::Stats { account } => commands::show_stats(&config, account).await,
    };

    if let Err(e) = result {
        match e {
            RaceError::Core(CoreError::HouseNotFound { path }) => {
                eprintln!("Error: No house at {}", path);
                eprintln!("Use 'turtle init --owner <account>' to create one");
            }
            RaceError::PoolCapExceeded { stake, available } => {
                eprintln!("Error: Cannot bet more than half the pool");
                eprintln!("Stake: {}, Available: {}", stake, available);
            }
            RaceError::InvalidOutcome(selector) => {
                eprintln!("Error: Invalid turtle {}, choose 1 or 2", selector);
            }
            RaceError::NoFundsOwed(account) => {
                eprintln!("Error: {} has no winnings to claim", account);
            }
            RaceError::Unauthorized { caller } => {
                eprintln!("Error: {} is not the house owner", caller);
            }
            RaceError::InsufficientOracleFee { need, available } => {
                eprintln!("Error: Not enough oracle credit");
                eprintln!("Need: {}, Available: {}", need, available);
                eprintln!("Use 'turtle fund-oracle <eth>' to top it up");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
