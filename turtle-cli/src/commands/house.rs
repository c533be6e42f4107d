use super::{open_host, parse_ether};
use crate::config::CliConfig;
use dialoguer::Confirm;
use turtle_core::{Account, CoreError, HouseConfig};
use turtle_race::Result;

pub async fn init_house(
    mut config: CliConfig,
    owner: Account,
    fund: Option<String>,
    oracle_fee: Option<String>,
    oracle_credit: Option<String>,
) -> Result<()> {
    let mut house_config = HouseConfig::new(owner.clone());
    if let Some(fee) = oracle_fee {
        house_config = house_config.with_oracle_fee(parse_ether(&fee)?);
    }
    let fee = house_config.oracle_fee;

    let db_path = config.house_db();
    if db_path.exists() {
        return Err(CoreError::config(format!(
            "A house already exists at {}",
            db_path.display()
        ))
        .into());
    }

    let host = turtle_race::create_house(&db_path, house_config).await?;
    if let Some(credit) = oracle_credit {
        host.fund_oracle(parse_ether(&credit)?).await?;
    }
    if let Some(amount) = fund {
        host.fund_pool(&owner, parse_ether(&amount)?).await?;
    }

    config.default_account = Some(owner.clone());
    config.save()?;

    let state = host.state().await;
    println!("House created!");
    println!("  House ID: {}", state.config.house_id);
    println!("  Owner: {}", owner);
    println!("  Oracle fee: {}", fee);
    println!("  Oracle credit: {}", state.oracle_credit);
    println!("  Available to gamble: {}", state.ledger.available);
    println!("  Database: {}", db_path.display());

    Ok(())
}

pub async fn fund_pool(config: &CliConfig, amount: &str, account: Option<Account>) -> Result<()> {
    let from = config.resolve_account(account)?;
    let amount = parse_ether(amount)?;
    let host = open_host(config).await?;

    host.fund_pool(&from, amount).await?;
    println!("{} funded the pool with {}", from, amount);
    println!("Available to gamble: {}", host.available_funds_to_gamble().await);

    Ok(())
}

pub async fn fund_oracle(config: &CliConfig, amount: &str) -> Result<()> {
    let amount = parse_ether(amount)?;
    let host = open_host(config).await?;

    host.fund_oracle(amount).await?;
    let state = host.state().await;
    let wagers = match state.config.oracle_fee.to_wei() {
        0 => None,
        fee => Some(state.oracle_credit.to_wei() / fee),
    };

    println!("Oracle credit: {}", state.oracle_credit);
    if let Some(wagers) = wagers {
        println!("Enough for {} more wagers", wagers);
    }

    Ok(())
}

pub async fn show_pool(config: &CliConfig) -> Result<()> {
    let host = open_host(config).await?;
    let state = host.state().await;
    let ledger = state.ledger;

    println!("House owned by {}", state.config.owner);
    println!("  Available to gamble: {}", ledger.available);
    println!("  Largest accepted stake: {}", ledger.available.half());
    println!("  Escrowed for pending bets: {}", ledger.escrowed);
    println!("  Owed to winners: {}", ledger.owed);
    if !ledger.surplus.is_zero() {
        println!("  Plain transfers: {}", ledger.surplus);
    }
    println!("  Total balance: {}", ledger.total());
    println!(
        "  Oracle credit: {} (fee {})",
        state.oracle_credit, state.config.oracle_fee
    );
    println!("  Pending bets: {}", state.bets.len());

    Ok(())
}

pub async fn remove_funds(
    config: &CliConfig,
    amount: &str,
    account: Option<Account>,
    yes: bool,
) -> Result<()> {
    let caller = config.resolve_account(account)?;
    let amount = parse_ether(amount)?;
    let host = open_host(config).await?;

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!("Remove {} from the pool?", amount))
            .default(false)
            .interact()
            .map_err(CoreError::from)?;

        if !confirm {
            println!("Withdrawal cancelled.");
            return Ok(());
        }
    }

    let transfer = host.remove_funds(&caller, amount).await?;

    println!("Sent {} to {}", transfer.amount, transfer.to);
    println!("Available to gamble: {}", host.available_funds_to_gamble().await);

    Ok(())
}
