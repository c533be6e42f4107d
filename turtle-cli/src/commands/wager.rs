use super::{open_host, parse_ether};
use crate::config::CliConfig;
use turtle_core::{Account, Amount, RequestId, Turtle};
use turtle_race::{
    CallReceipt, HouseCall, RaceError, Result, Settlement, VrfCoordinator,
};

/// Reject what the house would reject before submitting anything
fn check_wager(selector: u8, stake: Amount, available: Amount) -> Result<Turtle> {
    if stake.is_zero() {
        return Err(RaceError::InvalidStake);
    }
    let turtle = Turtle::try_from(selector).map_err(|_| RaceError::InvalidOutcome(selector))?;
    if stake > available.half() {
        return Err(RaceError::PoolCapExceeded { stake, available });
    }
    Ok(turtle)
}

pub async fn gamble(
    config: &CliConfig,
    selector: u8,
    amount: &str,
    account: Option<Account>,
) -> Result<()> {
    let caller = config.resolve_account(account)?;
    let stake = parse_ether(amount)?;
    let host = open_host(config).await?;

    let turtle = check_wager(selector, stake, host.available_funds_to_gamble().await)?;
    let request_id = host.gamble(&caller, turtle.selector(), stake).await?;

    println!("Bet placed!");
    println!("  Bettor: {}", caller);
    println!("  Turtle: {}", turtle);
    println!("  Stake: {}", stake);
    println!("  Request ID: {}", request_id);
    println!();
    println!("Waiting for the race. Settle it with:");
    println!("turtle fulfill {}", request_id);

    Ok(())
}

pub async fn fulfill(config: &CliConfig, request_id: RequestId, value: Option<u128>) -> Result<()> {
    let host = open_host(config).await?;
    let random_value = value.unwrap_or_else(VrfCoordinator::random_value);

    match host.fulfill_randomness(request_id, random_value).await? {
        Some(settlement) => print_settlement(&settlement),
        None => println!("No pending bet for request {}", request_id),
    }

    Ok(())
}

pub async fn fulfill_all(config: &CliConfig) -> Result<()> {
    let host = open_host(config).await?;
    let pending = host.pending_bets().await;

    if pending.is_empty() {
        println!("No pending bets.");
        return Ok(());
    }

    let calls = pending
        .iter()
        .map(|(request_id, _)| HouseCall::Fulfill {
            request_id: *request_id,
            random_value: VrfCoordinator::random_value(),
        })
        .collect();

    for result in host.submit_batch(calls).await {
        match result {
            Ok(CallReceipt::Settled(Some(settlement))) => print_settlement(&settlement),
            Ok(_) => {}
            Err(e) => eprintln!("Fulfillment failed: {}", e),
        }
    }

    Ok(())
}

pub async fn show_bet(config: &CliConfig, request_id: RequestId) -> Result<()> {
    let host = open_host(config).await?;

    match host.bets(&request_id).await {
        Some(bet) => {
            println!("Bet {}:", request_id.short());
            println!("  Bettor: {}", bet.bettor);
            println!("  Turtle: {}", bet.bet_on);
            println!("  Stake: {}", bet.amount);
        }
        None => println!("No pending bet for request {} (unknown or already settled)", request_id),
    }

    Ok(())
}

pub async fn show_due(config: &CliConfig, account: Option<Account>) -> Result<()> {
    let account = config.resolve_account(account)?;
    let host = open_host(config).await?;

    println!("{} is owed {}", account, host.amount_due(&account).await);

    Ok(())
}

pub async fn claim(config: &CliConfig, account: Option<Account>) -> Result<()> {
    let caller = config.resolve_account(account)?;
    let host = open_host(config).await?;

    let transfer = host.request_funds(&caller).await?;
    println!("Sent {} to {}", transfer.amount, transfer.to);

    Ok(())
}

fn print_settlement(settlement: &Settlement) {
    let event = settlement.event();
    let winner = event
        .winning_turtle()
        .map(|turtle| turtle.to_string())
        .unwrap_or_default();

    println!(
        "Race {} (roll {}): {} won",
        settlement.request_id.short(),
        settlement.roll,
        winner
    );
    if settlement.won {
        println!(
            "  {} wins {}. Claim it with: turtle claim --as {}",
            settlement.bet.bettor, settlement.payout, settlement.bet.bettor
        );
    } else {
        println!(
            "  {} loses {} to the house",
            settlement.bet.bettor, settlement.bet.amount
        );
    }
}
