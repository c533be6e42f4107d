use super::open_host;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use turtle_core::{Account, RaceEvent};
use turtle_race::Result;

pub async fn list_pending(config: &CliConfig, account: Option<Account>) -> Result<()> {
    let host = open_host(config).await?;
    let pending = match &account {
        Some(bettor) => host.pending_bets_for(bettor).await,
        None => host.pending_bets().await,
    };

    if pending.is_empty() {
        println!("No pending bets.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Request", "Bettor", "Turtle", "Stake"]);

    for (request_id, bet) in pending {
        table.add_row(vec![
            request_id.short(),
            bet.bettor.to_string(),
            bet.bet_on.to_string(),
            bet.amount.to_string(),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub async fn show_history(config: &CliConfig, kind: Option<String>) -> Result<()> {
    let host = open_host(config).await?;
    let history = match kind.as_deref() {
        Some(kind) => host.history_of_kind(kind).await?,
        None => host.history().await?,
    };

    if history.is_empty() {
        println!("No events yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Time", "Event", "Details"]);

    for record in history {
        table.add_row(vec![
            record.seq.to_string(),
            record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            record.event.name().to_string(),
            describe(&record.event),
        ]);
    }

    println!("{}", table);
    Ok(())
}

pub async fn show_stats(config: &CliConfig, account: Option<Account>) -> Result<()> {
    let host = open_host(config).await?;
    let stats = host.race_stats().await?;

    println!("Races run: {}", stats.races);
    match stats.last_winner {
        Some(winner) => {
            println!("Last winner: {}", winner);
            println!("Win streak: {}", stats.win_streak);
        }
        None => println!("No races finished yet."),
    }

    let account = account.or_else(|| config.default_account.clone());
    if let Some(account) = account {
        let player = host.player_stats(&account).await?;
        println!();
        println!("{}:", account);
        println!("  Settled bets: {}", player.settled);
        println!("  Wins: {}", player.wins);
        match player.win_percentage() {
            Some(ratio) => println!("  Win percentage: {:.1}%", ratio * 100.0),
            None => println!("  Win percentage: n/a"),
        }
    }

    Ok(())
}

fn describe(event: &RaceEvent) -> String {
    match event {
        RaceEvent::Requested { request_id, bettor } => {
            format!("{} placed bet {}", bettor, request_id.short())
        }
        RaceEvent::Fulfilled {
            request_id,
            won,
            bettor,
            ..
        } => {
            let winner = event
                .winning_turtle()
                .map(|turtle| turtle.to_string())
                .unwrap_or_default();
            let outcome = if *won { "won" } else { "lost" };
            format!("{} {}, {} {}", request_id.short(), winner, bettor, outcome)
        }
        RaceEvent::PoolFunded { from, amount } => format!("{} added {}", from, amount),
        RaceEvent::FundsClaimed { account, amount } => format!("{} claimed {}", account, amount),
        RaceEvent::FundsRemoved { owner, amount } => format!("{} removed {}", owner, amount),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_core::{Amount, RequestId, Turtle};

    #[test]
    fn test_describe_fulfilled_names_the_winner() {
        let event = RaceEvent::Fulfilled {
            request_id: RequestId::from_bytes([0u8; 32]),
            won: false,
            bet_on: Turtle::One,
            bettor: Account::new("alice").unwrap(),
        };
        let text = describe(&event);
        assert!(text.contains("Turtle 2"));
        assert!(text.ends_with("alice lost"));

        let funded = RaceEvent::PoolFunded {
            from: Account::new("owner").unwrap(),
            amount: Amount::from_wei(1),
        };
        assert!(describe(&funded).starts_with("owner added"));
    }
}
