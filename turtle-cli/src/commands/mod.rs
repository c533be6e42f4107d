pub mod house;
pub mod report;
pub mod wager;

pub use house::{fund_oracle, fund_pool, init_house, remove_funds, show_pool};
pub use report::{list_pending, show_history, show_stats};
pub use wager::{claim, fulfill, fulfill_all, gamble, show_bet, show_due};

use crate::config::CliConfig;
use turtle_core::Amount;
use turtle_race::{RaceHost, Result};

async fn open_host(config: &CliConfig) -> Result<RaceHost> {
    let db_path = config.house_db();
    tracing::debug!("Opening house at {}", db_path.display());
    turtle_race::open_house(&db_path).await
}

fn parse_ether(value: &str) -> Result<Amount> {
    Ok(Amount::from_ether(value)?)
}
