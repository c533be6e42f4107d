//! Double-or-nothing turtle race wagering
//!
//! A bettor picks one of two turtles and stakes an amount. The house escrows
//! twice the stake, asks an oracle for randomness, and when the value arrives
//! either credits the bettor with double their stake or returns the escrow to
//! the pool. Winners claim their credit later with `request_funds`.

pub mod contract;
pub mod dues;
pub mod error;
pub mod host;
pub mod ledger;
pub mod randomness;
pub mod registry;
pub mod settlement;
pub mod stats;
pub mod withdrawal;

pub use contract::TurtleRace;
pub use dues::AmountDue;
pub use error::{RaceError, Result};
pub use host::{CallReceipt, HouseCall, RaceHost};
pub use ledger::FundsLedger;
pub use randomness::{bettor_wins, roll, RandomnessSource, VrfCoordinator};
pub use registry::BetRegistry;
pub use settlement::{Settlement, SettlementEngine};
pub use stats::{PlayerStats, RaceStats};
pub use withdrawal::{Transfer, WithdrawalGate};

use std::path::Path;
use std::sync::Arc;
use turtle_core::{HouseConfig, Storage};

/// Create a persisted house at `db_path` backed by the local coordinator
pub async fn create_house(db_path: &Path, config: HouseConfig) -> Result<RaceHost> {
    let storage = Arc::new(Storage::new(db_path).await?);
    RaceHost::create(storage, config, Arc::new(VrfCoordinator::new())).await
}

/// Open the house previously created at `db_path`
pub async fn open_house(db_path: &Path) -> Result<RaceHost> {
    RaceHost::open_path(db_path, Arc::new(VrfCoordinator::new())).await
}
