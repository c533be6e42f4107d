//! Turtle Race core - data model, persistence and configuration
//!
//! Shared by the wagering engine and its frontends: currency amounts,
//! accounts, request ids, bets, house events, and the SQLite store that
//! keeps the house state between runs.

pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod storage;
pub mod types;

pub use config::{HouseConfig, DEFAULT_ORACLE_FEE};
pub use error::{CoreError, Result};
pub use events::{EventRecord, RaceEvent};
pub use state::{HouseState, LedgerBalances};
pub use storage::{EventStore, HouseStore, Storage};
pub use types::{Account, Amount, Bet, RequestId, Turtle, WEI_PER_ETHER};
