use crate::types::{Account, Amount, RequestId, Turtle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notifications emitted by the house for frontends and indexers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RaceEvent {
    Requested {
        request_id: RequestId,
        bettor: Account,
    },
    Fulfilled {
        request_id: RequestId,
        won: bool,
        bet_on: Turtle,
        bettor: Account,
    },
    PoolFunded {
        from: Account,
        amount: Amount,
    },
    FundsClaimed {
        account: Account,
        amount: Amount,
    },
    FundsRemoved {
        owner: Account,
        amount: Amount,
    },
}

impl RaceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RaceEvent::Requested { .. } => "Requested",
            RaceEvent::Fulfilled { .. } => "Fulfilled",
            RaceEvent::PoolFunded { .. } => "PoolFunded",
            RaceEvent::FundsClaimed { .. } => "FundsClaimed",
            RaceEvent::FundsRemoved { .. } => "FundsRemoved",
        }
    }

    /// The turtle that crossed the line first, for `Fulfilled` events
    pub fn winning_turtle(&self) -> Option<Turtle> {
        match self {
            RaceEvent::Fulfilled { won, bet_on, .. } => {
                Some(if *won { *bet_on } else { bet_on.other() })
            }
            _ => None,
        }
    }
}

/// A persisted event with its position in the house history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub seq: i64,
    pub event: RaceEvent,
    pub created_at: DateTime<Utc>,
}
