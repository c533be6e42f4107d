use crate::config::HouseConfig;
use crate::types::{Account, Amount, Bet, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balances held by the house, split by what they are earmarked for.
///
/// `available` backs new wagers, `escrowed` holds twice each pending stake,
/// `owed` is unclaimed winnings and `surplus` is currency received outside
/// the funding path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerBalances {
    pub available: Amount,
    pub escrowed: Amount,
    pub owed: Amount,
    pub surplus: Amount,
}

impl LedgerBalances {
    /// Total currency held by the house
    pub fn total(&self) -> Amount {
        self.available
            .saturating_add(self.escrowed)
            .saturating_add(self.owed)
            .saturating_add(self.surplus)
    }
}

/// Everything needed to rebuild a house after a restart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseState {
    pub config: HouseConfig,
    pub ledger: LedgerBalances,
    pub bets: BTreeMap<RequestId, Bet>,
    pub amount_due: BTreeMap<Account, Amount>,
    pub request_nonce: u64,
    pub oracle_credit: Amount,
}

impl HouseState {
    pub fn new(config: HouseConfig) -> Self {
        Self {
            config,
            ledger: LedgerBalances::default(),
            bets: BTreeMap::new(),
            amount_due: BTreeMap::new(),
            request_nonce: 0,
            oracle_credit: Amount::ZERO,
        }
    }
}
