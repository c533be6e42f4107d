use crate::dues::AmountDue;
use crate::ledger::FundsLedger;
use crate::randomness::RandomnessSource;
use crate::registry::BetRegistry;
use crate::settlement::{Settlement, SettlementEngine};
use crate::withdrawal::{Transfer, WithdrawalGate};
use crate::{RaceError, Result};
use std::sync::Arc;
use turtle_core::{
    Account, Amount, Bet, HouseConfig, HouseState, LedgerBalances, RaceEvent, RequestId, Turtle,
};

/// The wagering house: ledger, pending bets and unclaimed winnings.
///
/// Every mutating call validates before it changes anything, so a call
/// either applies completely or returns an error with the house untouched.
/// Events emitted by successful calls queue up until `take_events`.
#[derive(Clone)]
pub struct TurtleRace {
    config: HouseConfig,
    ledger: FundsLedger,
    registry: BetRegistry,
    dues: AmountDue,
    request_nonce: u64,
    oracle_credit: Amount,
    randomness: Arc<dyn RandomnessSource>,
    events: Vec<RaceEvent>,
}

impl TurtleRace {
    pub fn new(config: HouseConfig, randomness: Arc<dyn RandomnessSource>) -> Result<Self> {
        Self::from_state(HouseState::new(config), randomness)
    }

    pub fn from_state(state: HouseState, randomness: Arc<dyn RandomnessSource>) -> Result<Self> {
        state.config.validate()?;

        Ok(Self {
            config: state.config,
            ledger: FundsLedger::from_balances(state.ledger),
            registry: BetRegistry::from_bets(state.bets),
            dues: AmountDue::from_map(state.amount_due),
            request_nonce: state.request_nonce,
            oracle_credit: state.oracle_credit,
            randomness,
            events: Vec::new(),
        })
    }

    pub fn state(&self) -> HouseState {
        HouseState {
            config: self.config.clone(),
            ledger: self.ledger.balances(),
            bets: self.registry.to_map(),
            amount_due: self.dues.to_map(),
            request_nonce: self.request_nonce,
            oracle_credit: self.oracle_credit,
        }
    }

    pub fn config(&self) -> &HouseConfig {
        &self.config
    }

    pub fn owner(&self) -> &Account {
        &self.config.owner
    }

    pub fn available_funds_to_gamble(&self) -> Amount {
        self.ledger.available_to_gamble()
    }

    pub fn max_stake(&self) -> Amount {
        self.ledger.max_stake()
    }

    /// Everything the house holds, including escrow and unclaimed winnings
    pub fn balance(&self) -> Amount {
        self.ledger.total_balance()
    }

    pub fn balances(&self) -> LedgerBalances {
        self.ledger.balances()
    }

    pub fn amount_due(&self, account: &Account) -> Amount {
        self.dues.get(account)
    }

    /// The pending bet behind a request; `None` once settled or if unknown
    pub fn bets(&self, request_id: &RequestId) -> Option<&Bet> {
        self.registry.get(request_id)
    }

    pub fn pending_bets(&self) -> impl Iterator<Item = (&RequestId, &Bet)> {
        self.registry.iter()
    }

    pub fn pending_bets_for<'a>(
        &'a self,
        bettor: &'a Account,
    ) -> impl Iterator<Item = (&'a RequestId, &'a Bet)> {
        self.registry.pending_for(bettor)
    }

    pub fn oracle_credit(&self) -> Amount {
        self.oracle_credit
    }

    pub fn request_nonce(&self) -> u64 {
        self.request_nonce
    }

    /// Funding path: the amount becomes available to back wagers
    pub fn fund_pool(&mut self, from: &Account, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Err(RaceError::InvalidAmount("funding must be greater than zero".to_string()));
        }

        self.ledger.fund(amount)?;
        self.events.push(RaceEvent::PoolFunded {
            from: from.clone(),
            amount,
        });

        tracing::info!("{} funded the pool with {}", from, amount);
        Ok(())
    }

    /// Plain transfer: raises the balance without touching the pool
    pub fn receive(&mut self, amount: Amount) -> Result<()> {
        self.ledger.receive(amount)?;
        tracing::debug!("Received {} outside the funding path", amount);
        Ok(())
    }

    /// Top up the credit used to pay for randomness requests
    pub fn fund_oracle(&mut self, amount: Amount) -> Result<()> {
        self.oracle_credit = self
            .oracle_credit
            .checked_add(amount)
            .ok_or(RaceError::Overflow("funding oracle credit"))?;
        Ok(())
    }

    /// Wager with a raw turtle selector as submitted by a frontend
    pub fn gamble(&mut self, caller: &Account, selector: u8, stake: Amount) -> Result<RequestId> {
        if stake.is_zero() {
            return Err(RaceError::InvalidStake);
        }

        let turtle = Turtle::try_from(selector).map_err(|_| RaceError::InvalidOutcome(selector))?;
        self.place_bet(caller, turtle, stake)
    }

    /// Accept a wager, reserve its stake and request randomness for it
    pub fn place_bet(&mut self, caller: &Account, turtle: Turtle, stake: Amount) -> Result<RequestId> {
        if stake.is_zero() {
            return Err(RaceError::InvalidStake);
        }

        let fee = self.config.oracle_fee;
        let oracle_credit = self
            .oracle_credit
            .checked_sub(fee)
            .ok_or(RaceError::InsufficientOracleFee {
                need: fee,
                available: self.oracle_credit,
            })?;

        self.ledger.check_reservation(stake)?;

        let request_id =
            self.randomness
                .request_randomness(&self.config, caller, self.request_nonce)?;
        if self.registry.contains(&request_id) {
            return Err(RaceError::DuplicateRequest(request_id));
        }
        let next_nonce = self
            .request_nonce
            .checked_add(1)
            .ok_or(RaceError::Overflow("advancing request nonce"))?;

        self.ledger.reserve_stake(stake)?;
        self.registry.insert(
            request_id,
            Bet {
                amount: stake,
                bet_on: turtle,
                bettor: caller.clone(),
            },
        )?;
        self.oracle_credit = oracle_credit;
        self.request_nonce = next_nonce;
        self.events.push(RaceEvent::Requested {
            request_id,
            bettor: caller.clone(),
        });

        tracing::info!(
            "{} bet {} on {} (request {})",
            caller,
            stake,
            turtle,
            request_id
        );
        Ok(request_id)
    }

    /// Randomness callback. Unknown or already settled requests are ignored.
    pub fn fulfill_randomness(
        &mut self,
        request_id: &RequestId,
        random_value: u128,
    ) -> Option<Settlement> {
        let settlement = SettlementEngine::resolve(
            &mut self.ledger,
            &mut self.registry,
            &mut self.dues,
            request_id,
            random_value,
        )?;

        self.events.push(settlement.event());
        Some(settlement)
    }

    /// Pay the caller all of their unclaimed winnings
    pub fn request_funds(&mut self, caller: &Account) -> Result<Transfer> {
        let (transfer, event) =
            WithdrawalGate::request_funds(&mut self.ledger, &mut self.dues, caller)?;
        self.events.push(event);
        Ok(transfer)
    }

    /// Owner-only withdrawal from the pool
    pub fn remove_funds(&mut self, caller: &Account, amount: Amount) -> Result<Transfer> {
        let (transfer, event) =
            WithdrawalGate::remove_funds(&mut self.ledger, &self.config.owner, caller, amount)?;
        self.events.push(event);
        Ok(transfer)
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<RaceEvent> {
        std::mem::take(&mut self.events)
    }
}

impl std::fmt::Debug for TurtleRace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurtleRace")
            .field("owner", &self.config.owner)
            .field("ledger", &self.ledger)
            .field("pending_bets", &self.registry.len())
            .field("request_nonce", &self.request_nonce)
            .field("oracle_credit", &self.oracle_credit)
            .finish()
    }
}
