use crate::contract::TurtleRace;
use crate::randomness::RandomnessSource;
use crate::settlement::Settlement;
use crate::stats::{PlayerStats, RaceStats};
use crate::withdrawal::Transfer;
use crate::{RaceError, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use turtle_core::{
    Account, Amount, Bet, CoreError, EventRecord, EventStore, HouseConfig, HouseState, HouseStore,
    RaceEvent, RequestId, Storage,
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A state-changing call submitted to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HouseCall {
    Gamble {
        caller: Account,
        selector: u8,
        stake: Amount,
    },
    Fulfill {
        request_id: RequestId,
        random_value: u128,
    },
    RequestFunds {
        caller: Account,
    },
    RemoveFunds {
        caller: Account,
        amount: Amount,
    },
    FundPool {
        from: Account,
        amount: Amount,
    },
    FundOracle {
        amount: Amount,
    },
    /// Plain transfer outside the funding path
    Receive {
        amount: Amount,
    },
}

/// What a committed call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallReceipt {
    BetPlaced(RequestId),
    /// `None` when the fulfillment matched no pending bet
    Settled(Option<Settlement>),
    Paid(Transfer),
    Funded,
}

struct Inner {
    race: TurtleRace,
    // session history for hosts without storage
    history: Vec<EventRecord>,
}

/// Serializes every call against one house.
///
/// Calls run one at a time in the order the host receives them. Each call is
/// applied to a copy of the house and only becomes visible, persisted and
/// broadcast once it fully succeeds.
pub struct RaceHost {
    inner: Mutex<Inner>,
    storage: Option<Arc<Storage>>,
    events: broadcast::Sender<RaceEvent>,
}

impl RaceHost {
    /// Host without persistence
    pub fn in_memory(race: TurtleRace) -> Self {
        Self::with_storage(race, None)
    }

    /// Create and persist a new house in `storage`
    pub async fn create(
        storage: Arc<Storage>,
        config: HouseConfig,
        randomness: Arc<dyn RandomnessSource>,
    ) -> Result<Self> {
        let store = HouseStore::new(&storage);
        if store.house_exists().await? {
            return Err(CoreError::config("A house already exists in this database").into());
        }

        let race = TurtleRace::new(config, randomness)?;
        store.commit(&race.state(), &[]).await?;

        tracing::info!("Created house owned by {}", race.owner());
        Ok(Self::with_storage(race, Some(storage)))
    }

    /// Load the house previously created in `storage`
    pub async fn open(storage: Arc<Storage>, randomness: Arc<dyn RandomnessSource>) -> Result<Self> {
        let state = HouseStore::new(&storage)
            .load_state()
            .await?
            .ok_or_else(|| CoreError::HouseNotFound {
                path: "house database".to_string(),
            })?;

        let race = TurtleRace::from_state(state, randomness)?;
        tracing::debug!("Opened house: {:?}", race);
        Ok(Self::with_storage(race, Some(storage)))
    }

    /// Open the house database at `db_path`
    pub async fn open_path(db_path: &Path, randomness: Arc<dyn RandomnessSource>) -> Result<Self> {
        if !db_path.exists() {
            return Err(CoreError::HouseNotFound {
                path: db_path.display().to_string(),
            }
            .into());
        }
        let storage = Arc::new(Storage::new(db_path).await?);
        Self::open(storage, randomness).await
    }

    fn with_storage(race: TurtleRace, storage: Option<Arc<Storage>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                race,
                history: Vec::new(),
            }),
            storage,
            events,
        }
    }

    /// Receive every event committed from now on
    pub fn subscribe(&self) -> broadcast::Receiver<RaceEvent> {
        self.events.subscribe()
    }

    pub async fn submit(&self, call: HouseCall) -> Result<CallReceipt> {
        let mut inner = self.inner.lock().await;
        self.apply(&mut inner, call).await
    }

    /// Apply calls in submission order as one block. Every call sees the
    /// effects of the calls before it; a rejected call does not affect the
    /// others.
    pub async fn submit_batch(&self, calls: Vec<HouseCall>) -> Vec<Result<CallReceipt>> {
        let mut inner = self.inner.lock().await;
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.apply(&mut inner, call).await);
        }
        results
    }

    async fn apply(&self, inner: &mut Inner, call: HouseCall) -> Result<CallReceipt> {
        let mut next = inner.race.clone();
        let receipt = match execute(&mut next, call) {
            Ok(receipt) => receipt,
            Err(e) => {
                if e.is_rejection() {
                    tracing::warn!("Call rejected: {}", e);
                } else {
                    tracing::error!("Call failed: {}", e);
                }
                return Err(e);
            }
        };
        let events = next.take_events();

        if let Some(storage) = &self.storage {
            HouseStore::new(storage).commit(&next.state(), &events).await?;
        } else {
            let created_at = Utc::now();
            for event in &events {
                let seq = inner.history.len() as i64 + 1;
                inner.history.push(EventRecord {
                    seq,
                    event: event.clone(),
                    created_at,
                });
            }
        }

        inner.race = next;
        for event in events {
            // no subscribers is fine
            let _ = self.events.send(event);
        }

        Ok(receipt)
    }

    pub async fn gamble(&self, caller: &Account, selector: u8, stake: Amount) -> Result<RequestId> {
        match self
            .submit(HouseCall::Gamble {
                caller: caller.clone(),
                selector,
                stake,
            })
            .await?
        {
            CallReceipt::BetPlaced(request_id) => Ok(request_id),
            other => Err(unexpected(other)),
        }
    }

    pub async fn fulfill_randomness(
        &self,
        request_id: RequestId,
        random_value: u128,
    ) -> Result<Option<Settlement>> {
        match self
            .submit(HouseCall::Fulfill {
                request_id,
                random_value,
            })
            .await?
        {
            CallReceipt::Settled(settlement) => Ok(settlement),
            other => Err(unexpected(other)),
        }
    }

    pub async fn request_funds(&self, caller: &Account) -> Result<Transfer> {
        match self
            .submit(HouseCall::RequestFunds {
                caller: caller.clone(),
            })
            .await?
        {
            CallReceipt::Paid(transfer) => Ok(transfer),
            other => Err(unexpected(other)),
        }
    }

    pub async fn remove_funds(&self, caller: &Account, amount: Amount) -> Result<Transfer> {
        match self
            .submit(HouseCall::RemoveFunds {
                caller: caller.clone(),
                amount,
            })
            .await?
        {
            CallReceipt::Paid(transfer) => Ok(transfer),
            other => Err(unexpected(other)),
        }
    }

    pub async fn fund_pool(&self, from: &Account, amount: Amount) -> Result<()> {
        self.submit(HouseCall::FundPool {
            from: from.clone(),
            amount,
        })
        .await
        .map(|_| ())
    }

    pub async fn fund_oracle(&self, amount: Amount) -> Result<()> {
        self.submit(HouseCall::FundOracle { amount }).await.map(|_| ())
    }

    /// Plain transfer: counts toward `balance` but never toward the pool
    pub async fn receive(&self, amount: Amount) -> Result<()> {
        self.submit(HouseCall::Receive { amount }).await.map(|_| ())
    }

    pub async fn balance(&self) -> Amount {
        self.inner.lock().await.race.balance()
    }

    pub async fn available_funds_to_gamble(&self) -> Amount {
        self.inner.lock().await.race.available_funds_to_gamble()
    }

    pub async fn amount_due(&self, account: &Account) -> Amount {
        self.inner.lock().await.race.amount_due(account)
    }

    pub async fn bets(&self, request_id: &RequestId) -> Option<Bet> {
        self.inner.lock().await.race.bets(request_id).cloned()
    }

    pub async fn pending_bets(&self) -> Vec<(RequestId, Bet)> {
        self.inner
            .lock()
            .await
            .race
            .pending_bets()
            .map(|(id, bet)| (*id, bet.clone()))
            .collect()
    }

    pub async fn pending_bets_for(&self, bettor: &Account) -> Vec<(RequestId, Bet)> {
        self.inner
            .lock()
            .await
            .race
            .pending_bets_for(bettor)
            .map(|(id, bet)| (*id, bet.clone()))
            .collect()
    }

    pub async fn state(&self) -> HouseState {
        self.inner.lock().await.race.state()
    }

    /// Committed events, oldest first
    pub async fn history(&self) -> Result<Vec<EventRecord>> {
        if let Some(storage) = &self.storage {
            return Ok(EventStore::new(storage).list_events().await?);
        }

        Ok(self.inner.lock().await.history.clone())
    }

    /// Committed events of one kind (`"Fulfilled"`, `"PoolFunded"`, ...)
    pub async fn history_of_kind(&self, kind: &str) -> Result<Vec<EventRecord>> {
        if let Some(storage) = &self.storage {
            return Ok(EventStore::new(storage).list_by_kind(kind).await?);
        }

        Ok(self
            .inner
            .lock()
            .await
            .history
            .iter()
            .filter(|record| record.event.name() == kind)
            .cloned()
            .collect())
    }

    pub async fn race_stats(&self) -> Result<RaceStats> {
        let history = self.history().await?;
        Ok(RaceStats::from_events(history.iter().map(|r| &r.event)))
    }

    pub async fn player_stats(&self, account: &Account) -> Result<PlayerStats> {
        let history = self.history().await?;
        Ok(PlayerStats::from_events(
            account,
            history.iter().map(|r| &r.event),
        ))
    }
}

fn execute(race: &mut TurtleRace, call: HouseCall) -> Result<CallReceipt> {
    match call {
        HouseCall::Gamble {
            caller,
            selector,
            stake,
        } => race
            .gamble(&caller, selector, stake)
            .map(CallReceipt::BetPlaced),
        HouseCall::Fulfill {
            request_id,
            random_value,
        } => Ok(CallReceipt::Settled(
            race.fulfill_randomness(&request_id, random_value),
        )),
        HouseCall::RequestFunds { caller } => race.request_funds(&caller).map(CallReceipt::Paid),
        HouseCall::RemoveFunds { caller, amount } => {
            race.remove_funds(&caller, amount).map(CallReceipt::Paid)
        }
        HouseCall::FundPool { from, amount } => {
            race.fund_pool(&from, amount).map(|_| CallReceipt::Funded)
        }
        HouseCall::FundOracle { amount } => race.fund_oracle(amount).map(|_| CallReceipt::Funded),
        HouseCall::Receive { amount } => race.receive(amount).map(|_| CallReceipt::Funded),
    }
}

fn unexpected(receipt: CallReceipt) -> RaceError {
    CoreError::internal(format!("Unexpected receipt: {:?}", receipt)).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::VrfCoordinator;
    use tempfile::tempdir;

    fn eth(value: &str) -> Amount {
        Amount::from_ether(value).unwrap()
    }

    fn account(name: &str) -> Account {
        Account::new(name).unwrap()
    }

    async fn funded_host() -> RaceHost {
        let owner = account("owner");
        let race = TurtleRace::new(
            HouseConfig::new(owner.clone()).with_oracle_fee(Amount::ZERO),
            Arc::new(VrfCoordinator::new()),
        )
        .unwrap();
        let host = RaceHost::in_memory(race);
        host.fund_pool(&owner, eth("1.0")).await.unwrap();
        host
    }

    fn gamble(caller: &str, stake: Amount) -> HouseCall {
        HouseCall::Gamble {
            caller: account(caller),
            selector: 2,
            stake,
        }
    }

    #[tokio::test]
    async fn test_same_block_wagers_see_prior_reservations() {
        let host = funded_host().await;

        let over = eth("0.25").checked_add(Amount::from_wei(1)).unwrap();
        let results = host
            .submit_batch(vec![gamble("addr1", eth("0.5")), gamble("addr2", over)])
            .await;
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(RaceError::PoolCapExceeded { .. })
        ));
        assert_eq!(host.available_funds_to_gamble().await, eth("0.5"));

        let results = host
            .submit_batch(vec![
                gamble("addr2", eth("0.25")),
                gamble("addr3", eth("0.125")),
            ])
            .await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(host.available_funds_to_gamble().await, eth("0.125"));
        assert_eq!(host.pending_bets().await.len(), 3);
    }

    #[tokio::test]
    async fn test_subscribers_receive_committed_events_only() {
        let host = funded_host().await;
        let mut events = host.subscribe();
        let addr1 = account("addr1");

        assert!(host.gamble(&addr1, 9, eth("0.1")).await.is_err());
        let request_id = host.gamble(&addr1, 2, eth("0.1")).await.unwrap();
        host.fulfill_randomness(request_id, 39).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            RaceEvent::Requested {
                request_id,
                bettor: addr1.clone()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            RaceEvent::Fulfilled {
                request_id,
                won: true,
                bet_on: turtle_core::Turtle::Two,
                bettor: addr1.clone()
            }
        );
    }

    #[tokio::test]
    async fn test_session_history_keeps_commit_times() {
        let host = funded_host().await;
        let addr1 = account("addr1");
        let request_id = host.gamble(&addr1, 1, eth("0.1")).await.unwrap();
        host.fulfill_randomness(request_id, 80).await.unwrap();

        let first = host.history().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = host.history().await.unwrap();

        assert_eq!(first.len(), 3);
        let seqs: Vec<i64> = first.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.created_at, b.created_at);
            assert_eq!(a.event, b.event);
        }

        let fulfilled = host.history_of_kind("Fulfilled").await.unwrap();
        assert_eq!(fulfilled.len(), 1);
        assert_eq!(fulfilled[0].seq, 3);
        assert_eq!(fulfilled[0].event.winning_turtle(), Some(turtle_core::Turtle::Two));
    }

    #[tokio::test]
    async fn test_plain_transfer_is_not_gambleable() {
        let host = funded_host().await;

        host.receive(eth("5")).await.unwrap();
        assert_eq!(host.balance().await, eth("6"));
        assert_eq!(host.available_funds_to_gamble().await, eth("1.0"));
        assert!(matches!(
            host.gamble(&account("addr1"), 1, eth("0.6")).await,
            Err(RaceError::PoolCapExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn test_pending_bets_for_one_bettor() {
        let host = funded_host().await;
        let alice = account("alice");
        let alice_bet = host.gamble(&alice, 1, eth("0.1")).await.unwrap();
        host.gamble(&account("bob"), 2, eth("0.1")).await.unwrap();

        let pending = host.pending_bets_for(&alice).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].0, alice_bet);
        assert!(host.pending_bets_for(&account("carol")).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fulfillment_is_a_noop() {
        let host = funded_host().await;
        let before = host.state().await;

        let settled = host
            .fulfill_randomness(RequestId::from_bytes([0xab; 32]), 1)
            .await
            .unwrap();
        assert!(settled.is_none());

        let after = host.state().await;
        assert_eq!(after.ledger, before.ledger);
        assert_eq!(after.amount_due, before.amount_due);
        assert_eq!(after.bets, before.bets);
    }

    #[tokio::test]
    async fn test_persisted_house_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("house.db");
        let owner = account("owner");
        let alice = account("alice");

        let request_id = {
            let storage = Arc::new(Storage::new(&db_path).await.unwrap());
            let config = HouseConfig::new(owner.clone()).with_oracle_fee(Amount::ZERO);
            let host = RaceHost::create(storage, config, Arc::new(VrfCoordinator::new()))
                .await
                .unwrap();
            host.fund_pool(&owner, eth("1")).await.unwrap();
            let won = host.gamble(&alice, 1, eth("0.1")).await.unwrap();
            host.fulfill_randomness(won, 0).await.unwrap();
            host.gamble(&alice, 2, eth("0.2")).await.unwrap()
        };

        let host = RaceHost::open_path(&db_path, Arc::new(VrfCoordinator::new()))
            .await
            .unwrap();
        assert_eq!(host.amount_due(&alice).await, eth("0.2"));
        assert_eq!(host.bets(&request_id).await.unwrap().amount, eth("0.2"));
        assert_eq!(host.available_funds_to_gamble().await, eth("0.7"));

        // nonce survived, so the next request id is fresh
        let next = host.gamble(&alice, 1, eth("0.1")).await.unwrap();
        assert_ne!(next, request_id);

        let stats = host.player_stats(&alice).await.unwrap();
        assert_eq!(stats.settled, 1);
        assert_eq!(stats.win_percentage(), Some(1.0));

        let race_stats = host.race_stats().await.unwrap();
        assert_eq!(race_stats.last_winner, Some(turtle_core::Turtle::One));

        let funded = host.history_of_kind("PoolFunded").await.unwrap();
        assert_eq!(funded.len(), 1);
        assert_eq!(host.history_of_kind("Requested").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_create_refuses_existing_house() {
        let temp_dir = tempdir().unwrap();
        let storage = Arc::new(Storage::new(&temp_dir.path().join("house.db")).await.unwrap());
        let config = HouseConfig::new(account("owner"));

        RaceHost::create(storage.clone(), config.clone(), Arc::new(VrfCoordinator::new()))
            .await
            .unwrap();
        assert!(RaceHost::create(storage, config, Arc::new(VrfCoordinator::new()))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_open_missing_house() {
        let temp_dir = tempdir().unwrap();
        let result =
            RaceHost::open_path(&temp_dir.path().join("none.db"), Arc::new(VrfCoordinator::new()))
                .await;
        assert!(matches!(
            result,
            Err(RaceError::Core(CoreError::HouseNotFound { .. }))
        ));
    }
}
