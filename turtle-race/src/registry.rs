use crate::{RaceError, Result};
use std::collections::BTreeMap;
use turtle_core::{Account, Bet, RequestId};

/// Pending wagers keyed by the randomness request that will settle them
#[derive(Debug, Clone, Default)]
pub struct BetRegistry {
    bets: BTreeMap<RequestId, Bet>,
}

impl BetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bets(bets: BTreeMap<RequestId, Bet>) -> Self {
        Self { bets }
    }

    pub fn insert(&mut self, request_id: RequestId, bet: Bet) -> Result<()> {
        if self.bets.contains_key(&request_id) {
            return Err(RaceError::DuplicateRequest(request_id));
        }
        self.bets.insert(request_id, bet);
        Ok(())
    }

    /// Unknown and already settled requests both read as `None`
    pub fn get(&self, request_id: &RequestId) -> Option<&Bet> {
        self.bets.get(request_id)
    }

    pub fn contains(&self, request_id: &RequestId) -> bool {
        self.bets.contains_key(request_id)
    }

    /// Remove a bet for settlement
    pub fn take(&mut self, request_id: &RequestId) -> Option<Bet> {
        self.bets.remove(request_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RequestId, &Bet)> {
        self.bets.iter()
    }

    pub fn pending_for<'a>(&'a self, bettor: &'a Account) -> impl Iterator<Item = (&'a RequestId, &'a Bet)> {
        self.bets.iter().filter(move |(_, bet)| &bet.bettor == bettor)
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<RequestId, Bet> {
        self.bets.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_core::{Amount, Turtle};

    fn bet(bettor: &str, wei: u128) -> Bet {
        Bet {
            amount: Amount::from_wei(wei),
            bet_on: Turtle::One,
            bettor: Account::new(bettor).unwrap(),
        }
    }

    #[test]
    fn test_take_clears_the_slot() {
        let mut registry = BetRegistry::new();
        let id = RequestId::from_bytes([9u8; 32]);

        registry.insert(id, bet("alice", 10)).unwrap();
        assert_eq!(registry.get(&id).unwrap().amount, Amount::from_wei(10));

        assert!(registry.take(&id).is_some());
        assert!(registry.get(&id).is_none());
        assert!(registry.take(&id).is_none());
    }

    #[test]
    fn test_duplicate_request_is_rejected() {
        let mut registry = BetRegistry::new();
        let id = RequestId::from_bytes([1u8; 32]);

        registry.insert(id, bet("alice", 10)).unwrap();
        assert!(matches!(
            registry.insert(id, bet("bob", 20)),
            Err(RaceError::DuplicateRequest(_))
        ));
        assert_eq!(registry.get(&id).unwrap().bettor.as_str(), "alice");
    }

    #[test]
    fn test_pending_for_filters_by_bettor() {
        let mut registry = BetRegistry::new();
        registry.insert(RequestId::from_bytes([1u8; 32]), bet("alice", 10)).unwrap();
        registry.insert(RequestId::from_bytes([2u8; 32]), bet("bob", 20)).unwrap();
        registry.insert(RequestId::from_bytes([3u8; 32]), bet("alice", 30)).unwrap();

        let alice = Account::new("alice").unwrap();
        assert_eq!(registry.pending_for(&alice).count(), 2);
        assert_eq!(registry.len(), 3);
    }
}
