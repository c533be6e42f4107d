use crate::dues::AmountDue;
use crate::ledger::FundsLedger;
use crate::randomness::{bettor_wins, roll};
use crate::registry::BetRegistry;
use crate::RaceError;
use turtle_core::{Amount, Bet, RaceEvent, RequestId};

/// Outcome of a fulfilled randomness request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub request_id: RequestId,
    pub bet: Bet,
    pub won: bool,
    pub roll: u128,
    /// Credited to the bettor on a win, returned to the pool on a loss
    pub payout: Amount,
}

impl Settlement {
    pub fn event(&self) -> RaceEvent {
        RaceEvent::Fulfilled {
            request_id: self.request_id,
            won: self.won,
            bet_on: self.bet.bet_on,
            bettor: self.bet.bettor.clone(),
        }
    }
}

/// Resolves pending bets when their randomness arrives
pub struct SettlementEngine;

impl SettlementEngine {
    /// Settle the bet behind `request_id`.
    ///
    /// Returns `None` without touching any state when the request is unknown
    /// or already settled. Fulfillments may arrive in any order.
    pub fn resolve(
        ledger: &mut FundsLedger,
        registry: &mut BetRegistry,
        dues: &mut AmountDue,
        request_id: &RequestId,
        random_value: u128,
    ) -> Option<Settlement> {
        let Some(bet) = registry.get(request_id).cloned() else {
            tracing::warn!("Ignoring fulfillment for unknown request {}", request_id);
            return None;
        };

        let won = bettor_wins(random_value);

        // Work on copies so a failure leaves every component untouched
        let mut next_ledger = ledger.clone();
        let mut next_dues = dues.clone();
        let applied = if won {
            next_ledger
                .settle_win(bet.amount)
                .and_then(|payout| next_dues.credit(&bet.bettor, payout).map(|_| payout))
        } else {
            bet.amount
                .checked_mul(2)
                .ok_or(RaceError::Overflow("doubling stake"))
                .and_then(|payout| next_ledger.settle_loss(bet.amount).map(|_| payout))
        };

        let payout = match applied {
            Ok(payout) => payout,
            Err(e) => {
                tracing::error!("Could not settle request {}: {}", request_id, e);
                return None;
            }
        };

        registry.take(request_id);
        *ledger = next_ledger;
        *dues = next_dues;

        let settlement = Settlement {
            request_id: *request_id,
            bet,
            won,
            roll: roll(random_value),
            payout,
        };

        if won {
            tracing::info!(
                "Request {} settled: {} won {} on {} (roll {})",
                request_id,
                settlement.bet.bettor,
                payout,
                settlement.bet.bet_on,
                settlement.roll
            );
        } else {
            tracing::info!(
                "Request {} settled: house wins {} from {} (roll {})",
                request_id,
                payout,
                settlement.bet.bettor,
                settlement.roll
            );
        }

        Some(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_core::{Account, Turtle};

    struct Fixture {
        ledger: FundsLedger,
        registry: BetRegistry,
        dues: AmountDue,
        request_id: RequestId,
        bettor: Account,
        stake: Amount,
    }

    fn fixture() -> Fixture {
        let mut ledger = FundsLedger::new();
        ledger.fund(Amount::from_ether("1").unwrap()).unwrap();

        let stake = Amount::from_ether("0.1").unwrap();
        ledger.reserve_stake(stake).unwrap();

        let bettor = Account::new("alice").unwrap();
        let request_id = RequestId::from_bytes([4u8; 32]);
        let mut registry = BetRegistry::new();
        registry
            .insert(
                request_id,
                Bet {
                    amount: stake,
                    bet_on: Turtle::Two,
                    bettor: bettor.clone(),
                },
            )
            .unwrap();

        Fixture {
            ledger,
            registry,
            dues: AmountDue::new(),
            request_id,
            bettor,
            stake,
        }
    }

    #[test]
    fn test_win_credits_double_stake() {
        let mut f = fixture();
        let available = f.ledger.available_to_gamble();

        let settlement = SettlementEngine::resolve(
            &mut f.ledger,
            &mut f.registry,
            &mut f.dues,
            &f.request_id,
            39,
        )
        .unwrap();

        assert!(settlement.won);
        assert_eq!(settlement.payout, f.stake.checked_mul(2).unwrap());
        assert_eq!(f.ledger.available_to_gamble(), available);
        assert_eq!(f.dues.get(&f.bettor), f.stake.checked_mul(2).unwrap());
        assert!(f.registry.get(&f.request_id).is_none());
        assert_eq!(
            settlement.event(),
            RaceEvent::Fulfilled {
                request_id: f.request_id,
                won: true,
                bet_on: Turtle::Two,
                bettor: f.bettor.clone(),
            }
        );
    }

    #[test]
    fn test_loss_refills_pool() {
        let mut f = fixture();
        let available = f.ledger.available_to_gamble();

        let settlement = SettlementEngine::resolve(
            &mut f.ledger,
            &mut f.registry,
            &mut f.dues,
            &f.request_id,
            40,
        )
        .unwrap();

        assert!(!settlement.won);
        assert_eq!(
            f.ledger.available_to_gamble(),
            available.checked_add(f.stake.checked_mul(2).unwrap()).unwrap()
        );
        assert_eq!(f.dues.get(&f.bettor), Amount::ZERO);
        assert!(f.registry.is_empty());
        assert_eq!(settlement.event().winning_turtle(), Some(Turtle::One));
    }

    #[test]
    fn test_replay_and_unknown_requests_are_inert() {
        let mut f = fixture();
        SettlementEngine::resolve(&mut f.ledger, &mut f.registry, &mut f.dues, &f.request_id, 40)
            .unwrap();
        let ledger = f.ledger.clone();

        let replay = SettlementEngine::resolve(
            &mut f.ledger,
            &mut f.registry,
            &mut f.dues,
            &f.request_id,
            0,
        );
        assert!(replay.is_none());

        let unknown = RequestId::from_bytes([0xee; 32]);
        assert!(
            SettlementEngine::resolve(&mut f.ledger, &mut f.registry, &mut f.dues, &unknown, 0)
                .is_none()
        );

        assert_eq!(f.ledger, ledger);
        assert_eq!(f.dues.get(&f.bettor), Amount::ZERO);
    }

    #[test]
    fn test_corrupt_escrow_leaves_bet_pending() {
        let mut f = fixture();
        // a ledger that never escrowed the stake
        f.ledger = FundsLedger::new();

        let result = SettlementEngine::resolve(
            &mut f.ledger,
            &mut f.registry,
            &mut f.dues,
            &f.request_id,
            10,
        );

        assert!(result.is_none());
        assert!(f.registry.contains(&f.request_id));
        assert_eq!(f.dues.get(&f.bettor), Amount::ZERO);
    }
}
