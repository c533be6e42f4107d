use crate::dues::AmountDue;
use crate::ledger::FundsLedger;
use crate::{RaceError, Result};
use turtle_core::{Account, Amount, RaceEvent};

/// Currency leaving the house
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub to: Account,
    pub amount: Amount,
}

/// Authorization and solvency checks for funds leaving the house
pub struct WithdrawalGate;

impl WithdrawalGate {
    /// Pay `caller` everything they are owed
    pub fn request_funds(
        ledger: &mut FundsLedger,
        dues: &mut AmountDue,
        caller: &Account,
    ) -> Result<(Transfer, RaceEvent)> {
        let owed = dues.get(caller);
        if owed.is_zero() {
            return Err(RaceError::NoFundsOwed(caller.clone()));
        }

        let mut next_ledger = ledger.clone();
        next_ledger.pay_out(owed)?;

        dues.take(caller);
        *ledger = next_ledger;

        tracing::info!("Paid {} in winnings to {}", owed, caller);
        Ok((
            Transfer {
                to: caller.clone(),
                amount: owed,
            },
            RaceEvent::FundsClaimed {
                account: caller.clone(),
                amount: owed,
            },
        ))
    }

    /// Owner withdrawal from the pool available to gamble
    pub fn remove_funds(
        ledger: &mut FundsLedger,
        owner: &Account,
        caller: &Account,
        amount: Amount,
    ) -> Result<(Transfer, RaceEvent)> {
        if caller != owner {
            return Err(RaceError::Unauthorized {
                caller: caller.clone(),
            });
        }

        if amount.is_zero() {
            return Err(RaceError::InvalidAmount(
                "withdrawal must be greater than zero".to_string(),
            ));
        }

        ledger.remove(amount)?;

        tracing::info!("Owner {} removed {} from the pool", owner, amount);
        Ok((
            Transfer {
                to: owner.clone(),
                amount,
            },
            RaceEvent::FundsRemoved {
                owner: owner.clone(),
                amount,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth(value: &str) -> Amount {
        Amount::from_ether(value).unwrap()
    }

    #[test]
    fn test_request_funds_zeroes_due() {
        let alice = Account::new("alice").unwrap();
        let mut ledger = FundsLedger::new();
        ledger.fund(eth("1")).unwrap();
        ledger.reserve_stake(eth("0.1")).unwrap();
        let credited = ledger.settle_win(eth("0.1")).unwrap();

        let mut dues = AmountDue::new();
        dues.credit(&alice, credited).unwrap();

        let (transfer, _) = WithdrawalGate::request_funds(&mut ledger, &mut dues, &alice).unwrap();
        assert_eq!(transfer.amount, eth("0.2"));
        assert_eq!(dues.get(&alice), Amount::ZERO);
        assert_eq!(ledger.total_balance(), eth("0.9"));

        assert!(matches!(
            WithdrawalGate::request_funds(&mut ledger, &mut dues, &alice),
            Err(RaceError::NoFundsOwed(_))
        ));
    }

    #[test]
    fn test_only_owner_removes_funds() {
        let owner = Account::new("owner").unwrap();
        let mallory = Account::new("mallory").unwrap();
        let mut ledger = FundsLedger::new();
        ledger.fund(eth("1")).unwrap();

        assert!(matches!(
            WithdrawalGate::remove_funds(&mut ledger, &owner, &mallory, eth("0.1")),
            Err(RaceError::Unauthorized { .. })
        ));
        assert!(matches!(
            WithdrawalGate::remove_funds(&mut ledger, &owner, &owner, eth("1.5")),
            Err(RaceError::InsufficientPoolFunds { .. })
        ));
        assert!(matches!(
            WithdrawalGate::remove_funds(&mut ledger, &owner, &owner, Amount::ZERO),
            Err(RaceError::InvalidAmount(_))
        ));
        assert_eq!(ledger.available_to_gamble(), eth("1"));

        let (transfer, event) =
            WithdrawalGate::remove_funds(&mut ledger, &owner, &owner, eth("0.5")).unwrap();
        assert_eq!(transfer.to, owner);
        assert_eq!(event.name(), "FundsRemoved");
        assert_eq!(ledger.available_to_gamble(), eth("0.5"));
    }
}
