use crate::{RaceError, Result};
use std::collections::BTreeMap;
use turtle_core::{Account, Amount};

/// Unclaimed winnings per account
#[derive(Debug, Clone, Default)]
pub struct AmountDue {
    owed: BTreeMap<Account, Amount>,
}

impl AmountDue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(owed: BTreeMap<Account, Amount>) -> Self {
        Self { owed }
    }

    pub fn get(&self, account: &Account) -> Amount {
        self.owed.get(account).copied().unwrap_or(Amount::ZERO)
    }

    pub fn credit(&mut self, account: &Account, amount: Amount) -> Result<Amount> {
        let total = self
            .get(account)
            .checked_add(amount)
            .ok_or(RaceError::Overflow("crediting amount due"))?;
        self.owed.insert(account.clone(), total);
        Ok(total)
    }

    /// Remove and return everything owed to `account`
    pub fn take(&mut self, account: &Account) -> Amount {
        self.owed.remove(account).unwrap_or(Amount::ZERO)
    }

    pub fn to_map(&self) -> BTreeMap<Account, Amount> {
        self.owed
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(account, amount)| (account.clone(), *amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_accumulates_and_take_zeroes() {
        let alice = Account::new("alice").unwrap();
        let mut dues = AmountDue::new();

        dues.credit(&alice, Amount::from_wei(20)).unwrap();
        assert_eq!(dues.credit(&alice, Amount::from_wei(40)).unwrap(), Amount::from_wei(60));

        assert_eq!(dues.take(&alice), Amount::from_wei(60));
        assert_eq!(dues.get(&alice), Amount::ZERO);
        assert!(dues.to_map().is_empty());
    }

    #[test]
    fn test_overflow_leaves_entry_untouched() {
        let alice = Account::new("alice").unwrap();
        let mut dues = AmountDue::from_map(BTreeMap::from([(alice.clone(), Amount::from_wei(u128::MAX))]));

        assert!(dues.credit(&alice, Amount::from_wei(1)).is_err());
        assert_eq!(dues.get(&alice), Amount::from_wei(u128::MAX));
    }
}
