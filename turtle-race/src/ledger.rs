use crate::{RaceError, Result};
use turtle_core::{Amount, LedgerBalances};

/// Contract-wide balances.
///
/// Each accepted stake moves `stake` out of `available` and `2 * stake` into
/// `escrowed`: the bettor's own stake plus the matching half reserved from the
/// pool. Settlement moves the escrow either back to `available` (house wins)
/// or to `owed` (bettor wins), so every payout is covered before the outcome
/// is known and `available` never exceeds the total held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FundsLedger {
    balances: LedgerBalances,
}

impl FundsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_balances(balances: LedgerBalances) -> Self {
        Self { balances }
    }

    pub fn balances(&self) -> LedgerBalances {
        self.balances
    }

    pub fn available_to_gamble(&self) -> Amount {
        self.balances.available
    }

    pub fn total_balance(&self) -> Amount {
        self.balances.total()
    }

    /// Largest stake the pool can currently accept
    pub fn max_stake(&self) -> Amount {
        self.balances.available.half()
    }

    /// Check that `stake` can be reserved without mutating anything
    pub fn check_reservation(&self, stake: Amount) -> Result<()> {
        let available = self.balances.available;
        let doubled = stake
            .checked_mul(2)
            .ok_or(RaceError::Overflow("doubling stake"))?;

        if doubled > available {
            return Err(RaceError::PoolCapExceeded { stake, available });
        }

        Ok(())
    }

    /// Accept a stake: the bettor's deposit and an equal share of the pool
    /// are escrowed until settlement.
    pub fn reserve_stake(&mut self, stake: Amount) -> Result<()> {
        self.check_reservation(stake)?;

        let escrow = stake
            .checked_mul(2)
            .ok_or(RaceError::Overflow("doubling stake"))?;
        let available = self
            .balances
            .available
            .checked_sub(stake)
            .ok_or(RaceError::PoolCapExceeded {
                stake,
                available: self.balances.available,
            })?;
        let escrowed = self
            .balances
            .escrowed
            .checked_add(escrow)
            .ok_or(RaceError::Overflow("escrowing stake"))?;

        self.balances.available = available;
        self.balances.escrowed = escrowed;
        Ok(())
    }

    /// House won: the escrow for `stake` returns to the pool
    pub fn settle_loss(&mut self, stake: Amount) -> Result<()> {
        let escrow = self.release_escrow(stake)?;
        let available = self
            .balances
            .available
            .checked_add(escrow)
            .ok_or(RaceError::Overflow("returning escrow to pool"))?;

        self.balances.escrowed = self.escrowed_after(escrow)?;
        self.balances.available = available;
        Ok(())
    }

    /// Bettor won: the escrow for `stake` becomes owed winnings.
    /// Returns the amount credited.
    pub fn settle_win(&mut self, stake: Amount) -> Result<Amount> {
        let escrow = self.release_escrow(stake)?;
        let owed = self
            .balances
            .owed
            .checked_add(escrow)
            .ok_or(RaceError::Overflow("crediting winnings"))?;

        self.balances.escrowed = self.escrowed_after(escrow)?;
        self.balances.owed = owed;
        Ok(escrow)
    }

    /// Winnings leave the house
    pub fn pay_out(&mut self, amount: Amount) -> Result<()> {
        self.balances.owed = self
            .balances
            .owed
            .checked_sub(amount)
            .ok_or(RaceError::Overflow("paying out more than owed"))?;
        Ok(())
    }

    /// Owner withdrawal from the pool
    pub fn remove(&mut self, amount: Amount) -> Result<()> {
        let available = self.balances.available;
        self.balances.available =
            available
                .checked_sub(amount)
                .ok_or(RaceError::InsufficientPoolFunds {
                    requested: amount,
                    available,
                })?;
        Ok(())
    }

    /// Funding path: currency that is immediately available to back wagers
    pub fn fund(&mut self, amount: Amount) -> Result<()> {
        self.balances.available = self
            .balances
            .available
            .checked_add(amount)
            .ok_or(RaceError::Overflow("funding pool"))?;
        Ok(())
    }

    /// Plain transfer outside the funding path
    pub fn receive(&mut self, amount: Amount) -> Result<()> {
        self.balances.surplus = self
            .balances
            .surplus
            .checked_add(amount)
            .ok_or(RaceError::Overflow("receiving transfer"))?;
        Ok(())
    }

    fn release_escrow(&self, stake: Amount) -> Result<Amount> {
        stake
            .checked_mul(2)
            .ok_or(RaceError::Overflow("doubling stake"))
    }

    fn escrowed_after(&self, escrow: Amount) -> Result<Amount> {
        self.balances
            .escrowed
            .checked_sub(escrow)
            .ok_or(RaceError::Overflow("releasing more than escrowed"))
    }
}
