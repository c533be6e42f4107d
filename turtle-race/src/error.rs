use thiserror::Error;
use turtle_core::{Account, Amount, RequestId};

pub type Result<T> = std::result::Result<T, RaceError>;

#[derive(Error, Debug)]
pub enum RaceError {
    #[error("Turtle core error: {0}")]
    Core(#[from] turtle_core::CoreError),

    #[error("User bet is invalid: stake must be greater than zero")]
    InvalidStake,

    #[error("Invalid input for winner type: {0}")]
    InvalidOutcome(u8),

    #[error("Cannot bet more than half the pool: stake {stake}, available {available}")]
    PoolCapExceeded { stake: Amount, available: Amount },

    #[error("Account {caller} is not the house owner")]
    Unauthorized { caller: Account },

    #[error("Insufficient pool funds: requested {requested}, available {available}")]
    InsufficientPoolFunds { requested: Amount, available: Amount },

    #[error("User owed no funds: {0}")]
    NoFundsOwed(Account),

    #[error("Not enough oracle credit: need {need}, have {available}")]
    InsufficientOracleFee { need: Amount, available: Amount },

    #[error("Randomness request failed: {0}")]
    RandomnessRequest(String),

    #[error("Amount overflow while {0}")]
    Overflow(&'static str),

    #[error("Request {0} is already pending")]
    DuplicateRequest(RequestId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl RaceError {
    /// True for rejections caused by the caller's input or the house's
    /// current balances, as opposed to infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, RaceError::Core(_) | RaceError::RandomnessRequest(_))
    }
}
