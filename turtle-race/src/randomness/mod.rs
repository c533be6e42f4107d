pub mod coordinator;

pub use coordinator::VrfCoordinator;

use crate::Result;
use turtle_core::{Account, HouseConfig, RequestId};

/// Size of the range random values are reduced into
pub const RANDOMNESS_DOMAIN: u128 = 100;

/// Highest roll that pays the bettor
pub const WIN_THRESHOLD: u128 = 39;

/// Reduce a raw random value into `0..RANDOMNESS_DOMAIN`
pub fn roll(random_value: u128) -> u128 {
    random_value % RANDOMNESS_DOMAIN
}

/// The bettor wins when the roll lands at or below the threshold,
/// whichever turtle they picked.
pub fn bettor_wins(random_value: u128) -> bool {
    roll(random_value) <= WIN_THRESHOLD
}

/// Oracle side of a wager: issues the request whose fulfillment will later be
/// delivered to `TurtleRace::fulfill_randomness`.
pub trait RandomnessSource: Send + Sync {
    fn request_randomness(
        &self,
        config: &HouseConfig,
        requester: &Account,
        nonce: u64,
    ) -> Result<RequestId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_boundary() {
        assert!(bettor_wins(0));
        assert!(bettor_wins(39));
        assert!(!bettor_wins(40));
        assert!(!bettor_wins(99));
    }

    #[test]
    fn test_large_values_are_reduced() {
        assert_eq!(roll(139), 39);
        assert!(bettor_wins(1_000_039));
        assert!(!bettor_wins(u128::MAX));
    }
}
