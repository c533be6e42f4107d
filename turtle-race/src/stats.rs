use serde::{Deserialize, Serialize};
use turtle_core::{Account, RaceEvent, Turtle};

/// House-wide race history summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceStats {
    pub races: usize,
    pub last_winner: Option<Turtle>,
    /// Consecutive most recent races won by `last_winner`
    pub win_streak: usize,
}

impl RaceStats {
    /// Summarize `Fulfilled` events given oldest first; other events are skipped
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a RaceEvent>) -> Self {
        let winners: Vec<Turtle> = events
            .into_iter()
            .filter_map(RaceEvent::winning_turtle)
            .collect();

        let Some(&last_winner) = winners.last() else {
            return Self::default();
        };

        let win_streak = winners
            .iter()
            .rev()
            .take_while(|&&winner| winner == last_winner)
            .count();

        Self {
            races: winners.len(),
            last_winner: Some(last_winner),
            win_streak,
        }
    }
}

/// One account's settled wagers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub account: Account,
    pub settled: usize,
    pub wins: usize,
}

impl PlayerStats {
    pub fn from_events<'a>(
        account: &Account,
        events: impl IntoIterator<Item = &'a RaceEvent>,
    ) -> Self {
        let mut stats = Self {
            account: account.clone(),
            settled: 0,
            wins: 0,
        };

        for event in events {
            if let RaceEvent::Fulfilled { won, bettor, .. } = event {
                if bettor == account {
                    stats.settled += 1;
                    if *won {
                        stats.wins += 1;
                    }
                }
            }
        }

        stats
    }

    /// Fraction of settled bets won, `None` before the first settlement
    pub fn win_percentage(&self) -> Option<f64> {
        if self.settled == 0 {
            return None;
        }
        Some(self.wins as f64 / self.settled as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_core::RequestId;

    fn fulfilled(bettor: &str, won: bool, bet_on: Turtle) -> RaceEvent {
        RaceEvent::Fulfilled {
            request_id: RequestId::from_bytes([0u8; 32]),
            won,
            bet_on,
            bettor: Account::new(bettor).unwrap(),
        }
    }

    #[test]
    fn test_streak_counts_back_from_latest_race() {
        let events = vec![
            fulfilled("alice", true, Turtle::Two),   // 2 wins
            fulfilled("bob", false, Turtle::Two),    // 1 wins
            fulfilled("alice", true, Turtle::One),   // 1 wins
            RaceEvent::Requested {
                request_id: RequestId::from_bytes([1u8; 32]),
                bettor: Account::new("bob").unwrap(),
            },
            fulfilled("bob", false, Turtle::Two),    // 1 wins
        ];

        let stats = RaceStats::from_events(&events);
        assert_eq!(stats.races, 4);
        assert_eq!(stats.last_winner, Some(Turtle::One));
        assert_eq!(stats.win_streak, 3);
    }

    #[test]
    fn test_empty_history() {
        let stats = RaceStats::from_events(&[]);
        assert_eq!(stats, RaceStats::default());
        assert_eq!(stats.last_winner, None);
    }

    #[test]
    fn test_player_win_percentage() {
        let alice = Account::new("alice").unwrap();
        let events = vec![
            fulfilled("alice", true, Turtle::Two),
            fulfilled("alice", false, Turtle::Two),
            fulfilled("bob", true, Turtle::One),
            fulfilled("alice", false, Turtle::One),
            fulfilled("alice", true, Turtle::One),
        ];

        let stats = PlayerStats::from_events(&alice, &events);
        assert_eq!(stats.settled, 4);
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.win_percentage(), Some(0.5));

        let carol = Account::new("carol").unwrap();
        assert_eq!(PlayerStats::from_events(&carol, &events).win_percentage(), None);
    }
}
