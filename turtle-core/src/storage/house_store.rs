use crate::config::HouseConfig;
use crate::error::{CoreError, Result};
use crate::events::RaceEvent;
use crate::state::{HouseState, LedgerBalances};
use crate::storage::event_store::insert_event;
use crate::storage::Storage;
use crate::types::{Account, Amount, Bet, RequestId, Turtle};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;

pub struct HouseStore<'a> {
    storage: &'a Storage,
}

impl<'a> HouseStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn house_exists(&self) -> Result<bool> {
        let conn = self.storage.get_connection().await;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM house", [], |row| row.get(0))?;

        Ok(count > 0)
    }

    /// Persist the full house state together with the events of the call
    /// that produced it, in a single transaction.
    pub async fn commit(&self, state: &HouseState, events: &[RaceEvent]) -> Result<()> {
        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        let config_json = serde_json::to_string(&state.config)?;
        let nonce = i64::try_from(state.request_nonce)
            .map_err(|_| CoreError::internal("Request nonce exceeds storage range"))?;

        tx.execute(
            "INSERT OR REPLACE INTO house
             (id, config, available, escrowed, owed, surplus, oracle_credit, request_nonce, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                config_json,
                state.ledger.available,
                state.ledger.escrowed,
                state.ledger.owed,
                state.ledger.surplus,
                state.oracle_credit,
                nonce,
                Utc::now().timestamp(),
            ],
        )?;

        tx.execute("DELETE FROM bets", [])?;
        for (request_id, bet) in &state.bets {
            tx.execute(
                "INSERT INTO bets (request_id, amount, bet_on, bettor) VALUES (?1, ?2, ?3, ?4)",
                params![request_id, bet.amount, bet.bet_on.selector(), bet.bettor],
            )?;
        }

        tx.execute("DELETE FROM amount_due", [])?;
        for (account, amount) in state.amount_due.iter().filter(|(_, a)| !a.is_zero()) {
            tx.execute(
                "INSERT INTO amount_due (account, amount) VALUES (?1, ?2)",
                params![account, amount],
            )?;
        }

        for event in events {
            insert_event(&tx, event)?;
        }

        tx.commit()?;

        tracing::debug!(
            "Persisted house state: {} pending bets, {} events",
            state.bets.len(),
            events.len()
        );
        Ok(())
    }

    pub async fn load_state(&self) -> Result<Option<HouseState>> {
        let conn = self.storage.get_connection().await;

        let house = conn
            .query_row(
                "SELECT config, available, escrowed, owed, surplus, oracle_credit, request_nonce
                 FROM house WHERE id = 1",
                [],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        LedgerBalances {
                            available: row.get(1)?,
                            escrowed: row.get(2)?,
                            owed: row.get(3)?,
                            surplus: row.get(4)?,
                        },
                        row.get::<_, Amount>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?;

        let Some((config_json, ledger, oracle_credit, nonce)) = house else {
            return Ok(None);
        };

        let config: HouseConfig = serde_json::from_str(&config_json)?;
        let request_nonce = u64::try_from(nonce)
            .map_err(|_| CoreError::corrupt(format!("Negative request nonce {}", nonce)))?;

        let mut stmt = conn.prepare("SELECT request_id, amount, bet_on, bettor FROM bets")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, RequestId>(0)?,
                    row.get::<_, Amount>(1)?,
                    row.get::<_, u8>(2)?,
                    row.get::<_, Account>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut bets = BTreeMap::new();
        for (request_id, amount, selector, bettor) in rows {
            let bet_on = Turtle::try_from(selector).map_err(|_| {
                CoreError::corrupt(format!("Bet {} has turtle {}", request_id, selector))
            })?;
            bets.insert(
                request_id,
                Bet {
                    amount,
                    bet_on,
                    bettor,
                },
            );
        }

        let mut stmt = conn.prepare("SELECT account, amount FROM amount_due")?;
        let amount_due = stmt
            .query_map([], |row| Ok((row.get::<_, Account>(0)?, row.get::<_, Amount>(1)?)))?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;

        Ok(Some(HouseState {
            config,
            ledger,
            bets,
            amount_due,
            request_nonce,
            oracle_credit,
        }))
    }
}
