use crate::error::{CoreError, Result};
use crate::events::{EventRecord, RaceEvent};
use crate::storage::Storage;
use chrono::Utc;
use rusqlite::{params, Connection};

/// Append an event on an open connection or transaction
pub(crate) fn insert_event(conn: &Connection, event: &RaceEvent) -> Result<()> {
    let payload = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO events (kind, payload, created_at) VALUES (?1, ?2, ?3)",
        params![event.name(), payload, Utc::now().timestamp()],
    )?;
    Ok(())
}

pub struct EventStore<'a> {
    storage: &'a Storage,
}

impl<'a> EventStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// All events in emission order
    pub async fn list_events(&self) -> Result<Vec<EventRecord>> {
        self.query("SELECT seq, payload, created_at FROM events ORDER BY seq", None)
            .await
    }

    /// Events of one kind (`"Fulfilled"`, `"Requested"`, ...) in emission order
    pub async fn list_by_kind(&self, kind: &str) -> Result<Vec<EventRecord>> {
        self.query(
            "SELECT seq, payload, created_at FROM events WHERE kind = ?1 ORDER BY seq",
            Some(kind),
        )
        .await
    }

    async fn query(&self, sql: &str, kind: Option<&str>) -> Result<Vec<EventRecord>> {
        let conn = self.storage.get_connection().await;
        let mut stmt = conn.prepare(sql)?;

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(i64, String, i64)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        };
        let rows = match kind {
            Some(kind) => stmt
                .query_map(params![kind], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };

        let mut records = Vec::with_capacity(rows.len());
        for (seq, payload, created_at) in rows {
            let event: RaceEvent = serde_json::from_str(&payload)?;
            let created_at = chrono::DateTime::from_timestamp(created_at, 0)
                .ok_or_else(|| CoreError::corrupt(format!("Bad timestamp on event {}", seq)))?;
            records.push(EventRecord {
                seq,
                event,
                created_at,
            });
        }

        Ok(records)
    }
}
