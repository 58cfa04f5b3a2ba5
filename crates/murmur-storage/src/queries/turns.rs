// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn persistence.
//!
//! Within a (channel, session) pair, stored timestamps never decrease:
//! a turn arriving with a wall clock at or before the previous turn is
//! stamped one millisecond past it, which also keeps the
//! `<session_id>_<timestamp>` key unique.

use murmur_core::{types::epoch_ms, MurmurError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::ConversationTurn;

/// Record one turn, returning the stored row.
pub async fn record_turn(
    db: &Database,
    channel: &str,
    session_id: &str,
    role: &str,
    content: &str,
) -> Result<ConversationTurn, MurmurError> {
    let channel = channel.to_string();
    let session_id = session_id.to_string();
    let role = role.to_string();
    let content = content.to_string();
    let now = epoch_ms() as i64;

    db.connection()
        .call(move |conn| {
            let last: Option<i64> = conn
                .query_row(
                    "SELECT MAX(timestamp) FROM sessions
                     WHERE channel = ?1 AND session_id = ?2",
                    params![channel, session_id],
                    |row| row.get(0),
                )
                .unwrap_or(None);

            let timestamp = match last {
                Some(last) if now <= last => last + 1,
                _ => now,
            };
            let key = format!("{session_id}_{timestamp}");

            conn.execute(
                "INSERT INTO sessions (key, channel, session_id, role, content, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![key, channel, session_id, role, content, timestamp],
            )?;

            Ok(ConversationTurn {
                key,
                channel,
                session_id,
                role,
                content,
                timestamp_ms: timestamp,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Read turns for a session, oldest first.
pub async fn list_turns(
    db: &Database,
    session_id: &str,
    limit: Option<usize>,
) -> Result<Vec<ConversationTurn>, MurmurError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = match limit {
                Some(_) => {
                    "SELECT key, channel, session_id, role, content, timestamp
                     FROM sessions WHERE session_id = ?1
                     ORDER BY timestamp ASC LIMIT ?2"
                }
                None => {
                    "SELECT key, channel, session_id, role, content, timestamp
                     FROM sessions WHERE session_id = ?1
                     ORDER BY timestamp ASC"
                }
            };
            let mut stmt = conn.prepare(sql)?;
            let map_row = |row: &rusqlite::Row| -> Result<ConversationTurn, rusqlite::Error> {
                Ok(ConversationTurn {
                    key: row.get(0)?,
                    channel: row.get(1)?,
                    session_id: row.get(2)?,
                    role: row.get(3)?,
                    content: row.get(4)?,
                    timestamp_ms: row.get(5)?,
                })
            };
            let turns = match limit {
                Some(n) => stmt
                    .query_map(params![session_id, n as i64], map_row)?
                    .collect::<Result<Vec<_>, _>>()?,
                None => stmt
                    .query_map(params![session_id], map_row)?
                    .collect::<Result<Vec<_>, _>>()?,
            };
            Ok(turns)
        })
        .await
        .map_err(map_tr_err)
}

/// Delete all turns for a session. Returns the number removed.
pub async fn clear_session(db: &Database, session_id: &str) -> Result<usize, MurmurError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let n = conn.execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(n)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_and_list_oldest_first() {
        let db = Database::open_in_memory().await.unwrap();

        record_turn(&db, "webhook", "alice", "user", "hello")
            .await
            .unwrap();
        record_turn(&db, "webhook", "alice", "assistant", "hi there")
            .await
            .unwrap();

        let turns = list_turns(&db, "alice", None).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[0].content, "hello");
        assert_eq!(turns[1].role, "assistant");
    }

    #[tokio::test]
    async fn timestamps_never_decrease() {
        let db = Database::open_in_memory().await.unwrap();

        // Burst writes land within the same wall-clock millisecond; the
        // clamp must still produce a strictly-ordered sequence.
        for i in 0..10 {
            record_turn(&db, "telegram", "bob", "user", &format!("msg {i}"))
                .await
                .unwrap();
        }

        let turns = list_turns(&db, "bob", None).await.unwrap();
        assert_eq!(turns.len(), 10);
        for pair in turns.windows(2) {
            assert!(
                pair[0].timestamp_ms <= pair[1].timestamp_ms,
                "timestamps must be non-decreasing"
            );
        }
        // Keys are unique by construction.
        let mut keys: Vec<_> = turns.iter().map(|t| t.key.clone()).collect();
        keys.dedup();
        assert_eq!(keys.len(), 10);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let db = Database::open_in_memory().await.unwrap();

        record_turn(&db, "webhook", "alice", "user", "a").await.unwrap();
        record_turn(&db, "webhook", "carol", "user", "c").await.unwrap();

        let alice = list_turns(&db, "alice", None).await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].content, "a");
    }

    #[tokio::test]
    async fn clear_session_removes_turns() {
        let db = Database::open_in_memory().await.unwrap();

        record_turn(&db, "webhook", "alice", "user", "a").await.unwrap();
        record_turn(&db, "webhook", "alice", "assistant", "b")
            .await
            .unwrap();

        let removed = clear_session(&db, "alice").await.unwrap();
        assert_eq!(removed, 2);
        assert!(list_turns(&db, "alice", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn limit_returns_oldest_turns() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            record_turn(&db, "webhook", "alice", "user", &format!("m{i}"))
                .await
                .unwrap();
        }
        let turns = list_turns(&db, "alice", Some(2)).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "m0");
        assert_eq!(turns[1].content, "m1");
    }
}
