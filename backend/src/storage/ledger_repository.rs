//! Access to the `credit_ledger` table.
//!
//! Write-once from this core's perspective: entries are appended inside
//! the same transaction as their balance mutation and never touched again.

use anyhow::Result;
use sqlx::{Row, SqliteExecutor};

use crate::domain::models::{LedgerEntry, LedgerSource};

/// Append one ledger entry
pub async fn append_entry<'e>(
    executor: impl SqliteExecutor<'e>,
    entry: &LedgerEntry,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO credit_ledger (app_id, user_id, delta, reason, source, actor_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.app_id)
    .bind(&entry.user_id)
    .bind(entry.delta)
    .bind(&entry.reason)
    .bind(entry.source.as_str())
    .bind(&entry.actor_id)
    .bind(&entry.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// List ledger entries for one (app, user), newest first
pub async fn list_entries<'e>(
    executor: impl SqliteExecutor<'e>,
    app_id: &str,
    user_id: &str,
    limit: u32,
) -> Result<Vec<LedgerEntry>> {
    let rows = sqlx::query(
        "SELECT app_id, user_id, delta, reason, source, actor_id, created_at
         FROM credit_ledger
         WHERE app_id = ? AND user_id = ?
         ORDER BY id DESC
         LIMIT ?",
    )
    .bind(app_id)
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    let entries = rows
        .iter()
        .map(|row| {
            let source: String = row.get("source");
            LedgerEntry {
                app_id: row.get("app_id"),
                user_id: row.get("user_id"),
                delta: row.get("delta"),
                reason: row.get("reason"),
                source: LedgerSource::from_stored(&source),
                actor_id: row.get("actor_id"),
                created_at: row.get("created_at"),
            }
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use chrono::Utc;

    #[tokio::test]
    async fn test_append_and_list_newest_first() {
        let db = DbConnection::init_test().await.unwrap();
        let now = Utc::now();

        let first = LedgerEntry::new("paco", "u1", -10, None, LedgerSource::Consumption, "u1", now);
        let second = LedgerEntry::new(
            "paco",
            "u1",
            25,
            Some("refund".to_string()),
            LedgerSource::Admin,
            "boss",
            now,
        );
        append_entry(db.pool(), &first).await.unwrap();
        append_entry(db.pool(), &second).await.unwrap();

        let entries = list_entries(db.pool(), "paco", "u1", 50).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], second);
        assert_eq!(entries[1], first);
    }

    #[tokio::test]
    async fn test_list_respects_limit_and_scope() {
        let db = DbConnection::init_test().await.unwrap();
        let now = Utc::now();

        for delta in [-1, -2, -3] {
            let entry =
                LedgerEntry::new("paco", "u1", delta, None, LedgerSource::Consumption, "u1", now);
            append_entry(db.pool(), &entry).await.unwrap();
        }
        let other = LedgerEntry::new("wiki", "u1", -4, None, LedgerSource::Consumption, "u1", now);
        append_entry(db.pool(), &other).await.unwrap();

        let entries = list_entries(db.pool(), "paco", "u1", 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].delta, -3);
        assert_eq!(entries[1].delta, -2);
    }
}
