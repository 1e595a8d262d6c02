//! Access to the `credit_balances` table.

use anyhow::Result;
use sqlx::SqliteExecutor;

use crate::domain::models::BalanceRecord;

/// Fetch the balance record for one (app, user), normalized
pub async fn fetch_balance<'e>(
    executor: impl SqliteExecutor<'e>,
    app_id: &str,
    user_id: &str,
) -> Result<Option<BalanceRecord>> {
    let row = sqlx::query(
        "SELECT app_id, user_id, balance, used_this_period, period_reset_at, role, created_at
         FROM credit_balances
         WHERE app_id = ? AND user_id = ?",
    )
    .bind(app_id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(row.as_ref().map(BalanceRecord::from_row))
}

/// Insert a freshly created balance record
pub async fn insert_balance<'e>(
    executor: impl SqliteExecutor<'e>,
    record: &BalanceRecord,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO credit_balances
         (app_id, user_id, balance, used_this_period, period_reset_at, role, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.app_id)
    .bind(&record.user_id)
    .bind(record.balance)
    .bind(record.balance.map(|_| record.used_this_period))
    .bind(&record.period_reset_at)
    .bind(record.role.as_str())
    .bind(&record.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Write back a new balance and usage counter, guarded on the balance the
/// caller previously read. Returns false when the guard did not match,
/// meaning a concurrent transaction changed the row first.
pub async fn update_balance_guarded<'e>(
    executor: impl SqliteExecutor<'e>,
    app_id: &str,
    user_id: &str,
    expected_balance: i64,
    new_balance: i64,
    new_used: i64,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE credit_balances
         SET balance = ?, used_this_period = ?
         WHERE app_id = ? AND user_id = ? AND COALESCE(balance, 0) = ?",
    )
    .bind(new_balance)
    .bind(new_used)
    .bind(app_id)
    .bind(user_id)
    .bind(expected_balance)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
