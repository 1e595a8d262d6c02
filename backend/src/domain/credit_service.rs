//! The credit operations: initialize, read, consume, admin adjust.
//!
//! Each write operation runs as one database transaction that mutates the
//! balance row and appends exactly one ledger entry; both commit together
//! or not at all. All validation happens before any store access, so the
//! first failure aborts with no side effects.

use anyhow::{anyhow, Context, Result as AnyResult};
use chrono::Utc;
use shared::{
    AdminAdjustRequest, AdminAdjustResponse, ConsumeRequest, ConsumeResponse, InitializeRequest,
    InitializeResponse, LedgerHistoryResponse, ReadResponse,
};
use tracing::info;

use crate::db::DbConnection;
use crate::domain::errors::CreditError;
use crate::domain::models::{BalanceRecord, LedgerEntry, LedgerSource};
use crate::identity::CallerIdentity;
use crate::registry::AppRegistry;
use crate::storage::{balance_repository, ledger_repository};

const DEFAULT_HISTORY_LIMIT: u32 = 50;
const MAX_HISTORY_LIMIT: u32 = 100;

/// Service holding the store handle and the app registry. Constructed once
/// at startup and shared across handlers; tests build their own against an
/// in-memory database.
#[derive(Clone)]
pub struct CreditService {
    db: DbConnection,
    registry: AppRegistry,
}

impl CreditService {
    pub fn new(db: DbConnection, registry: AppRegistry) -> Self {
        Self { db, registry }
    }

    /// Lazily create the caller's balance record for an app.
    ///
    /// Idempotent with respect to record presence: an existing record is
    /// returned unchanged with `initialized = false`. The allotment is
    /// snapshotted at creation; later registry changes never retroactively
    /// update existing records.
    pub async fn initialize(
        &self,
        caller: Option<&CallerIdentity>,
        request: InitializeRequest,
    ) -> Result<InitializeResponse, CreditError> {
        let caller = require_identity(caller)?;
        let app_id = require_id(&request.app_id, "app_id")?;
        let entry = self
            .registry
            .get(app_id)
            .ok_or_else(|| CreditError::InvalidArgument(format!("unknown app: {app_id}")))?
            .clone();

        let mut tx = self.db.pool().begin().await.context("begin transaction")?;

        if let Some(existing) =
            balance_repository::fetch_balance(&mut *tx, app_id, &caller.user_id).await?
        {
            tx.commit().await.context("commit transaction")?;
            return Ok(InitializeResponse {
                success: true,
                initialized: false,
                data: existing.snapshot(),
            });
        }

        let now = Utc::now();
        let record = if entry.has_credits {
            BalanceRecord::with_allotment(app_id, &caller.user_id, entry.monthly_allotment, now)
        } else {
            BalanceRecord::without_credits(app_id, &caller.user_id, now)
        };
        balance_repository::insert_balance(&mut *tx, &record).await?;
        tx.commit().await.context("commit transaction")?;

        info!(
            app_id,
            user_id = %caller.user_id,
            balance = ?record.balance,
            "Initialized balance record"
        );

        Ok(InitializeResponse {
            success: true,
            initialized: true,
            data: record.snapshot(),
        })
    }

    /// Point read of the caller's balance record; never writes.
    ///
    /// A missing record reads as `exists = false` rather than a zero
    /// balance, so callers can tell "never initialized" apart from
    /// "balance is zero".
    pub async fn read(
        &self,
        caller: Option<&CallerIdentity>,
        app_id: &str,
    ) -> Result<ReadResponse, CreditError> {
        let caller = require_identity(caller)?;
        let app_id = require_id(app_id, "app_id")?;

        let record =
            balance_repository::fetch_balance(self.db.pool(), app_id, &caller.user_id).await?;

        Ok(match record {
            Some(record) => ReadResponse {
                success: true,
                exists: true,
                data: Some(record.snapshot()),
            },
            None => ReadResponse {
                success: true,
                exists: false,
                data: None,
            },
        })
    }

    /// Spend credits from the caller's own balance.
    ///
    /// Rejects with `ResourceExhausted` when the balance cannot cover the
    /// amount; in that case nothing is written. Consume never implicitly
    /// initializes a record.
    pub async fn consume(
        &self,
        caller: Option<&CallerIdentity>,
        request: ConsumeRequest,
    ) -> Result<ConsumeResponse, CreditError> {
        let caller = require_identity(caller)?;
        let app_id = require_id(&request.app_id, "app_id")?;
        if request.amount <= 0 {
            return Err(CreditError::InvalidArgument(
                "amount must be a positive number".to_string(),
            ));
        }

        let mut tx = self.db.pool().begin().await.context("begin transaction")?;

        let record = balance_repository::fetch_balance(&mut *tx, app_id, &caller.user_id)
            .await?
            .ok_or_else(|| CreditError::NotFound("not initialized for this app".to_string()))?;

        let current = record.balance.unwrap_or(0);
        if current < request.amount {
            // Dropping the transaction rolls it back: no deduction, no
            // ledger entry.
            return Err(CreditError::ResourceExhausted {
                requested: request.amount,
                available: current,
            });
        }

        let new_balance = current - request.amount;
        let new_used = record.used_this_period + request.amount;
        self.write_mutation(
            &mut tx,
            &record,
            current,
            new_balance,
            new_used,
            LedgerEntry::new(
                app_id,
                &caller.user_id,
                -request.amount,
                request.reason,
                LedgerSource::Consumption,
                &caller.user_id,
                Utc::now(),
            ),
        )
        .await?;
        tx.commit().await.context("commit transaction")?;

        info!(
            app_id,
            user_id = %caller.user_id,
            amount = request.amount,
            remaining = new_balance,
            "Consumed credits"
        );

        Ok(ConsumeResponse {
            success: true,
            credits_remaining: new_balance,
            total_used_this_month: new_used,
        })
    }

    /// Apply a signed correction to another user's balance.
    ///
    /// Supervisor-only; checked before any argument validation or store
    /// access. Unlike consumption this never rejects for underflow: the
    /// result is clamped at zero and the ledger records the raw delta.
    pub async fn admin_adjust(
        &self,
        caller: Option<&CallerIdentity>,
        request: AdminAdjustRequest,
    ) -> Result<AdminAdjustResponse, CreditError> {
        let caller = require_supervisor(caller)?;
        let app_id = require_id(&request.app_id, "app_id")?;
        let target_user_id = require_id(&request.target_user_id, "target_user_id")?;

        let mut tx = self.db.pool().begin().await.context("begin transaction")?;

        let record = balance_repository::fetch_balance(&mut *tx, app_id, target_user_id)
            .await?
            .ok_or_else(|| {
                CreditError::NotFound("target user not found for this app".to_string())
            })?;

        let before = record.balance.unwrap_or(0);
        let after = before.saturating_add(request.delta).max(0);
        self.write_mutation(
            &mut tx,
            &record,
            before,
            after,
            record.used_this_period,
            LedgerEntry::new(
                app_id,
                target_user_id,
                request.delta,
                request.reason,
                LedgerSource::Admin,
                &caller.user_id,
                Utc::now(),
            ),
        )
        .await?;
        tx.commit().await.context("commit transaction")?;

        info!(
            app_id,
            target_user_id,
            delta = request.delta,
            before,
            after,
            adjusted_by = %caller.user_id,
            "Applied admin adjustment"
        );

        Ok(AdminAdjustResponse {
            success: true,
            credits_before: before,
            credits_after: after,
            adjusted_by: caller.user_id.clone(),
        })
    }

    /// List the adjustment history for one user in one app, newest first.
    /// Supervisor-only, like the adjustment itself.
    pub async fn ledger_history(
        &self,
        caller: Option<&CallerIdentity>,
        app_id: &str,
        target_user_id: &str,
        limit: Option<u32>,
    ) -> Result<LedgerHistoryResponse, CreditError> {
        require_supervisor(caller)?;
        let app_id = require_id(app_id, "app_id")?;
        let target_user_id = require_id(target_user_id, "target_user_id")?;
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT);

        let entries =
            ledger_repository::list_entries(self.db.pool(), app_id, target_user_id, limit).await?;

        Ok(LedgerHistoryResponse {
            success: true,
            entries: entries.iter().map(LedgerEntry::to_dto).collect(),
        })
    }

    /// Write the balance update and its ledger entry inside the caller's
    /// transaction. The update is guarded on the balance read earlier in
    /// the same transaction; a failed guard means a concurrent writer got
    /// there first and the whole transaction must be abandoned.
    async fn write_mutation(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        record: &BalanceRecord,
        expected_balance: i64,
        new_balance: i64,
        new_used: i64,
        entry: LedgerEntry,
    ) -> AnyResult<()> {
        let applied = balance_repository::update_balance_guarded(
            &mut **tx,
            &record.app_id,
            &record.user_id,
            expected_balance,
            new_balance,
            new_used,
        )
        .await?;
        if !applied {
            return Err(anyhow!(
                "balance for {}/{} changed concurrently; caller may retry",
                record.app_id,
                record.user_id
            ));
        }
        ledger_repository::append_entry(&mut **tx, &entry).await?;
        Ok(())
    }
}

fn require_identity<'a>(
    caller: Option<&'a CallerIdentity>,
) -> Result<&'a CallerIdentity, CreditError> {
    caller.ok_or(CreditError::Unauthenticated)
}

fn require_supervisor<'a>(
    caller: Option<&'a CallerIdentity>,
) -> Result<&'a CallerIdentity, CreditError> {
    let caller = require_identity(caller)?;
    if !caller.supervisor {
        return Err(CreditError::PermissionDenied);
    }
    Ok(caller)
}

fn require_id<'a>(value: &'a str, field: &str) -> Result<&'a str, CreditError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CreditError::InvalidArgument(format!("{field} is required")));
    }
    Ok(trimmed)
}
