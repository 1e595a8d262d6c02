//! Domain models for credit balances and the adjustment ledger.

use chrono::{DateTime, Utc};
use shared::{BalanceSnapshot, LedgerEntryDto};
use sqlx::{sqlite::SqliteRow, Row};

/// App-scoped role stored on the balance record. Independent of any
/// global role the user may hold elsewhere in Toolhub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRole {
    User,
    Administrator,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::User => "user",
            AppRole::Administrator => "administrator",
        }
    }

    /// Normalize the stored value. Older records used the spelling
    /// "admin"; a missing value means a plain user.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("administrator") | Some("admin") => AppRole::Administrator,
            _ => AppRole::User,
        }
    }
}

/// Which operation produced a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerSource {
    Consumption,
    Admin,
}

impl LedgerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerSource::Consumption => "consumption",
            LedgerSource::Admin => "admin",
        }
    }

    /// Stored values are written exclusively by this backend, so anything
    /// other than "admin" is a consumption entry.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "admin" => LedgerSource::Admin,
            _ => LedgerSource::Consumption,
        }
    }

    /// Default ledger reason when the caller supplies none
    pub fn default_reason(&self) -> &'static str {
        match self {
            LedgerSource::Consumption => "consumption",
            LedgerSource::Admin => "admin_adjustment",
        }
    }
}

/// Current credit state for one user within one app.
///
/// `balance` is `None` for apps that do not meter usage via credits.
/// All other optional columns are normalized away at read time so the
/// rest of the core sees one canonical shape.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRecord {
    pub app_id: String,
    pub user_id: String,
    pub balance: Option<i64>,
    pub used_this_period: i64,
    pub period_reset_at: Option<String>,
    pub role: AppRole,
    pub created_at: String,
}

impl BalanceRecord {
    /// Map a raw row into the canonical in-memory shape. This is the single
    /// place that absorbs schema drift: missing usage counters read as 0,
    /// missing or legacy role values read as their canonical equivalents.
    pub fn from_row(row: &SqliteRow) -> Self {
        let role: Option<String> = row.get("role");
        Self {
            app_id: row.get("app_id"),
            user_id: row.get("user_id"),
            balance: row.get("balance"),
            used_this_period: row.get::<Option<i64>, _>("used_this_period").unwrap_or(0),
            period_reset_at: row.get("period_reset_at"),
            role: AppRole::from_stored(role.as_deref()),
            created_at: row.get("created_at"),
        }
    }

    /// Create a record for a credit-bearing app with its starting allotment
    pub fn with_allotment(
        app_id: &str,
        user_id: &str,
        allotment: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            app_id: app_id.to_string(),
            user_id: user_id.to_string(),
            balance: Some(allotment),
            used_this_period: 0,
            period_reset_at: Some(now.to_rfc3339()),
            role: AppRole::User,
            created_at: now.to_rfc3339(),
        }
    }

    /// Create a minimal record for an app that has no credit system
    pub fn without_credits(app_id: &str, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            app_id: app_id.to_string(),
            user_id: user_id.to_string(),
            balance: None,
            used_this_period: 0,
            period_reset_at: None,
            role: AppRole::User,
            created_at: now.to_rfc3339(),
        }
    }

    pub fn snapshot(&self) -> BalanceSnapshot {
        BalanceSnapshot {
            balance: self.balance,
            used_this_period: self.used_this_period,
            period_reset_at: self.period_reset_at.clone(),
            role: self.role.as_str().to_string(),
            created_at: self.created_at.clone(),
        }
    }
}

/// An immutable audit record of a single balance mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub app_id: String,
    pub user_id: String,
    /// Raw requested delta; negative for consumption
    pub delta: i64,
    pub reason: String,
    pub source: LedgerSource,
    pub actor_id: String,
    pub created_at: String,
}

impl LedgerEntry {
    pub fn new(
        app_id: &str,
        user_id: &str,
        delta: i64,
        reason: Option<String>,
        source: LedgerSource,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            app_id: app_id.to_string(),
            user_id: user_id.to_string(),
            delta,
            reason: reason.unwrap_or_else(|| source.default_reason().to_string()),
            source,
            actor_id: actor_id.to_string(),
            created_at: now.to_rfc3339(),
        }
    }

    pub fn to_dto(&self) -> LedgerEntryDto {
        LedgerEntryDto {
            delta: self.delta,
            reason: self.reason.clone(),
            source: self.source.as_str().to_string(),
            actor_id: self.actor_id.clone(),
            created_at: self.created_at.clone(),
        }
    }
}
