use serde::{Deserialize, Serialize};

/// Snapshot of one user's credit state within one app.
///
/// `balance` is `None` when the app does not meter usage via credits;
/// callers must treat that as "no credit system" rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Remaining credit, absent for non-credit apps
    pub balance: Option<i64>,
    /// Cumulative consumption since the last period reset
    pub used_this_period: i64,
    /// Last period reset time (RFC 3339), absent for non-credit apps
    pub period_reset_at: Option<String>,
    /// App-scoped role: "user" or "administrator"
    pub role: String,
    /// Record creation time (RFC 3339)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeRequest {
    pub app_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub success: bool,
    /// True only when this call created the record
    pub initialized: bool,
    pub data: BalanceSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResponse {
    pub success: bool,
    /// False when the caller never initialized for this app
    pub exists: bool,
    pub data: Option<BalanceSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeRequest {
    pub app_id: String,
    /// Credits to deduct, must be positive
    pub amount: i64,
    /// Free-text reason recorded in the ledger
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumeResponse {
    pub success: bool,
    pub credits_remaining: i64,
    pub total_used_this_month: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAdjustRequest {
    pub app_id: String,
    pub target_user_id: String,
    /// Signed adjustment; the resulting balance is floored at zero
    pub delta: i64,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAdjustResponse {
    pub success: bool,
    pub credits_before: i64,
    pub credits_after: i64,
    pub adjusted_by: String,
}

/// One immutable ledger record as returned by the history endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntryDto {
    /// Raw signed delta as requested (not the clamped effective change)
    pub delta: i64,
    pub reason: String,
    /// "consumption" or "admin"
    pub source: String,
    /// Who caused the mutation (consumer or administrator)
    pub actor_id: String,
    /// Server-assigned timestamp (RFC 3339)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerHistoryResponse {
    pub success: bool,
    pub entries: Vec<LedgerEntryDto>,
}

/// Wire shape for every failure; no success body ever accompanies an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable machine-readable kind, e.g. "resource_exhausted"
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}
