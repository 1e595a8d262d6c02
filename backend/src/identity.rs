//! Caller identity as handed over by the identity gateway.
//!
//! The gateway in front of this service authenticates requests and forwards
//! the verified identity in trusted headers. The core trusts the supervisor
//! claim verbatim and performs no independent verification.

/// Identity of the authenticated caller, constructed once at the HTTP
/// boundary and passed explicitly into every operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallerIdentity {
    pub user_id: String,
    /// Supervisor claim; required by admin operations
    pub supervisor: bool,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>, supervisor: bool) -> Self {
        Self {
            user_id: user_id.into(),
            supervisor,
        }
    }

    /// Convenience for tests and internal callers: a plain user
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(user_id, false)
    }

    /// Convenience for tests and internal callers: a supervisor
    pub fn supervisor(user_id: impl Into<String>) -> Self {
        Self::new(user_id, true)
    }
}
