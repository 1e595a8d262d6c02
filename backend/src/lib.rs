//! Backend for the Toolhub internal tool directory.
//!
//! This crate owns the credit metering core: per-app per-user balance
//! records, the append-only adjustment ledger, and the four operations
//! that touch them (initialize, read, consume, admin adjust). Everything
//! else in Toolhub (catalog CRUD, auth, UI) talks to this core over the
//! REST contracts in the `shared` crate.

pub mod db;
pub mod domain;
pub mod identity;
pub mod registry;
pub mod rest;
pub mod storage;
