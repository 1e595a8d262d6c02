//! Row-level access to the two credit collections.
//!
//! Functions here are generic over the executor so the service can run
//! them either directly on the pool (point reads) or inside a transaction
//! (every mutation).

pub mod balance_repository;
pub mod ledger_repository;
