//! Domain layer: models, errors, and the credit service itself.

pub mod credit_service;
pub mod errors;
pub mod models;

pub use credit_service::CreditService;
pub use errors::CreditError;
