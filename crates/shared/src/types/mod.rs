//! Common types used across the application.

pub mod audit;
pub mod id;

pub use audit::AuditStamp;
pub use id::*;
