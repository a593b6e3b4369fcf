//! Shared types and configuration for Saldo.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - Audit stamps (who created/updated a record, and when)
//! - Configuration management

pub mod config;
pub mod types;

pub use config::AppConfig;
