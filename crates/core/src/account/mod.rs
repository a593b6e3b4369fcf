//! Chart of accounts.
//!
//! Accounts form a tree: group accounts structure the chart and are never
//! posted to; leaf accounts carry a running balance mutated only by posted
//! journal lines.

pub mod types;

pub use types::{Account, AccountType, CreateAccountInput, NormalBalance};
