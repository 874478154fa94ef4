//! Core types for the sync.
//!
//! This module provides type-safe wrappers for the concepts both sides share.

pub mod amount;
pub mod email;
pub mod financial_type;
pub mod id;

pub use amount::Amount;
pub use email::{EmailRole, UnknownEmailRole};
pub use financial_type::{EXCLUDE_SENTINEL, FINANCIAL_TYPE_META_KEY, FinancialTypeSetting};
pub use id::*;
