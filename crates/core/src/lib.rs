//! WooCommerce ⇄ CiviCRM Core - Shared types library.
//!
//! This crate provides the types used across the sync components:
//! - `sync` - Remote API clients and the mapping/sync handlers
//! - `server` - HTTP intake for WooCommerce and CiviCRM lifecycle events
//! - `cli` - One-shot command-line runs of the same operations
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, amounts, Financial Type settings and email roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
