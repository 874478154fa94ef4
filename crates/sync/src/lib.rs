//! WooCommerce ⇄ CiviCRM sync handlers.
//!
//! Everything here is driven by a lifecycle event from one side: an order
//! being turned into a Contribution, a CiviCRM Email being edited, a
//! WooCommerce customer saving their address. Each handler reads from one
//! system, reshapes the data and writes it to the other, reporting failures
//! through [`diagnostics`] instead of returning them.
//!
//! # Modules
//!
//! - [`civicrm`] - CiviCRM APIv3 seam and REST client
//! - [`woocommerce`] - WooCommerce seam and `wc/v3` REST client
//! - [`products`] - Order to Contribution Line Item mapping, product Financial Types
//! - [`email_sync`] - Billing email sync in both directions
//! - [`hooks`] - Line Item filters and sync listeners
//! - [`price_set`] - Request-scoped default Price Set cache
//! - [`settings`] / [`config`] - Sync options and environment configuration

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod civicrm;
pub mod config;
pub mod diagnostics;
pub mod email_sync;
pub mod hooks;
pub mod params;
pub mod price_set;
pub mod products;
pub mod settings;
pub mod woocommerce;

pub use civicrm::{CiviApi, CiviClient, CiviError};
pub use config::{ConfigError, SyncConfig};
pub use email_sync::{
    CiviPostEvent, CustomerAddressEvent, EmailSync, EmailSyncOutcome, SkipReason,
};
pub use hooks::{Hooks, LineItemContext, SyncListener};
pub use params::{ContributionParams, LineItemData, LineItemEntry};
pub use price_set::PriceSetCache;
pub use products::ProductSync;
pub use settings::Settings;
pub use woocommerce::{WooClient, WooError, WooStore};
