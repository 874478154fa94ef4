//! CLI command implementations.
//!
//! Every command runs against the live REST clients configured from the
//! environment and prints its result as JSON.

pub mod contributions;
pub mod email;
pub mod products;

use serde_json::Value;
use thiserror::Error;
use woo_civi_sync::civicrm::CiviError;
use woo_civi_sync::config::{ConfigError, SyncConfig};
use woo_civi_sync::{CiviClient, Hooks, Settings, WooClient, WooError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// CiviCRM client failure.
    #[error("CiviCRM error: {0}")]
    Civi(#[from] CiviError),

    /// WooCommerce client failure.
    #[error("WooCommerce error: {0}")]
    Woo(#[from] WooError),

    /// Invalid JSON argument.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid argument value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Clients and settings for one CLI invocation.
pub struct Context {
    pub civi: CiviClient,
    pub woo: WooClient,
    pub settings: Settings,
    pub hooks: Hooks,
}

impl Context {
    /// Build the clients from environment configuration.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if configuration is incomplete or a client
    /// cannot be built.
    pub fn from_env() -> Result<Self, CommandError> {
        let config = SyncConfig::from_env()?;
        Ok(Self {
            civi: CiviClient::new(&config.civicrm)?,
            woo: WooClient::new(&config.woocommerce)?,
            settings: config.settings,
            hooks: Hooks::new(),
        })
    }
}

/// Print a value as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a JSON argument that must hold an object.
pub fn parse_object(raw: &str) -> Result<Value, CommandError> {
    let value: Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(CommandError::InvalidArgument(
            "expected a JSON object".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object() {
        assert!(parse_object(r#"{"contact_id": 7}"#).is_ok());
        assert!(matches!(
            parse_object("[1, 2]"),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(parse_object("{"), Err(CommandError::Json(_))));
    }

    #[test]
    fn test_print_json_accepts_sync_types() {
        let params = woo_civi_sync::ContributionParams::default();
        assert!(print_json(&params).is_ok());
        assert!(print_json(&woo_civi_core::FinancialTypeSetting::Exclude).is_ok());
    }
}
