//! Sync configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CIVICRM_REST_URL` - CiviCRM APIv3 REST endpoint
//! - `CIVICRM_API_KEY` - API key of the CiviCRM user the sync acts as
//! - `CIVICRM_SITE_KEY` - CiviCRM site key
//! - `WOOCOMMERCE_URL` - WordPress site URL (the `wp-json` root is derived)
//! - `WOOCOMMERCE_CONSUMER_KEY` - WooCommerce REST consumer key
//! - `WOOCOMMERCE_CONSUMER_SECRET` - WooCommerce REST consumer secret
//!
//! ## Optional (sync settings, WordPress option names upper-cased)
//! - `WOOCOMMERCE_CIVICRM_FINANCIAL_TYPE_ID` - fallback Financial Type
//! - `WOOCOMMERCE_CIVICRM_FINANCIAL_TYPE_SHIPPING_ID` - shipping Financial Type
//! - `WOOCOMMERCE_CIVICRM_SYNC_CONTACT_EMAIL` - `yes` to sync emails
//! - `WOOCOMMERCE_CIVICRM_BILLING_LOCATION_TYPE_ID` - billing location type
//! - `WOOCOMMERCE_CIVICRM_SHIPPING_LOCATION_TYPE_ID` - shipping location type

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::settings::Settings;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Connection and behaviour settings for the sync.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// CiviCRM REST API configuration
    pub civicrm: CiviConfig,
    /// WooCommerce REST API configuration
    pub woocommerce: WooConfig,
    /// Mapping and toggle settings
    pub settings: Settings,
}

/// CiviCRM APIv3 REST configuration.
///
/// Implements `Debug` manually to redact the keys.
#[derive(Clone)]
pub struct CiviConfig {
    /// REST endpoint (e.g. `https://crm.example.org/civicrm/ajax/rest`)
    pub rest_url: Url,
    /// API key of the acting CiviCRM user
    pub api_key: SecretString,
    /// Site key
    pub site_key: SecretString,
}

impl std::fmt::Debug for CiviConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CiviConfig")
            .field("rest_url", &self.rest_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("site_key", &"[REDACTED]")
            .finish()
    }
}

impl CiviConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            rest_url: get_url("CIVICRM_REST_URL")?,
            api_key: get_validated_secret("CIVICRM_API_KEY")?,
            site_key: get_validated_secret("CIVICRM_SITE_KEY")?,
        })
    }
}

/// WooCommerce REST API configuration.
///
/// Implements `Debug` manually to redact the consumer secret.
#[derive(Clone)]
pub struct WooConfig {
    /// WordPress site URL
    pub base_url: Url,
    /// REST consumer key (`ck_...`)
    pub consumer_key: String,
    /// REST consumer secret (`cs_...`)
    pub consumer_secret: SecretString,
}

impl std::fmt::Debug for WooConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooConfig")
            .field("base_url", &self.base_url.as_str())
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .finish()
    }
}

impl WooConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: get_url("WOOCOMMERCE_URL")?,
            consumer_key: get_required_env("WOOCOMMERCE_CONSUMER_KEY")?,
            consumer_secret: get_validated_secret("WOOCOMMERCE_CONSUMER_SECRET")?,
        })
    }
}

impl SyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if a secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            civicrm: CiviConfig::from_env()?,
            woocommerce: WooConfig::from_env()?,
            settings: settings_from_env(),
        })
    }
}

/// Read the sync settings from their upper-cased option names.
#[must_use]
pub fn settings_from_env() -> Settings {
    Settings::from_options(|key| get_optional_env(&key.to_ascii_uppercase()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get a required environment variable holding an absolute URL.
fn get_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject secrets that are empty or still hold a template placeholder.
fn validate_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.trim().is_empty() {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(get_required_env(key)?);
    validate_secret(&secret, key)?;
    Ok(secret)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_placeholder() {
        let result = validate_secret(&SecretString::from("your-api-key"), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_empty() {
        let result = validate_secret(&SecretString::from("  "), "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_valid() {
        let result = validate_secret(&SecretString::from("cs_4f9a1c2e7b"), "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_civi_config_debug_redacts_secrets() {
        let config = CiviConfig {
            rest_url: Url::parse("https://crm.example.org/civicrm/ajax/rest").unwrap(),
            api_key: SecretString::from("super_secret_api_key"),
            site_key: SecretString::from("super_secret_site_key"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("crm.example.org"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_api_key"));
        assert!(!debug_output.contains("super_secret_site_key"));
    }

    #[test]
    fn test_woo_config_debug_redacts_secrets() {
        let config = WooConfig {
            base_url: Url::parse("https://shop.example.org").unwrap(),
            consumer_key: "ck_public".to_string(),
            consumer_secret: SecretString::from("cs_super_secret"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("ck_public"));
        assert!(!debug_output.contains("cs_super_secret"));
    }
}
