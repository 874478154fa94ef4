//! Application state shared across handlers.

use std::sync::Arc;

use woo_civi_sync::civicrm::{CiviApi, CiviClient, CiviError};
use woo_civi_sync::config::SyncConfig;
use woo_civi_sync::woocommerce::{WooClient, WooError, WooStore};
use woo_civi_sync::{EmailSync, Hooks, PriceSetCache, ProductSync, Settings};

/// Error building the remote API clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("CiviCRM client: {0}")]
    Civi(#[from] CiviError),
    #[error("WooCommerce client: {0}")]
    Woo(#[from] WooError),
}

/// Application state shared across all handlers.
///
/// Cheap to clone. Holds the two remote services behind their traits so tests
/// can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    civi: Arc<dyn CiviApi>,
    woo: Arc<dyn WooStore>,
    settings: Settings,
    hooks: Hooks,
}

impl AppState {
    /// Create state from already-built services.
    #[must_use]
    pub fn new(
        civi: Arc<dyn CiviApi>,
        woo: Arc<dyn WooStore>,
        settings: Settings,
        hooks: Hooks,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                civi,
                woo,
                settings,
                hooks,
            }),
        }
    }

    /// Create state with the REST clients described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig, hooks: Hooks) -> Result<Self, StateError> {
        let civi = CiviClient::new(&config.civicrm)?;
        let woo = WooClient::new(&config.woocommerce)?;
        Ok(Self::new(
            Arc::new(civi),
            Arc::new(woo),
            config.settings.clone(),
            hooks,
        ))
    }

    /// Get the CiviCRM API.
    #[must_use]
    pub fn civi(&self) -> &dyn CiviApi {
        self.inner.civi.as_ref()
    }

    /// Get the WooCommerce store.
    #[must_use]
    pub fn woo(&self) -> &dyn WooStore {
        self.inner.woo.as_ref()
    }

    /// Get the sync settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// The product mapper, using a Price Set cache owned by the caller's
    /// request.
    #[must_use]
    pub fn product_sync<'a>(&'a self, price_sets: &'a PriceSetCache) -> ProductSync<'a> {
        ProductSync::new(
            self.civi(),
            self.woo(),
            &self.inner.settings,
            &self.inner.hooks,
            price_sets,
        )
    }

    /// The email sync handlers.
    #[must_use]
    pub fn email_sync(&self) -> EmailSync<'_> {
        EmailSync::new(
            self.civi(),
            self.woo(),
            &self.inner.settings,
            &self.inner.hooks,
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.inner.settings)
            .field("hooks", &self.inner.hooks)
            .finish_non_exhaustive()
    }
}
