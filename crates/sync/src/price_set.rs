//! Request-scoped cache of the default Price Set.

use tokio::sync::OnceCell;

use crate::civicrm::{CiviApi, DefaultPriceSet, default_price_set_params};
use crate::diagnostics::report_failure;

/// Holds the default Price Set for the lifetime of one request.
///
/// Create one per incoming event and hand it to the mapper. A successful
/// fetch is kept until the cache is dropped; a failed one is reported and
/// retried on the next call.
#[derive(Debug, Default)]
pub struct PriceSetCache {
    cell: OnceCell<DefaultPriceSet>,
}

impl PriceSetCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache pre-filled with known data.
    #[must_use]
    pub fn with_data(data: DefaultPriceSet) -> Self {
        Self {
            cell: OnceCell::new_with(Some(data)),
        }
    }

    /// The default Price Set, fetching it on first use.
    ///
    /// Returns `None` when CiviCRM cannot provide it.
    pub async fn get(&self, civi: &dyn CiviApi) -> Option<&DefaultPriceSet> {
        match self
            .cell
            .get_or_try_init(|| civi.default_price_set())
            .await
        {
            Ok(data) => Some(data),
            Err(e) => {
                report_failure(
                    civi,
                    "PriceSetCache::get",
                    &format!("Unable to retrieve default Price Set: {e}"),
                    &default_price_set_params(),
                )
                .await;
                None
            }
        }
    }

    /// The cached value, without fetching.
    #[must_use]
    pub fn cached(&self) -> Option<&DefaultPriceSet> {
        self.cell.get()
    }
}
