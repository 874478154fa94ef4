//! Extension points.
//!
//! A [`Hooks`] value is built once at startup and passed to the mapper and the
//! email handlers. Line Item filters can rewrite each Line Item entry before it
//! is added to the Contribution params; listeners are told when an email has
//! been pushed to either side.

use std::fmt;
use std::sync::Arc;

use woo_civi_core::{ContactId, EmailRole, UserId};

use crate::civicrm::EmailRecord;
use crate::params::{ContributionParams, LineItemEntry};
use crate::woocommerce::{Order, OrderItem, Product};

/// What a Line Item filter can see besides the entry itself.
#[derive(Debug, Clone, Copy)]
pub struct LineItemContext<'a> {
    pub item: &'a OrderItem,
    pub product: &'a Product,
    pub order: &'a Order,
    /// The params as built so far, without the entry being filtered.
    pub params: &'a ContributionParams,
}

/// A callback that may rewrite a Line Item entry.
pub type LineItemFilter =
    dyn Fn(LineItemEntry, &LineItemContext<'_>) -> LineItemEntry + Send + Sync;

/// Receiver of email sync notifications.
///
/// Both methods default to doing nothing.
pub trait SyncListener: Send + Sync {
    /// A WordPress user's email was synced from CiviCRM.
    fn wc_email_updated(&self, _user_id: UserId, _role: EmailRole) {}

    /// A Contact's email was synced from WooCommerce. `email` is the record
    /// returned by `Email.create`, `None` when the create failed.
    fn civi_email_updated(&self, _contact_id: ContactId, _email: Option<&EmailRecord>) {}
}

#[derive(Clone)]
struct RegisteredFilter {
    priority: i32,
    filter: Arc<LineItemFilter>,
}

/// Registry of Line Item filters and sync listeners.
#[derive(Clone, Default)]
pub struct Hooks {
    filters: Vec<RegisteredFilter>,
    listeners: Vec<Arc<dyn SyncListener>>,
}

impl Hooks {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a Line Item filter.
    ///
    /// Filters run in ascending priority; equal priorities keep registration
    /// order.
    pub fn add_line_item_filter<F>(&mut self, priority: i32, filter: F) -> &mut Self
    where
        F: Fn(LineItemEntry, &LineItemContext<'_>) -> LineItemEntry + Send + Sync + 'static,
    {
        let at = self.filters.partition_point(|f| f.priority <= priority);
        self.filters.insert(
            at,
            RegisteredFilter {
                priority,
                filter: Arc::new(filter),
            },
        );
        self
    }

    /// Register a sync listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: Arc<dyn SyncListener>) -> &mut Self {
        self.listeners.push(listener);
        self
    }

    /// Pass an entry through every filter.
    #[must_use]
    pub fn apply_line_item_filters(
        &self,
        entry: LineItemEntry,
        context: &LineItemContext<'_>,
    ) -> LineItemEntry {
        self.filters
            .iter()
            .fold(entry, |entry, f| (f.filter)(entry, context))
    }

    pub(crate) fn notify_wc_email_updated(&self, user_id: UserId, role: EmailRole) {
        for listener in &self.listeners {
            listener.wc_email_updated(user_id, role);
        }
    }

    pub(crate) fn notify_civi_email_updated(
        &self,
        contact_id: ContactId,
        email: Option<&EmailRecord>,
    ) {
        for listener in &self.listeners {
            listener.civi_email_updated(contact_id, email);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field(
                "filter_priorities",
                &self.filters.iter().map(|f| f.priority).collect::<Vec<_>>(),
            )
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
