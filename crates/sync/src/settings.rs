//! Sync settings.
//!
//! The settings keep the WordPress option names of the plugin they replace so
//! existing option values can be copied over verbatim (as environment
//! variables, upper-cased).

use woo_civi_core::{EmailRole, FinancialTypeId, LocationTypeId};

/// Fallback top-level Financial Type for mixed-type orders.
pub const OPTION_FINANCIAL_TYPE: &str = "woocommerce_civicrm_financial_type_id";
/// Financial Type of the synthetic shipping Line Item.
pub const OPTION_SHIPPING_FINANCIAL_TYPE: &str = "woocommerce_civicrm_financial_type_shipping_id";
/// Yes/no toggle for the email sync in both directions.
pub const OPTION_SYNC_CONTACT_EMAIL: &str = "woocommerce_civicrm_sync_contact_email";
/// CiviCRM location type mapped to the WooCommerce billing address.
pub const OPTION_BILLING_LOCATION_TYPE: &str = "woocommerce_civicrm_billing_location_type_id";
/// CiviCRM location type mapped to the WooCommerce shipping address.
pub const OPTION_SHIPPING_LOCATION_TYPE: &str = "woocommerce_civicrm_shipping_location_type_id";

/// Runtime settings of the sync handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    /// Top-level Financial Type used when an order's items disagree.
    pub fallback_financial_type: Option<FinancialTypeId>,
    /// Financial Type of the shipping Line Item; shipping is not synced without it.
    pub shipping_financial_type: Option<FinancialTypeId>,
    /// Whether email addresses are synced between the two systems.
    pub sync_contact_email: bool,
    /// CiviCRM location types for the WooCommerce address roles.
    pub location_types: LocationTypeMap,
}

impl Settings {
    /// Build settings from an option lookup.
    ///
    /// Missing, empty and `0` values all mean "not configured".
    pub fn from_options<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let id = |key: &str| lookup(key).as_deref().and_then(parse_option_id);

        Self {
            fallback_financial_type: id(OPTION_FINANCIAL_TYPE).map(FinancialTypeId::new),
            shipping_financial_type: id(OPTION_SHIPPING_FINANCIAL_TYPE).map(FinancialTypeId::new),
            sync_contact_email: lookup(OPTION_SYNC_CONTACT_EMAIL)
                .as_deref()
                .is_some_and(is_yes),
            location_types: LocationTypeMap {
                billing: id(OPTION_BILLING_LOCATION_TYPE).map(LocationTypeId::new),
                shipping: id(OPTION_SHIPPING_LOCATION_TYPE).map(LocationTypeId::new),
            },
        }
    }
}

/// Which CiviCRM location type stands for which WooCommerce address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationTypeMap {
    pub billing: Option<LocationTypeId>,
    pub shipping: Option<LocationTypeId>,
}

impl LocationTypeMap {
    /// The location type mapped to a role.
    #[must_use]
    pub const fn location_for(&self, role: EmailRole) -> Option<LocationTypeId> {
        match role {
            EmailRole::Billing => self.billing,
            EmailRole::Shipping => self.shipping,
        }
    }

    /// The role a location type is mapped to, billing first when both match.
    #[must_use]
    pub fn role_for(&self, location_type_id: LocationTypeId) -> Option<EmailRole> {
        EmailRole::ALL
            .into_iter()
            .find(|role| self.location_for(*role) == Some(location_type_id))
    }
}

/// Interpret a yes/no option value.
#[must_use]
pub fn is_yes(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "1" | "on"
    )
}

fn parse_option_id(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
