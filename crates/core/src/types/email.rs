//! Email roles shared by WooCommerce and CiviCRM.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The WooCommerce address an email belongs to.
///
/// WooCommerce stores a `billing_email` user meta field; there is no shipping
/// email field, but CiviCRM location types can still be mapped to the
/// shipping role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailRole {
    Billing,
    Shipping,
}

impl EmailRole {
    /// All roles, billing first.
    pub const ALL: [Self; 2] = [Self::Billing, Self::Shipping];

    /// The WooCommerce name of the role (`billing` / `shipping`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Shipping => "shipping",
        }
    }

    /// The WordPress user meta key holding this role's email.
    #[must_use]
    pub const fn user_meta_key(&self) -> &'static str {
        match self {
            Self::Billing => "billing_email",
            Self::Shipping => "shipping_email",
        }
    }

    /// Whether WooCommerce has a field to store this role's email in.
    #[must_use]
    pub const fn has_woocommerce_field(&self) -> bool {
        matches!(self, Self::Billing)
    }
}

impl fmt::Display for EmailRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmailRole {
    type Err = UnknownEmailRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "billing" => Ok(Self::Billing),
            "shipping" => Ok(Self::Shipping),
            other => Err(UnknownEmailRole(other.to_owned())),
        }
    }
}

/// An address type other than `billing` or `shipping`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown address type: {0}")]
pub struct UnknownEmailRole(pub String);
