//! The CiviCRM Financial Type assigned to a WooCommerce product.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::FinancialTypeId;

/// WooCommerce product meta key holding the CiviCRM Financial Type id.
pub const FINANCIAL_TYPE_META_KEY: &str = "_woocommerce_civicrm_financial_type_id";

/// Meta value marking a product that must never be synced to CiviCRM.
pub const EXCLUDE_SENTINEL: &str = "exclude";

/// What a product's Financial Type meta says about syncing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FinancialTypeSetting {
    /// No meta, an empty value, or `0`.
    #[default]
    Unset,
    /// Skip this product when building Line Items.
    Exclude,
    /// Sync with this Financial Type.
    Id(FinancialTypeId),
}

impl FinancialTypeSetting {
    /// Interpret a raw product meta value.
    ///
    /// Anything that is neither the exclude sentinel nor a positive integer is
    /// treated as unset.
    #[must_use]
    pub fn from_meta(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::String(s)) => Self::from_meta_str(s),
            Some(serde_json::Value::Number(n)) => n
                .as_i64()
                .filter(|id| *id > 0)
                .map_or(Self::Unset, |id| Self::Id(FinancialTypeId::new(id))),
            _ => Self::Unset,
        }
    }

    /// Interpret a meta value stored as text.
    #[must_use]
    pub fn from_meta_str(value: &str) -> Self {
        if value == EXCLUDE_SENTINEL {
            return Self::Exclude;
        }
        value
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|id| *id > 0)
            .map_or(Self::Unset, |id| Self::Id(FinancialTypeId::new(id)))
    }

    /// The Financial Type id, if one is set.
    #[must_use]
    pub const fn id(&self) -> Option<FinancialTypeId> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Unset | Self::Exclude => None,
        }
    }

    /// Whether the product is excluded from sync.
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        matches!(self, Self::Exclude)
    }
}

impl fmt::Display for FinancialTypeSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => Ok(()),
            Self::Exclude => f.write_str(EXCLUDE_SENTINEL),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for FinancialTypeSetting {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unset => serializer.serialize_str(""),
            Self::Exclude => serializer.serialize_str(EXCLUDE_SENTINEL),
            Self::Id(id) => id.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FinancialTypeSetting {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_meta(raw.as_ref()))
    }
}
