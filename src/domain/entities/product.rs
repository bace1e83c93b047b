use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

/// A purchasable capability. Stored in `entitlements.product_key`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[sqlx(type_name = "product_key", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProductKey {
    PresenceBasic,
    PresencePro,
    QrStudio,
}

impl ProductKey {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn family(&self) -> ProductFamily {
        match self {
            ProductKey::PresenceBasic | ProductKey::PresencePro => ProductFamily::Presence,
            ProductKey::QrStudio => ProductFamily::Qr,
        }
    }
}

impl std::fmt::Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product line a checkout or portal request is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum ProductFamily {
    Presence,
    Qr,
}

impl ProductFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductFamily::Presence => "presence",
            ProductFamily::Qr => "qr",
        }
    }

    pub fn products(&self) -> &'static [ProductKey] {
        match self {
            ProductFamily::Presence => &[ProductKey::PresenceBasic, ProductKey::PresencePro],
            ProductFamily::Qr => &[ProductKey::QrStudio],
        }
    }

    /// Path under the app origin that the customer lands on after checkout or portal.
    pub fn billing_path(&self) -> &'static str {
        match self {
            ProductFamily::Presence => "/presence/billing",
            ProductFamily::Qr => "/qr/billing",
        }
    }
}

/// Tier within the presence product line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceTier {
    Basic,
    Pro,
}

impl PresenceTier {
    pub fn product(&self) -> ProductKey {
        match self {
            PresenceTier::Basic => ProductKey::PresenceBasic,
            PresenceTier::Pro => ProductKey::PresencePro,
        }
    }
}

/// Billing cadence.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[sqlx(type_name = "billing_plan", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Plan {
    Monthly,
    Onetime,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Plan::Monthly)
    }

    /// Stripe Checkout `mode` parameter for this cadence.
    pub fn checkout_mode(&self) -> &'static str {
        match self {
            Plan::Monthly => "subscription",
            Plan::Onetime => "payment",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
