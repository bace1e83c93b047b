use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::product::{Plan, ProductKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entitlement_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntitlementStatus {
    Active,
    PastDue,
    Canceled,
    Revoked,
    Expired,
}

impl EntitlementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitlementStatus::Active => "active",
            EntitlementStatus::PastDue => "past_due",
            EntitlementStatus::Canceled => "canceled",
            EntitlementStatus::Revoked => "revoked",
            EntitlementStatus::Expired => "expired",
        }
    }

    /// Convert from Stripe subscription status string.
    /// Anything not explicitly paid-up maps to a non-granting status.
    pub fn from_stripe(s: &str) -> Self {
        match s {
            "active" | "trialing" => EntitlementStatus::Active,
            "canceled" => EntitlementStatus::Canceled,
            "incomplete_expired" => EntitlementStatus::Expired,
            _ => EntitlementStatus::PastDue,
        }
    }

    /// Only `active` grants access.
    pub fn is_active(&self) -> bool {
        matches!(self, EntitlementStatus::Active)
    }
}

#[derive(Debug, Clone)]
pub struct Entitlement {
    pub id: Uuid,
    pub account_id: Uuid,
    pub product_key: ProductKey,
    pub plan: Plan,
    pub status: EntitlementStatus,
    pub expires_at: Option<DateTime<Utc>>,
    /// Stripe subscription id, checkout session id, or `admin:<uuid>` for manual grants.
    pub source_ref: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entitlement {
    /// Active and not past `expires_at`. A missing expiry never lapses.
    pub fn grants_access_at(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && self.expires_at.is_none_or(|at| at > now)
    }
}
