//! Price registry and the price-id → (product, plan) resolver.
//!
//! The registry is built once at startup from configuration and never
//! mutated afterwards. Every configured price id maps to exactly one
//! (product, plan) pair; lookups for anything else return `None`.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::entities::product::{Plan, ProductFamily, ProductKey};

/// Environment variable that holds the price id for each (product, plan) slot.
pub const PRICE_SLOTS: [(&str, ProductKey, Plan); 6] = [
    (
        "STRIPE_PRICE_PRESENCE_BASIC_MONTHLY",
        ProductKey::PresenceBasic,
        Plan::Monthly,
    ),
    (
        "STRIPE_PRICE_PRESENCE_BASIC_ONETIME",
        ProductKey::PresenceBasic,
        Plan::Onetime,
    ),
    (
        "STRIPE_PRICE_PRESENCE_PRO_MONTHLY",
        ProductKey::PresencePro,
        Plan::Monthly,
    ),
    (
        "STRIPE_PRICE_PRESENCE_PRO_ONETIME",
        ProductKey::PresencePro,
        Plan::Onetime,
    ),
    (
        "STRIPE_PRICE_QR_STUDIO_MONTHLY",
        ProductKey::QrStudio,
        Plan::Monthly,
    ),
    (
        "STRIPE_PRICE_QR_STUDIO_ONETIME",
        ProductKey::QrStudio,
        Plan::Onetime,
    ),
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PriceRegistryError {
    #[error("Configuration error: environment variable {var} not set")]
    Missing { var: &'static str },

    #[error("Price id configured twice: {first} and {second} share the same value")]
    Duplicate {
        first: &'static str,
        second: &'static str,
    },
}

/// The (product, plan) pair a price id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PricedProduct {
    pub product: ProductKey,
    pub plan: Plan,
}

#[derive(Debug, Clone)]
pub struct PriceRegistry {
    by_price_id: HashMap<String, PricedProduct>,
    by_product: HashMap<PricedProduct, String>,
}

impl PriceRegistry {
    /// Build the registry by looking up every slot in [`PRICE_SLOTS`].
    ///
    /// Blank values count as missing. The first missing variable aborts the
    /// build, and so does a price id shared by two slots.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PriceRegistryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut by_price_id: HashMap<String, PricedProduct> = HashMap::new();
        let mut by_product = HashMap::new();
        let mut owners: HashMap<String, &'static str> = HashMap::new();

        for (var, product, plan) in PRICE_SLOTS {
            let price_id = lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(PriceRegistryError::Missing { var })?;

            if let Some(first) = owners.get(&price_id) {
                return Err(PriceRegistryError::Duplicate {
                    first: *first,
                    second: var,
                });
            }
            owners.insert(price_id.clone(), var);

            let priced = PricedProduct { product, plan };
            by_price_id.insert(price_id.clone(), priced);
            by_product.insert(priced, price_id);
        }

        Ok(Self {
            by_price_id,
            by_product,
        })
    }

    pub fn resolve(&self, price_id: &str) -> Option<PricedProduct> {
        self.by_price_id.get(price_id).copied()
    }

    pub fn resolve_product(&self, price_id: &str) -> Option<ProductKey> {
        self.resolve(price_id).map(|p| p.product)
    }

    pub fn resolve_plan(&self, price_id: &str) -> Option<Plan> {
        self.resolve(price_id).map(|p| p.plan)
    }

    /// Configured price id for a (product, plan) pair.
    pub fn price_for(&self, product: ProductKey, plan: Plan) -> Option<&str> {
        self.by_product
            .get(&PricedProduct { product, plan })
            .map(String::as_str)
    }

    /// Every price id of a product family, grouped by plan.
    pub fn prices_for_family(&self, family: ProductFamily) -> Vec<(ProductKey, Plan, &str)> {
        let mut out = Vec::new();
        for &product in family.products() {
            for plan in [Plan::Monthly, Plan::Onetime] {
                if let Some(price_id) = self.price_for(product, plan) {
                    out.push((product, plan, price_id));
                }
            }
        }
        out
    }

    pub fn price_ids(&self) -> impl Iterator<Item = &str> {
        self.by_price_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_price_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_price_id.is_empty()
    }
}
