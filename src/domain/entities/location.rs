use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A business listing shown on the presence storefront.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub is_published: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
