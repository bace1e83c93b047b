use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of an online presence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Ready,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    /// Terminal orders are frozen. Any other change, backwards included, is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() && *self != next
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: Uuid,
    pub location_id: Uuid,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub total_cents: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
