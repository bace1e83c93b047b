use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::order::{Order, OrderStatus},
};

#[async_trait]
pub trait OrderRepoTrait: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;
    /// Conditional write: only a non-terminal order whose status differs from
    /// `status` changes. Returns `None` when nothing was written.
    async fn set_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Option<Order>>;
}

/// Order handling for staff working a location.
#[derive(Clone)]
pub struct OpsUseCases {
    order_repo: Arc<dyn OrderRepoTrait>,
}

impl OpsUseCases {
    pub fn new(order_repo: Arc<dyn OrderRepoTrait>) -> Self {
        Self { order_repo }
    }

    #[instrument(skip(self))]
    pub async fn set_order_status(
        &self,
        actor_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
    ) -> AppResult<Order> {
        let Some(updated) = self.order_repo.set_status(order_id, status).await? else {
            let current = self
                .order_repo
                .get_by_id(order_id)
                .await?
                .ok_or(AppError::NotFound)?;
            return Err(AppError::InvalidInput(format!(
                "order is {} and cannot move to {}",
                current.status.as_str(),
                status.as_str()
            )));
        };

        tracing::info!(
            %actor_id,
            %order_id,
            to = status.as_str(),
            "Order status changed"
        );
        Ok(updated)
    }
}
