use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::ops::OrderRepoTrait,
    domain::entities::order::{Order, OrderStatus},
};

fn row_to_order(row: &sqlx::postgres::PgRow) -> Order {
    Order {
        id: row.get("id"),
        location_id: row.get("location_id"),
        status: row.get("status"),
        customer_name: row.get("customer_name"),
        total_cents: row.get("total_cents"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str =
    "id, location_id, status, customer_name, total_cents, created_at, updated_at";

#[async_trait]
impl OrderRepoTrait for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {} FROM orders WHERE id = $1", SELECT_COLS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_order))
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Option<Order>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE orders SET status = $2, updated_at = NOW()
            WHERE id = $1
              AND status NOT IN ('completed', 'canceled')
              AND status <> $2
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_order))
    }
}
