use async_trait::async_trait;
use sqlx::Row;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::billing::StripeEventRepoTrait,
};

#[async_trait]
impl StripeEventRepoTrait for PostgresPersistence {
    async fn exists(&self, stripe_event_id: &str) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM processed_stripe_events WHERE stripe_event_id = $1) AS seen",
        )
        .bind(stripe_event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.get("seen"))
    }

    async fn record(&self, stripe_event_id: &str, event_type: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO processed_stripe_events (stripe_event_id, event_type)
            VALUES ($1, $2)
            ON CONFLICT (stripe_event_id) DO NOTHING
            "#,
        )
        .bind(stripe_event_id)
        .bind(event_type)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(())
    }
}
