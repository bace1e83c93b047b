use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::access::ProfileRepoTrait,
    domain::entities::profile::{Profile, Role},
};

fn row_to_profile(row: &sqlx::postgres::PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        role: row.get("role"),
        stripe_customer_id: row.get("stripe_customer_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = "id, email, role, stripe_customer_id, created_at, updated_at";

#[async_trait]
impl ProfileRepoTrait for PostgresPersistence {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            SELECT_COLS
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.as_ref().map(row_to_profile))
    }

    async fn set_role(&self, account_id: Uuid, role: Role) -> AppResult<Profile> {
        let row = sqlx::query(&format!(
            "UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(account_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref().map(row_to_profile).ok_or(AppError::NotFound)
    }

    async fn set_stripe_customer_id(&self, account_id: Uuid, customer_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE profiles SET stripe_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(account_id)
        .bind(customer_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
