use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::entitlement::{EntitlementRepoTrait, GrantEntitlementInput},
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        product::ProductKey,
    },
};

fn row_to_entitlement(row: &sqlx::postgres::PgRow) -> Entitlement {
    Entitlement {
        id: row.get("id"),
        account_id: row.get("account_id"),
        product_key: row.get("product_key"),
        plan: row.get("plan"),
        status: row.get("status"),
        expires_at: row.get("expires_at"),
        source_ref: row.get("source_ref"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, account_id, product_key, plan, status, expires_at, source_ref,
    created_at, updated_at
"#;

#[async_trait]
impl EntitlementRepoTrait for PostgresPersistence {
    async fn list_active(
        &self,
        account_id: Uuid,
        product_key: ProductKey,
    ) -> AppResult<Vec<Entitlement>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM entitlements
            WHERE account_id = $1 AND product_key = $2 AND status = 'active'
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
            SELECT_COLS
        ))
        .bind(account_id)
        .bind(product_key)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.iter().map(row_to_entitlement).collect())
    }

    async fn upsert_active(&self, input: &GrantEntitlementInput) -> AppResult<Entitlement> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO entitlements (id, account_id, product_key, plan, status, expires_at, source_ref)
            VALUES ($1, $2, $3, $4, 'active', $5, $6)
            ON CONFLICT (account_id, product_key, source_ref) DO UPDATE SET
                plan = EXCLUDED.plan,
                status = 'active',
                expires_at = EXCLUDED.expires_at,
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(Uuid::new_v4())
        .bind(input.account_id)
        .bind(input.product_key)
        .bind(input.plan)
        .bind(input.expires_at)
        .bind(&input.source_ref)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_entitlement(&row))
    }

    async fn set_status(&self, id: Uuid, status: EntitlementStatus) -> AppResult<Entitlement> {
        let row = sqlx::query(&format!(
            "UPDATE entitlements SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            SELECT_COLS
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref()
            .map(row_to_entitlement)
            .ok_or(AppError::NotFound)
    }

    async fn update_by_source_ref(
        &self,
        source_ref: &str,
        status: EntitlementStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE entitlements
            SET status = $2,
                expires_at = COALESCE($3, expires_at),
                updated_at = NOW()
            WHERE source_ref = $1 AND status <> 'revoked'
            "#,
        )
        .bind(source_ref)
        .bind(status)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected())
    }
}
