use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::admin::{LocationRepoTrait, UpdateLocationInput},
    domain::entities::location::Location,
};

fn row_to_location(row: &sqlx::postgres::PgRow) -> Location {
    Location {
        id: row.get("id"),
        name: row.get("name"),
        contact_email: row.get("contact_email"),
        phone: row.get("phone"),
        is_published: row.get("is_published"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl LocationRepoTrait for PostgresPersistence {
    async fn update(&self, id: Uuid, input: &UpdateLocationInput) -> AppResult<Location> {
        // NULL keeps the stored value, '' clears a contact field.
        let row = sqlx::query(
            r#"
            UPDATE locations SET
                name = COALESCE($2, name),
                contact_email = CASE WHEN $3::text IS NULL THEN contact_email
                                     ELSE NULLIF($3::text, '') END,
                phone = CASE WHEN $4::text IS NULL THEN phone
                             ELSE NULLIF($4::text, '') END,
                is_published = COALESCE($5, is_published),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, contact_email, phone, is_published, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref())
        .bind(input.contact_email.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.is_published)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.as_ref().map(row_to_location).ok_or(AppError::NotFound)
    }
}
