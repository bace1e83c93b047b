use sqlx::{PgPool, error::ErrorKind};

use crate::app_error::AppError;

pub mod entitlement;
pub mod location;
pub mod order;
pub mod profile;
pub mod stripe_event;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.kind() {
                // The caller sent something the schema refuses; pass the message through.
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => {
                    tracing::debug!(error = %db_err, "Write rejected by constraint");
                    AppError::DataRejected(db_err.message().to_string())
                }
                _ => {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Upstream(db_err.message().to_string())
                }
            },
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Upstream(err.to_string())
            }
        }
    }
}
