use thiserror::Error;

use crate::application::pricing::PriceRegistryError;

/// Infrastructure errors that can occur during application startup.
///
/// SECURITY: Display messages are sanitized and safe for logs/console output.
/// Debug output includes the full #[source] error chain which may contain
/// secrets (e.g., connection strings) - use Display (%e) not Debug (?e) in logs.
#[derive(Error, Debug)]
pub enum InfraError {
    #[error("Database connection failed. Check DATABASE_URL and ensure the database is running.")]
    DatabaseConnection(#[source] sqlx::Error),

    #[error("Redis connection failed. Check REDIS_URL and credentials.")]
    RedisConnection(#[source] redis::RedisError),

    #[error("Configuration error: environment variable {var} not set")]
    ConfigMissing { var: &'static str },

    #[error("Configuration error: environment variable {var} has an invalid value")]
    ConfigInvalid { var: &'static str },

    #[error("Configuration error: {first} and {second} are set to the same price id")]
    DuplicatePriceId {
        first: &'static str,
        second: &'static str,
    },

    #[error("TCP bind failed")]
    TcpBind(#[source] std::io::Error),

    #[error("Server error")]
    Server(#[source] std::io::Error),
}

impl From<sqlx::Error> for InfraError {
    fn from(e: sqlx::Error) -> Self {
        InfraError::DatabaseConnection(e)
    }
}

impl From<PriceRegistryError> for InfraError {
    fn from(e: PriceRegistryError) -> Self {
        match e {
            PriceRegistryError::Missing { var } => InfraError::ConfigMissing { var },
            PriceRegistryError::Duplicate { first, second } => {
                InfraError::DuplicatePriceId { first, second }
            }
        }
    }
}
