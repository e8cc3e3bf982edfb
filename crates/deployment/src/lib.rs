use anyhow::Error as AnyhowError;
use async_trait::async_trait;
use db::DBService;
use services::services::{
    category::CategoryService,
    database_validator::{DatabaseValidationError, DatabaseValidator, ValidationResult},
};
use thiserror::Error;

pub mod config;

pub use config::Config;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

/// Everything a request handler can reach
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    /// Build the deployment from the process environment
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn categories(&self) -> CategoryService {
        CategoryService::new(self.db().pool.clone())
    }

    async fn validate_database(&self) -> Result<ValidationResult, DeploymentError> {
        let result = DatabaseValidator::new(self.db().pool.clone())
            .ensure_ready()
            .await?;
        tracing::info!("{}", result.summary());
        Ok(result)
    }
}
