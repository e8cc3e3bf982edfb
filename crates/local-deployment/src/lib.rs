use async_trait::async_trait;
use db::DBService;
use deployment::{Config, Deployment, DeploymentError};
use tracing::info;

/// SQLite-backed deployment for a single admin server
#[derive(Clone)]
pub struct LocalDeployment {
    config: Config,
    db: DBService,
}

impl LocalDeployment {
    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        info!(addr = %config.socket_addr(), "Local deployment initialised");
        Ok(Self { config, db })
    }

    /// Wrap an already-open database, e.g. an in-memory one
    pub fn with_db(config: Config, db: DBService) -> Self {
        Self { config, db }
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        Self::from_config(Config::from_env()?).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }
}
