use std::sync::Arc;

use medicord_core::config::{AppConfig, ConfigError, LoadOptions};
use medicord_db::{connect_with_config, migrations, DbPool, MedicineRepository, SqlMedicineRepository};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::health::HealthState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<dyn MedicineRepository>,
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState::from_config(self.catalog.clone(), &self.config)
    }

    pub fn health_state(&self) -> HealthState {
        HealthState::new(self.db_pool.clone(), self.catalog.clone())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        max_connections = config.database.max_connections,
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    info!(
        event_name = "system.bootstrap.engines_configured",
        correlation_id = "bootstrap",
        detection_mode = ?config.interactions.mode(),
        score_policy = ?config.scoring.policy(),
        admin_writes = config.admin.api_token.is_some(),
        "interaction detector and substitute ranker configured"
    );

    let catalog: Arc<dyn MedicineRepository> = Arc::new(SqlMedicineRepository::new(db_pool.clone()));
    Ok(Application { config, db_pool, catalog })
}
