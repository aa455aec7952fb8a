use std::sync::Arc;

use nursery_config::{
    AccountConfig, CorsConfig, EmailConfig, JwtConfig, RateLimitConfig, StorageConfig,
};
use nursery_core::{FileStorage, LocalFileStorage};
use sqlx::PgPool;

use crate::utils::email::EmailService;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub email_config: EmailConfig,
    pub cors_config: CorsConfig,
    pub rate_limit_config: RateLimitConfig,
    pub account_config: AccountConfig,
    pub storage_config: StorageConfig,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    /// State wired from environment variables around an existing pool.
    pub fn from_env(db: PgPool) -> Self {
        let storage_config = StorageConfig::from_env();
        let storage = LocalFileStorage::new(
            storage_config.media_root.clone(),
            storage_config.media_url.clone(),
        );

        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            email_config: EmailConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            rate_limit_config: RateLimitConfig::from_env(),
            account_config: AccountConfig::from_env(),
            storage_config,
            storage: Arc::new(storage),
        }
    }

    pub fn email_service(&self) -> EmailService {
        EmailService::new(self.email_config.clone())
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = nursery_db::init_db_pool().await?;
    nursery_db::run_migrations(&db).await?;
    Ok(AppState::from_env(db))
}
