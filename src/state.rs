use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::jwt::JwtKeys;
use crate::config::AppConfig;
use crate::users::{
    memory::MemoryUserRepo,
    repo::{PgUserRepo, UserRepo},
    services::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub keys: JwtKeys,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let repo: Arc<dyn UserRepo> = match config.database_url.as_deref() {
            Some(url) => {
                let db = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgUserRepo::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
                Arc::new(MemoryUserRepo::new())
            }
        };

        Ok(Self::from_parts(repo, config))
    }

    pub fn from_parts(repo: Arc<dyn UserRepo>, config: Arc<AppConfig>) -> Self {
        Self {
            users: UserService::new(repo),
            keys: JwtKeys::from_config(&config.jwt),
            config,
        }
    }

    #[cfg(test)]
    pub fn fake(environment: crate::config::Environment) -> Self {
        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            environment,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_days: 30,
            },
        });
        Self::from_parts(Arc::new(MemoryUserRepo::new()), config)
    }
}
