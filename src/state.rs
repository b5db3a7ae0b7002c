use crate::config::AppConfig;
use crate::db;
use crate::users::{MemoryUserStore, PgUserStore, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users = match &config.database_url {
            Some(url) => {
                let pool = db::connect(url).await?;
                tracing::info!("using postgres user store");
                Arc::new(PgUserStore::new(pool)) as Arc<dyn UserStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; accounts are kept in memory");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { users, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with(|_| {})
    }

    /// In-memory state with a test config that `tweak` may adjust.
    #[cfg(test)]
    pub fn fake_with(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig {
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
            },
            enable_user_creation: true,
            host: "127.0.0.1".into(),
            port: 0,
        };
        tweak(&mut config);

        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config))
    }
}
