/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    error::{TabiError, TabiResult},
    notifier::Notifier,
    session::SessionManager,
    store::TravelStore,
    users::UserDirectory,
};
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub travel_store: Arc<TravelStore>,
    pub user_directory: Arc<UserDirectory>,
    pub sessions: Arc<SessionManager>,
    pub notifier: Notifier,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> TabiResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let travel_store = Arc::new(TravelStore::new(config.storage.travel_data_file.clone()));
        let user_directory = Arc::new(UserDirectory::new(config.storage.user_file.clone()));
        let sessions = Arc::new(SessionManager::new());
        let notifier = Notifier::new(config.notifier.clone());

        Ok(Self {
            config: Arc::new(config),
            travel_store,
            user_directory,
            sessions,
            notifier,
        })
    }

    /// Build a context around an externally supplied notifier. Tests use
    /// this with `Notifier::channel()` to observe emitted notifications.
    pub async fn with_notifier(config: ServerConfig, notifier: Notifier) -> TabiResult<Self> {
        let mut ctx = Self::new(config).await?;
        ctx.notifier = notifier;
        Ok(ctx)
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> TabiResult<()> {
        let dirs = vec![
            config.storage.data_directory.clone(),
            config.storage.photo_directory.clone(),
            config.storage.video_directory.clone(),
            config.photo_lowres_directory(),
            config.video_lowres_directory(),
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    TabiError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
