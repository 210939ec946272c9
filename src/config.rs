/// Configuration management for the Tabiroku server
use crate::error::{TabiError, TabiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub media: MediaConfig,
    pub notifier: NotifierConfig,
    pub logging: LoggingConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    pub upload_limit: usize,
    /// Instant at which the site unlocks for visitors, reported verbatim
    /// by the unlock-time endpoint
    pub unlock_time: String,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub travel_data_file: PathBuf,
    pub user_file: PathBuf,
    pub static_directory: PathBuf,
    pub photo_directory: PathBuf,
    pub video_directory: PathBuf,
}

/// Media pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Seconds between background compression sweeps
    pub compress_interval_secs: u64,
    /// Downscale ratio used for the LQIP previews
    pub lqip_scale: f32,
    /// Target encoded size for LQIP previews, in KiB
    pub lqip_max_size_kb: u64,
    /// Maximum width of a video thumbnail; wider frames are downscaled
    pub thumbnail_max_width: u32,
}

/// Webhook notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Discord-compatible webhook URL; notifications are skipped when unset
    pub webhook_url: Option<String>,
    /// Sender name shown on webhook messages
    pub username: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> TabiResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("TABI_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("TABI_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| TabiError::Validation("Invalid port number".to_string()))?;
        let upload_limit = env::var("TABI_UPLOAD_LIMIT")
            .unwrap_or_else(|_| "52428800".to_string())
            .parse()
            .unwrap_or(52428800);
        let unlock_time = env::var("TABI_UNLOCK_TIME")
            .unwrap_or_else(|_| "2025-07-26T00:00:00Z".to_string());

        let data_directory: PathBuf = env::var("TABI_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let travel_data_file = env::var("TABI_TRAVEL_DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("travel_data.json"));
        let user_file = env::var("TABI_USER_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("user.json"));
        let static_directory: PathBuf = env::var("TABI_STATIC_DIRECTORY")
            .unwrap_or_else(|_| "./static".to_string())
            .into();
        let photo_directory = env::var("TABI_PHOTO_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_directory.join("photos"));
        let video_directory = env::var("TABI_VIDEO_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_directory.join("videos"));

        let compress_interval_secs = env::var("TABI_COMPRESS_INTERVAL")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);
        let lqip_scale = env::var("TABI_LQIP_SCALE")
            .unwrap_or_else(|_| "0.1".to_string())
            .parse()
            .unwrap_or(0.1);
        let lqip_max_size_kb = env::var("TABI_LQIP_MAX_SIZE_KB")
            .unwrap_or_else(|_| "1024".to_string())
            .parse()
            .unwrap_or(1024);
        let thumbnail_max_width = env::var("TABI_THUMBNAIL_MAX_WIDTH")
            .unwrap_or_else(|_| "800".to_string())
            .parse()
            .unwrap_or(800);

        let webhook_url = env::var("TABI_DISCORD_WEBHOOK").ok();
        let notifier_username =
            env::var("TABI_NOTIFIER_USERNAME").unwrap_or_else(|_| "tabiroku".to_string());

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                upload_limit,
                unlock_time,
            },
            storage: StorageConfig {
                data_directory,
                travel_data_file,
                user_file,
                static_directory,
                photo_directory,
                video_directory,
            },
            media: MediaConfig {
                compress_interval_secs,
                lqip_scale,
                lqip_max_size_kb,
                thumbnail_max_width,
            },
            notifier: NotifierConfig {
                webhook_url,
                username: notifier_username,
            },
            logging: LoggingConfig { level: log_level },
        })
    }

    /// Directory holding LQIP previews for uploaded photos
    pub fn photo_lowres_directory(&self) -> PathBuf {
        self.storage.photo_directory.join("lowres")
    }

    /// Directory holding first-frame thumbnails for uploaded videos
    pub fn video_lowres_directory(&self) -> PathBuf {
        self.storage.video_directory.join("lowres")
    }

    /// Validate configuration
    pub fn validate(&self) -> TabiResult<()> {
        if self.service.hostname.is_empty() {
            return Err(TabiError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.media.compress_interval_secs == 0 {
            return Err(TabiError::Validation(
                "Compression interval must be at least one second".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.media.lqip_scale) || self.media.lqip_scale == 0.0 {
            return Err(TabiError::Validation(
                "LQIP scale must be in (0, 1]".to_string(),
            ));
        }

        if let Err(e) = chrono::DateTime::parse_from_rfc3339(&self.service.unlock_time) {
            return Err(TabiError::Validation(format!(
                "Unlock time must be RFC 3339: {}",
                e
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ServerConfig {
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".into(),
                port: 8080,
                upload_limit: 52428800,
                unlock_time: "2025-07-26T00:00:00Z".into(),
            },
            storage: StorageConfig {
                data_directory: "./data".into(),
                travel_data_file: "./data/travel_data.json".into(),
                user_file: "./data/user.json".into(),
                static_directory: "./static".into(),
                photo_directory: "./static/photos".into(),
                video_directory: "./static/videos".into(),
            },
            media: MediaConfig {
                compress_interval_secs: 3600,
                lqip_scale: 0.1,
                lqip_max_size_kb: 1024,
                thumbnail_max_width: 800,
            },
            notifier: NotifierConfig {
                webhook_url: None,
                username: "tabiroku".into(),
            },
            logging: LoggingConfig { level: "info".into() },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = test_config();
        config.media.compress_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut config = test_config();
        config.media.lqip_scale = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_unlock_time_rejected() {
        let mut config = test_config();
        config.service.unlock_time = "next tuesday".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_lowres_directories() {
        let config = test_config();
        assert_eq!(
            config.photo_lowres_directory(),
            PathBuf::from("./static/photos/lowres")
        );
        assert_eq!(
            config.video_lowres_directory(),
            PathBuf::from("./static/videos/lowres")
        );
    }
}
