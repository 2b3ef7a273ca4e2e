use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub auth: AuthConfig,
    pub media: MediaConfig,
    pub server: ServerConfig,
    /// Maximum accepted image size in bytes
    pub max_image_size: u64,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub data_dir: String,
    /// Externally visible origin, used to build local media URLs
    pub public_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How many times to regenerate an API key whose hash is already taken
    pub api_key_max_attempts: u32,
    /// Where to send a request whose session is missing or invalid
    pub login_path: String,
    /// Mark auth cookies `Secure`. Only ever disabled for plain-HTTP local development.
    pub secure_cookies: bool,
    pub session_ttl_days: i64,
}

#[derive(Debug, Clone)]
pub enum MediaBackend {
    Cloudinary,
    Local,
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    /// Directory for the local media backend
    pub local_media_path: String,
    /// Cloudinary credentials (required when backend is cloudinary)
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_key_max_attempts: 5,
            login_path: "/auth".to_string(),
            secure_cookies: true,
            session_ttl_days: 365,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            backend: MediaBackend::Local,
            local_media_path: "./media".to_string(),
            cloudinary_cloud_name: None,
            cloudinary_api_key: None,
            cloudinary_api_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let bind_address =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let max_image_size = std::env::var("MAX_IMAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5 * 1024 * 1024); // 5MB

        let api_key_max_attempts = std::env::var("API_KEY_MAX_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let session_ttl_days = std::env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(365);

        let login_path = std::env::var("LOGIN_PATH").unwrap_or_else(|_| "/auth".to_string());

        let secure_cookies = std::env::var("SECURE_COOKIES")
            .map(|v| !(v == "false" || v == "0"))
            .unwrap_or(true);

        let media_backend = match std::env::var("MEDIA_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "cloudinary" => MediaBackend::Cloudinary,
            _ => MediaBackend::Local,
        };

        let local_media_path =
            std::env::var("LOCAL_MEDIA_PATH").unwrap_or_else(|_| "./media".to_string());

        let config = Config {
            server: ServerConfig {
                bind_address,
                data_dir,
                public_base_url,
            },
            auth: AuthConfig {
                api_key_max_attempts,
                login_path,
                secure_cookies,
                session_ttl_days,
            },
            media: MediaConfig {
                backend: media_backend,
                local_media_path,
                cloudinary_cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").ok(),
                cloudinary_api_key: std::env::var("CLOUDINARY_API_KEY").ok(),
                cloudinary_api_secret: std::env::var("CLOUDINARY_API_SECRET").ok(),
            },
            max_image_size,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if matches!(self.media.backend, MediaBackend::Cloudinary)
            && (self.media.cloudinary_cloud_name.is_none()
                || self.media.cloudinary_api_key.is_none()
                || self.media.cloudinary_api_secret.is_none())
        {
            return Err(ConfigError::ValidationError(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET are required when MEDIA_BACKEND=cloudinary".to_string(),
            ));
        }

        if self.auth.api_key_max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "API_KEY_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        if self.auth.session_ttl_days <= 0 {
            return Err(ConfigError::ValidationError(
                "SESSION_TTL_DAYS must be positive".to_string(),
            ));
        }

        if self.max_image_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_IMAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        if !self.auth.secure_cookies {
            tracing::warn!("SECURE_COOKIES is disabled; auth cookies will be sent over plain HTTP");
        }

        Ok(())
    }
}
