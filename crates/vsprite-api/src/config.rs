//! API configuration.

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Directory for staging multipart uploads before the store write
    pub staging_dir: String,
    /// Max upload size in bytes
    pub max_upload_size: usize,
    /// MIME types accepted at ingestion
    pub allowed_mime_types: Vec<String>,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_origins: vec!["*".to_string()],
            staging_dir: "/tmp/vsprite/uploads".to_string(),
            max_upload_size: 500 * 1024 * 1024,
            allowed_mime_types: default_mime_types(),
            environment: "development".to_string(),
        }
    }
}

fn default_mime_types() -> Vec<String> {
    [
        "video/mp4",
        "video/mpeg",
        "video/quicktime",
        "video/x-msvideo",
        "video/x-matroska",
        "video/webm",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            staging_dir: std::env::var("UPLOAD_STAGING_DIR")
                .unwrap_or_else(|_| "/tmp/vsprite/uploads".to_string()),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500 * 1024 * 1024),
            allowed_mime_types: std::env::var("ALLOWED_MIME_TYPES")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| default_mime_types()),
            environment: std::env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Check a multipart field's content type against the allow list.
    pub fn is_allowed_mime(&self, mime_type: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 4000);
        assert_eq!(config.max_upload_size, 524_288_000);
        assert!(!config.is_production());
    }

    #[test]
    fn test_mime_allow_list() {
        let config = ApiConfig::default();
        assert!(config.is_allowed_mime("video/mp4"));
        assert!(config.is_allowed_mime("VIDEO/MP4"));
        assert!(config.is_allowed_mime("video/webm"));
        assert!(!config.is_allowed_mime("image/png"));
        assert!(!config.is_allowed_mime("application/octet-stream"));
    }
}
