//! Configuration management for the PDF to audio server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub processing: ProcessingConfig,
    pub auth: AuthConfig,
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Absolute base used when building thumbnail and audio URLs
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Upper bound on pages rendered as thumbnails (None renders every page)
    pub thumbnail_max_pages: Option<u32>,
    pub thumbnail_dpi: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub synthesizer: SynthesizerKind,
    pub espeak_voice: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesizerKind {
    None,
    Espeak,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                public_base_url: "http://localhost:8000".to_string(),
                max_upload_bytes: 100 * 1024 * 1024,
            },
            database: DatabaseConfig {
                url: "sqlite:./pdf2audio.db".to_string(),
            },
            media: MediaConfig {
                root: PathBuf::from("./media"),
            },
            processing: ProcessingConfig {
                thumbnail_max_pages: Some(24),
                thumbnail_dpi: 50,
                timeout_secs: 120,
            },
            auth: AuthConfig {
                access_token_ttl_minutes: 60,
                refresh_token_ttl_hours: 24,
            },
            audio: AudioConfig {
                synthesizer: SynthesizerKind::None,
                espeak_voice: "en".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        let port = parse_or("SERVER_PORT", defaults.server.port);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", port));

        // 0 disables the thumbnail cap
        let thumbnail_max_pages = match parse_or("THUMBNAIL_MAX_PAGES", 24u32) {
            0 => None,
            n => Some(n),
        };

        let synthesizer = match env::var("AUDIO_SYNTHESIZER")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase()
            .as_str()
        {
            "espeak" | "espeak-ng" => SynthesizerKind::Espeak,
            _ => SynthesizerKind::None,
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port,
                public_base_url: public_base_url.trim_end_matches('/').to_string(),
                max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            media: MediaConfig {
                root: env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.media.root),
            },
            processing: ProcessingConfig {
                thumbnail_max_pages,
                thumbnail_dpi: parse_or("THUMBNAIL_DPI", defaults.processing.thumbnail_dpi),
                timeout_secs: parse_or("PROCESSING_TIMEOUT_SECS", defaults.processing.timeout_secs),
            },
            auth: AuthConfig {
                access_token_ttl_minutes: parse_or(
                    "ACCESS_TOKEN_TTL_MINUTES",
                    defaults.auth.access_token_ttl_minutes,
                ),
                refresh_token_ttl_hours: parse_or(
                    "REFRESH_TOKEN_TTL_HOURS",
                    defaults.auth.refresh_token_ttl_hours,
                ),
            },
            audio: AudioConfig {
                synthesizer,
                espeak_voice: env::var("ESPEAK_VOICE").unwrap_or(defaults.audio.espeak_voice),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
