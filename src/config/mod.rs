use anyhow::{bail, Context};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub short_id: ShortIdConfig,
    pub redirect_status: RedirectMode,
    /// Seed the demo accounts and links at startup
    pub seed_demo_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    Hmac,
    Jwt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub mode: SessionMode,
    /// Signing secret. If None, a random secret is generated at startup
    /// and sessions won't survive restarts.
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "SessionConfig::default_ttl_secs")]
    pub ttl_secs: u64,
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortIdConfig {
    pub length: usize,
    pub max_attempts: usize,
}

/// HTTP status used for public short link redirects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RedirectMode {
    MovedPermanently,
    #[default]
    Found,
    Temporary,
    Permanent,
}

impl RedirectMode {
    pub fn status_code(self) -> StatusCode {
        match self {
            RedirectMode::MovedPermanently => StatusCode::MOVED_PERMANENTLY,
            RedirectMode::Found => StatusCode::FOUND,
            RedirectMode::Temporary => StatusCode::TEMPORARY_REDIRECT,
            RedirectMode::Permanent => StatusCode::PERMANENT_REDIRECT,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "301" => Some(RedirectMode::MovedPermanently),
            "302" => Some(RedirectMode::Found),
            "307" => Some(RedirectMode::Temporary),
            "308" => Some(RedirectMode::Permanent),
            _ => None,
        }
    }
}

impl SessionConfig {
    pub const fn default_ttl_secs() -> u64 {
        24 * 60 * 60
    }

    /// Cookie names are RFC 6265 tokens: visible ASCII without separators
    pub fn is_valid_cookie_name(name: &str) -> bool {
        !name.is_empty()
            && name.bytes().all(|b| {
                b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
            })
    }
}

impl ShortIdConfig {
    pub const MIN_LENGTH: usize = 4;
    pub const MAX_LENGTH: usize = 32;
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            session: SessionConfig {
                mode: SessionMode::Hmac,
                secret: None,
                ttl_secs: SessionConfig::default_ttl_secs(),
                cookie_name: "session".to_string(),
                cookie_secure: false,
            },
            short_id: ShortIdConfig {
                length: 6,
                max_attempts: 10,
            },
            redirect_status: RedirectMode::default(),
            seed_demo_data: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let host = std::env::var("HOST").unwrap_or(defaults.server.host);
        let port = match std::env::var("PORT") {
            Ok(v) => v.parse::<u16>().context("PORT must be a valid port number")?,
            Err(_) => defaults.server.port,
        };

        let session_mode = match std::env::var("SESSION_MODE")
            .unwrap_or_else(|_| "hmac".to_string())
            .to_lowercase()
            .as_str()
        {
            "hmac" => SessionMode::Hmac,
            "jwt" => SessionMode::Jwt,
            other => {
                tracing::warn!(
                    "Unknown SESSION_MODE '{other}', falling back to 'hmac'. Supported values: hmac, jwt"
                );
                SessionMode::Hmac
            }
        };

        let session_secret = std::env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let ttl_secs = match std::env::var("SESSION_TTL_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .context("SESSION_TTL_SECS must be a number of seconds")?,
            Err(_) => SessionConfig::default_ttl_secs(),
        };
        if ttl_secs == 0 {
            bail!("SESSION_TTL_SECS must be greater than zero");
        }

        let cookie_name =
            std::env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.session.cookie_name);
        if !SessionConfig::is_valid_cookie_name(&cookie_name) {
            bail!("SESSION_COOKIE_NAME '{cookie_name}' is not a valid cookie name");
        }

        let length = match std::env::var("SHORT_ID_LENGTH") {
            Ok(v) => v
                .parse::<usize>()
                .context("SHORT_ID_LENGTH must be a positive integer")?,
            Err(_) => defaults.short_id.length,
        };
        if !(ShortIdConfig::MIN_LENGTH..=ShortIdConfig::MAX_LENGTH).contains(&length) {
            bail!(
                "SHORT_ID_LENGTH must be between {} and {}",
                ShortIdConfig::MIN_LENGTH,
                ShortIdConfig::MAX_LENGTH
            );
        }

        let max_attempts = std::env::var("SHORT_ID_MAX_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(defaults.short_id.max_attempts);

        let redirect_status = match std::env::var("REDIRECT_STATUS") {
            Ok(v) => RedirectMode::parse(&v).unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown REDIRECT_STATUS '{v}', falling back to 302. Supported values: 301, 302, 307, 308"
                );
                RedirectMode::default()
            }),
            Err(_) => RedirectMode::default(),
        };

        Ok(Config {
            server: ServerConfig { host, port },
            session: SessionConfig {
                mode: session_mode,
                secret: session_secret,
                ttl_secs,
                cookie_name,
                cookie_secure: env_flag("SESSION_COOKIE_SECURE"),
            },
            short_id: ShortIdConfig {
                length,
                max_attempts,
            },
            redirect_status,
            seed_demo_data: env_flag("SEED_DEMO_DATA"),
        })
    }
}
