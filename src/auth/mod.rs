pub mod password;
pub mod session;

use anyhow::Context;
use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{SessionConfig, SessionMode};

pub use session::{HmacSessionCodec, JwtSessionCodec, SessionClaims, SessionCodec, SessionError};

/// Identity of the caller for the current request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Anonymous,
    Authenticated(String),
}

impl Session {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Session::Anonymous => None,
            Session::Authenticated(id) => Some(id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

pub struct AuthService {
    codec: Arc<dyn SessionCodec>,
    cookie_name: String,
    cookie_secure: bool,
    ttl_secs: i64,
}

impl AuthService {
    pub fn new(config: &SessionConfig) -> anyhow::Result<Self> {
        let secret = match config.secret.as_deref() {
            Some(s) => s.as_bytes().to_vec(),
            None => {
                warn!("SESSION_SECRET not set, using a random secret. Sessions won't survive restarts");
                session::random_secret()
            }
        };

        let codec: Arc<dyn SessionCodec> = match config.mode {
            SessionMode::Hmac => Arc::new(HmacSessionCodec::new(&secret)),
            SessionMode::Jwt => Arc::new(JwtSessionCodec::new(&secret)),
        };

        Self::with_codec(codec, config)
    }

    /// Build the service around a caller-provided codec
    pub fn with_codec(codec: Arc<dyn SessionCodec>, config: &SessionConfig) -> anyhow::Result<Self> {
        let ttl_secs =
            i64::try_from(config.ttl_secs).context("session TTL does not fit in i64 seconds")?;
        if !SessionConfig::is_valid_cookie_name(&config.cookie_name) {
            anyhow::bail!("'{}' is not a valid cookie name", config.cookie_name);
        }

        Ok(Self {
            codec,
            cookie_name: config.cookie_name.clone(),
            cookie_secure: config.cookie_secure,
            ttl_secs,
        })
    }

    /// Sign a fresh session for the account and render it as a `Set-Cookie` value
    pub fn issue_cookie(&self, account_id: &str) -> anyhow::Result<HeaderValue> {
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims::new(account_id, now, self.ttl_secs);
        let token = self.codec.issue(&claims)?;

        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
            self.cookie_name,
            token,
            self.ttl_secs,
            if self.cookie_secure { "; Secure" } else { "" }
        );
        HeaderValue::from_str(&cookie).context("session cookie is not a valid header value")
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> HeaderValue {
        let cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0{}",
            self.cookie_name,
            if self.cookie_secure { "; Secure" } else { "" }
        );
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("session=; Max-Age=0"))
    }

    /// Resolve the caller from the request's `Cookie` headers
    pub fn resolve(&self, headers: &HeaderMap) -> Session {
        let Some(token) = find_cookie(headers, &self.cookie_name) else {
            return Session::Anonymous;
        };

        match self.codec.verify(token, chrono::Utc::now().timestamp()) {
            Ok(claims) => Session::Authenticated(claims.sub),
            Err(err) => {
                debug!(error = %err, "ignoring invalid session cookie");
                Session::Anonymous
            }
        }
    }
}

fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}

/// Attach the caller's `Session` to the request extensions
pub async fn session_middleware(
    auth_service: Arc<AuthService>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = auth_service.resolve(request.headers());
    request.extensions_mut().insert(session);
    next.run(request).await
}
