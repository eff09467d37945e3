use anyhow::{anyhow, Context, Result};
use base64::prelude::*;
use hmac::{Hmac, Mac};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Claim carried by the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: String,
    pub iat: i64,
    /// Unix seconds after which the claim is rejected
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(account_id: &str, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            sub: account_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(ttl_secs),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed session token")]
    Malformed,
    #[error("session signature verification failed")]
    BadSignature,
    #[error("session expired")]
    Expired,
}

/// Issues and verifies bearer tokens for the session cookie.
pub trait SessionCodec: Send + Sync {
    fn issue(&self, claims: &SessionClaims) -> Result<String>;

    /// Decode a token, rejecting tampered, malformed and expired claims
    fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, SessionError>;
}

/// Generate a random 32 byte signing secret
pub fn random_secret() -> Vec<u8> {
    use rand::RngExt;
    let mut rng = rand::rng();
    (0..32).map(|_| rng.random::<u8>()).collect()
}

/// `base64url(json).base64url(hmac-sha256)` tokens
pub struct HmacSessionCodec {
    key: Vec<u8>,
}

impl HmacSessionCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: secret.to_vec(),
        }
    }

    fn signature(&self, payload: &str) -> Result<Vec<u8>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key)
            .map_err(|e| anyhow!("Failed to create HMAC: {}", e))?;
        mac.update(payload.as_bytes());
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl SessionCodec for HmacSessionCodec {
    fn issue(&self, claims: &SessionClaims) -> Result<String> {
        let json = serde_json::to_string(claims)?;
        let payload = BASE64_URL_SAFE_NO_PAD.encode(json.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD.encode(self.signature(&payload)?);

        Ok(format!("{}.{}", payload, signature))
    }

    fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, SessionError> {
        let (payload, signature_b64) = token.split_once('.').ok_or(SessionError::Malformed)?;
        if signature_b64.contains('.') {
            return Err(SessionError::Malformed);
        }

        let provided = BASE64_URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| SessionError::Malformed)?;
        let expected = self
            .signature(payload)
            .map_err(|_| SessionError::BadSignature)?;

        if !bool::from(expected.ct_eq(&provided[..])) {
            return Err(SessionError::BadSignature);
        }

        let json = BASE64_URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| SessionError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| SessionError::Malformed)?;

        if claims.is_expired(now) {
            return Err(SessionError::Expired);
        }
        Ok(claims)
    }
}

/// HS256 JWT tokens
pub struct JwtSessionCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtSessionCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the caller's clock in `verify`.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }
}

impl SessionCodec for JwtSessionCodec {
    fn issue(&self, claims: &SessionClaims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .context("failed to sign session token")
    }

    fn verify(&self, token: &str, now: i64) -> Result<SessionClaims, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature => SessionError::BadSignature,
                _ => SessionError::Malformed,
            },
        )?;

        if data.claims.is_expired(now) {
            return Err(SessionError::Expired);
        }
        Ok(data.claims)
    }
}
