//! Authentication Module
//!
//! Stateless identity tokens: HMAC-signed JWTs carrying the subject id and
//! email, valid for 24 hours from issuance. The module also defines the
//! authenticated [`Principal`] and the identity lookup the middleware uses to
//! resolve it.

use crate::error::ApiError;
use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reetro_core::{ConfigError, EntityId, EntityType, ReetroResult, Role, StorageError};
use reetro_storage::AuthoritativeStore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Minimum secret length accepted outside development.
pub const MIN_SECRET_LEN: usize = 32;

/// The HMAC family. Tokens with any other `alg` header are rejected.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

// ============================================================================
// CLOCK ABSTRACTION
// ============================================================================

/// Clock abstraction for token time validation.
///
/// Expiry is checked here rather than inside `jsonwebtoken` so tests can pin
/// the current time.
pub trait JwtClock: Send + Sync {
    /// Current time as Unix epoch seconds.
    fn now_epoch_secs(&self) -> i64;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl JwtClock for SystemClock {
    fn now_epoch_secs(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Fixed clock for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl JwtClock for FixedClock {
    fn now_epoch_secs(&self) -> i64 {
        self.0
    }
}


// ============================================================================
// JWT SECRET (TYPE-SAFE)
// ============================================================================

/// Symmetric signing secret that never shows up in logs.
#[derive(Clone)]
pub struct JwtSecret(SecretString);

impl JwtSecret {
    /// Wrap a secret. An empty or whitespace-only secret is a configuration error.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "JWT_SECRET_KEY".to_string(),
            });
        }
        Ok(Self(SecretString::new(secret.into())))
    }

    /// Expose the secret value (only for cryptographic operations).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn len(&self) -> usize {
        self.0.expose_secret().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JwtSecret([REDACTED, {} chars])", self.len())
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Token configuration, built once at startup and handed to [`TokenService`].
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret for signing and verification
    pub jwt_secret: JwtSecret,

    /// Token lifetime in seconds (default: 24 hours)
    pub jwt_expiration_secs: i64,

    /// Clock skew tolerance in seconds applied to the expiry check (default: 0)
    pub jwt_clock_skew_secs: i64,

    /// Clock for time validation
    pub clock: Arc<dyn JwtClock>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret)
            .field("jwt_expiration_secs", &self.jwt_expiration_secs)
            .field("jwt_clock_skew_secs", &self.jwt_clock_skew_secs)
            .field("clock", &"<JwtClock>")
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: JwtSecret) -> Self {
        Self {
            jwt_secret,
            jwt_expiration_secs: DEFAULT_TOKEN_TTL_SECS,
            jwt_clock_skew_secs: 0,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: impl JwtClock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Reject secrets too short for production. In development a short
    /// secret only logs a warning.
    pub fn validate_for_environment(&self, is_production: bool) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            if is_production {
                return Err(ConfigError::InvalidValue {
                    field: "JWT_SECRET_KEY".to_string(),
                    value: "[REDACTED]".to_string(),
                    reason: format!("must be at least {} characters", MIN_SECRET_LEN),
                });
            }
            tracing::warn!(
                secret_len = self.jwt_secret.len(),
                "JWT secret is short; use at least {} characters in production",
                MIN_SECRET_LEN
            );
        }
        if self.jwt_expiration_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "JWT_EXPIRATION_SECS".to_string(),
                value: self.jwt_expiration_secs.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// JWT CLAIMS
// ============================================================================

/// Token claims. Decoding fails unless every field is present and well-typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub authorized: bool,

    /// Subject (user) id
    pub id: EntityId,

    /// Subject email
    pub email: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(id: EntityId, email: impl Into<String>, issued_at: i64, ttl_secs: i64) -> Self {
        Self {
            authorized: true,
            id,
            email: email.into(),
            iat: issued_at,
            exp: issued_at + ttl_secs,
        }
    }

    /// A token stops being valid at the instant `exp` is reached.
    pub fn is_expired_at(&self, now: i64, leeway_secs: i64) -> bool {
        now >= self.exp + leeway_secs
    }
}

// ============================================================================
// TOKEN SERVICE
// ============================================================================

/// Why a token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidReason {
    #[error("malformed token")]
    Malformed,

    #[error("unexpected signing algorithm")]
    Algorithm,

    #[error("signature mismatch")]
    Signature,

    #[error("token expired")]
    Expired,

    #[error("token not marked authorized")]
    NotAuthorized,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    Invalid(InvalidReason),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(reason) => {
                tracing::error!(reason = %reason, "Token signing failed");
                ApiError::signing_failed()
            }
            TokenError::Invalid(_) => ApiError::invalid_token("Invalid token"),
        }
    }
}

/// Issues and validates identity tokens. Pure: no I/O, no global state.
#[derive(Clone)]
pub struct TokenService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("config", &self.config)
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(config: AuthConfig) -> Self {
        let secret = config.jwt_secret.expose().as_bytes();
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);

        // Signature and algorithm only; expiry is checked against our clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Issue a token for `subject_id`, expiring `jwt_expiration_secs` from now.
    pub fn issue(&self, subject_id: EntityId, subject_email: &str) -> Result<String, TokenError> {
        let now = self.config.clock.now_epoch_secs();
        let claims = Claims::new(subject_id, subject_email, now, self.config.jwt_expiration_secs);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify algorithm, signature and expiry, returning the typed claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        use jsonwebtoken::errors::ErrorKind;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                    InvalidReason::Algorithm
                }
                ErrorKind::InvalidSignature => InvalidReason::Signature,
                _ => InvalidReason::Malformed,
            };
            TokenError::Invalid(reason)
        })?;

        let claims = data.claims;
        let now = self.config.clock.now_epoch_secs();
        if claims.is_expired_at(now, self.config.jwt_clock_skew_secs) {
            return Err(TokenError::Invalid(InvalidReason::Expired));
        }
        if !claims.authorized {
            return Err(TokenError::Invalid(InvalidReason::NotAuthorized));
        }
        Ok(claims)
    }
}

// ============================================================================
// PRINCIPAL + IDENTITY LOOKUP
// ============================================================================

/// The authenticated identity for one request. Rebuilt per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn actor(&self) -> reetro_core::Actor {
        reetro_core::Actor {
            id: self.id,
            username: self.username.clone(),
        }
    }
}

/// Resolves a token subject to a [`Principal`].
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn principal_by_id(&self, id: EntityId) -> ReetroResult<Principal>;
}

/// Looks principals up directly in the authoritative store.
#[derive(Clone)]
pub struct StoreIdentityLookup {
    store: Arc<dyn AuthoritativeStore>,
}

impl StoreIdentityLookup {
    pub fn new(store: Arc<dyn AuthoritativeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IdentityLookup for StoreIdentityLookup {
    async fn principal_by_id(&self, id: EntityId) -> ReetroResult<Principal> {
        let user = self
            .store
            .user_get(id)
            .await?
            .ok_or(StorageError::NotFound {
                entity_type: EntityType::User,
                id,
            })?;
        Ok(Principal {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
