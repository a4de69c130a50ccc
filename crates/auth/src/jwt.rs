//! HS256 bearer-token validation.
//!
//! Tokens are decoded into a raw [`Claims`] map rather than a fixed struct,
//! so claim paths configured at runtime can reach any provider-specific
//! field.

use enroll_core::config::{self, ConfigError, Lookup};
use enroll_core::error::CoreError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::Claims;

/// Configuration for token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Expected `iss`, checked when set.
    pub issuer: Option<String>,
    /// Expected `aud`, checked when set.
    pub audience: Option<String>,
    /// Clock skew tolerated on `exp` and `nbf`, in seconds (default: 60).
    pub leeway_secs: u64,
}

/// Default clock-skew tolerance in seconds.
const DEFAULT_LEEWAY_SECS: u64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var           | Required | Default |
    /// |-------------------|----------|---------|
    /// | `JWT_SECRET`      | **yes**  | --      |
    /// | `JWT_ISSUER`      | no       | --      |
    /// | `JWT_AUDIENCE`    | no       | --      |
    /// | `JWT_LEEWAY_SECS` | no       | `60`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&config::env_lookup)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            secret: config::required(lookup, "JWT_SECRET")?,
            issuer: config::optional(lookup, "JWT_ISSUER"),
            audience: config::optional(lookup, "JWT_AUDIENCE"),
            leeway_secs: config::parse_or(lookup, "JWT_LEEWAY_SECS", "u64", DEFAULT_LEEWAY_SECS)?,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway_secs;
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            validation.required_spec_claims.insert("iss".to_string());
        }
        match &self.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                validation.required_spec_claims.insert("aud".to_string());
            }
            None => validation.validate_aud = false,
        }
        validation
    }
}

/// Verify signature, expiry and the configured issuer/audience, returning
/// the raw claim set.
pub fn decode_claims(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )
    .map(|data| data.claims)
    .map_err(|err| {
        tracing::debug!(error = %err, "Rejected bearer token");
        CoreError::Unauthorized("Invalid or expired token".into())
    })
}

/// Sign `claims` with HS256, adding `iat` and an `exp` of `ttl_secs` from now.
///
/// Validation is the production concern; issuing exists for tests and
/// local tooling.
pub fn issue_token(
    mut claims: Claims,
    ttl_secs: i64,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    claims.insert("iat".into(), now.into());
    claims.insert("exp".into(), (now + ttl_secs).into());
    if let Some(issuer) = &config.issuer {
        claims.entry("iss").or_insert_with(|| issuer.clone().into());
    }
    if let Some(audience) = &config.audience {
        claims.entry("aud").or_insert_with(|| audience.clone().into());
    }
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}
