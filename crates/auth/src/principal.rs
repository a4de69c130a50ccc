//! The caller of one request, resolved from its `Authorization` header.
//!
//! A `Principal` is built once per request and passed explicitly to
//! whatever needs to know who is calling.

use enroll_core::error::CoreError;

use crate::authorities::{ROLE_ADMIN, ROLE_PREFIX};
use crate::claims::{get_claim, Claims, FromClaim};
use crate::config::SecurityConfig;
use crate::jwt::decode_claims;

#[derive(Debug, Clone, PartialEq)]
pub enum Principal {
    Anonymous,
    Authenticated {
        /// The token's `sub` claim; empty when the token carries none.
        subject: String,
        claims: Claims,
        /// Granted authorities, `ROLE_`-prefixed.
        authorities: Vec<String>,
    },
}

impl Principal {
    /// Build a principal from already validated claims.
    pub fn from_claims(claims: Claims, config: &SecurityConfig) -> Self {
        let authorities = config.authorities_converter().convert(&claims);
        let subject = get_claim::<String>(&claims, "sub").unwrap_or_default();
        Principal::Authenticated {
            subject,
            claims,
            authorities,
        }
    }

    /// Resolve the value of an `Authorization` header.
    ///
    /// A missing header is [`Principal::Anonymous`]. A header that is present
    /// but not a valid `Bearer` token is rejected.
    pub fn from_authorization_header(
        header: Option<&str>,
        config: &SecurityConfig,
    ) -> Result<Self, CoreError> {
        let Some(header) = header else {
            return Ok(Principal::Anonymous);
        };
        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            )
        })?;
        let claims = decode_claims(token.trim(), &config.jwt)?;
        let principal = Self::from_claims(claims, config);
        tracing::debug!(subject = principal.subject().unwrap_or_default(), "Authenticated request");
        Ok(principal)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated { .. })
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            Principal::Authenticated { subject, .. } => Some(subject),
            Principal::Anonymous => None,
        }
    }

    pub fn authorities(&self) -> &[String] {
        match self {
            Principal::Authenticated { authorities, .. } => authorities,
            Principal::Anonymous => &[],
        }
    }

    /// Authenticated and holding at least one of `required`. An empty list
    /// only requires authentication.
    pub fn is_authorized(&self, required: &[&str]) -> bool {
        self.is_authenticated()
            && (required.is_empty()
                || required
                    .iter()
                    .any(|authority| self.authorities().iter().any(|held| held == authority)))
    }

    /// Role check accepting both `ADMIN` and `ROLE_ADMIN`.
    pub fn has_role(&self, role: &str) -> bool {
        let wanted = if role.starts_with(ROLE_PREFIX) {
            role.to_string()
        } else {
            format!("{ROLE_PREFIX}{role}")
        };
        self.authorities().iter().any(|held| *held == wanted)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Typed claim at a dot path. Always `None` for anonymous callers.
    pub fn claim<T: FromClaim>(&self, path: &str) -> Option<T> {
        match self {
            Principal::Authenticated { claims, .. } => get_claim(claims, path),
            Principal::Anonymous => None,
        }
    }

    /// The identity-provider user id, read from the configured claim path.
    pub fn external_user_id(&self, config: &SecurityConfig) -> Option<String> {
        self.claim(&config.user_id_claim_path)
    }

    /// Fail with [`CoreError::Forbidden`] unless [`Self::is_authorized`].
    pub fn require(&self, required: &[&str]) -> Result<(), CoreError> {
        if !self.is_authenticated() {
            return Err(CoreError::Unauthorized("Authentication required".into()));
        }
        if !self.is_authorized(required) {
            return Err(CoreError::Forbidden(format!(
                "Requires one of: {}",
                required.join(", ")
            )));
        }
        Ok(())
    }
}
