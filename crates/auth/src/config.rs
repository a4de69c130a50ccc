use enroll_core::config::{self, ConfigError, Lookup};

use crate::authorities::RolesAuthoritiesConverter;
use crate::jwt::JwtConfig;

/// Default claim path of the roles list (Keycloak realm roles).
pub const DEFAULT_ROLES_CLAIM_PATH: &str = "realm_access.roles";

/// Default claim path of the identity-provider user id.
pub const DEFAULT_USER_ID_CLAIM_PATH: &str = "sub";

/// Where to find roles and the user id inside a token, plus token
/// validation settings.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub roles_claim_path: String,
    pub user_id_claim_path: String,
    pub jwt: JwtConfig,
}

impl SecurityConfig {
    /// Load security configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default              |
    /// |--------------------------|----------|----------------------|
    /// | `JWT_ROLES_CLAIM_PATH`   | no       | `realm_access.roles` |
    /// | `JWT_USER_ID_CLAIM_PATH` | no       | `sub`                |
    ///
    /// plus the variables read by [`JwtConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&config::env_lookup)
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            roles_claim_path: config::optional(lookup, "JWT_ROLES_CLAIM_PATH")
                .unwrap_or_else(|| DEFAULT_ROLES_CLAIM_PATH.to_string()),
            user_id_claim_path: config::optional(lookup, "JWT_USER_ID_CLAIM_PATH")
                .unwrap_or_else(|| DEFAULT_USER_ID_CLAIM_PATH.to_string()),
            jwt: JwtConfig::from_lookup(lookup)?,
        })
    }

    pub fn authorities_converter(&self) -> RolesAuthoritiesConverter {
        RolesAuthoritiesConverter::new(&self.roles_claim_path)
    }
}
