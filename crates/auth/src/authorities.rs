//! Conversion of a roles claim into granted authorities.

use crate::claims::{get_claim, Claims};

/// Prefix that marks an authority as a role.
pub const ROLE_PREFIX: &str = "ROLE_";

/// Authority held by administrators.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Reads the string list at `claim_path` and prefixes every entry with
/// [`ROLE_PREFIX`].
#[derive(Debug, Clone)]
pub struct RolesAuthoritiesConverter {
    claim_path: String,
}

impl RolesAuthoritiesConverter {
    pub fn new(claim_path: impl Into<String>) -> Self {
        Self {
            claim_path: claim_path.into(),
        }
    }

    pub fn claim_path(&self) -> &str {
        &self.claim_path
    }

    /// Empty when the claim is missing or is not a list.
    pub fn convert(&self, claims: &Claims) -> Vec<String> {
        get_claim::<Vec<String>>(claims, &self.claim_path)
            .unwrap_or_default()
            .into_iter()
            .map(|role| format!("{ROLE_PREFIX}{role}"))
            .collect()
    }
}
