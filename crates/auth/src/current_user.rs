//! Mapping the caller to an internal user, and stamping writes with it.

use std::sync::Arc;

use async_trait::async_trait;
use enroll_core::audit::AuditContext;
use enroll_core::error::CoreError;
use enroll_core::repository::Repository;
use enroll_core::revision::RevisionReader;
use enroll_core::types::DbId;
use enroll_db::models::user::{User, UserFilter};
use enroll_db::services::UserService;

use crate::config::SecurityConfig;
use crate::principal::Principal;

/// Resolves identity-provider user ids to internal user ids.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<DbId>, CoreError>;
}

#[async_trait]
impl<R> UserDirectory for UserService<R>
where
    R: Repository<User, Filter = UserFilter> + RevisionReader<User>,
{
    async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<DbId>, CoreError> {
        UserService::find_id_by_external_id(self, external_id).await
    }
}

/// Who is calling, in terms of the `users` table.
pub struct CurrentUser<D> {
    directory: Arc<D>,
    config: SecurityConfig,
}

impl<D> Clone for CurrentUser<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            config: self.config.clone(),
        }
    }
}

impl<D: UserDirectory> CurrentUser<D> {
    pub fn new(directory: Arc<D>, config: SecurityConfig) -> Self {
        Self { directory, config }
    }

    /// The internal id of the calling user.
    ///
    /// Anonymous callers are `Unauthorized`. An authenticated caller with no
    /// matching user row is `IllegalState`: the token is valid but the user
    /// was never provisioned.
    pub async fn resolve_user_id(&self, principal: &Principal) -> Result<DbId, CoreError> {
        if !principal.is_authenticated() {
            return Err(CoreError::Unauthorized("Authentication required".into()));
        }
        let external_id = principal.external_user_id(&self.config).ok_or_else(|| {
            CoreError::IllegalState(format!(
                "Token has no '{}' claim",
                self.config.user_id_claim_path
            ))
        })?;
        self.directory
            .find_id_by_external_id(&external_id)
            .await?
            .ok_or_else(|| {
                CoreError::IllegalState(format!("User not found for external id {external_id}"))
            })
    }

    /// Author for created/modified stamps and revision rows.
    ///
    /// Never fails: an unresolvable caller is recorded as anonymous.
    pub async fn audit_context(&self, principal: &Principal) -> AuditContext {
        if !principal.is_authenticated() {
            tracing::debug!("Unauthenticated write, revision has no author");
            return AuditContext::anonymous();
        }
        match self.resolve_user_id(principal).await {
            Ok(user_id) => AuditContext::for_user(user_id),
            Err(err) => {
                tracing::warn!(
                    subject = principal.subject().unwrap_or_default(),
                    error = %err,
                    "Could not resolve revision author"
                );
                AuditContext::anonymous()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::claims::Claims;
    use crate::jwt::JwtConfig;

    struct FixedDirectory(HashMap<&'static str, DbId>);

    #[async_trait]
    impl UserDirectory for FixedDirectory {
        async fn find_id_by_external_id(&self, external_id: &str) -> Result<Option<DbId>, CoreError> {
            Ok(self.0.get(external_id).copied())
        }
    }

    fn config() -> SecurityConfig {
        SecurityConfig {
            roles_claim_path: "realm_access.roles".into(),
            user_id_claim_path: "sub".into(),
            jwt: JwtConfig {
                secret: "unused".into(),
                issuer: None,
                audience: None,
                leeway_secs: 60,
            },
        }
    }

    fn current_user() -> CurrentUser<FixedDirectory> {
        let directory = FixedDirectory(HashMap::from([("kc-1", 11)]));
        CurrentUser::new(Arc::new(directory), config())
    }

    fn principal(claims: serde_json::Value) -> Principal {
        let claims: Claims = serde_json::from_value(claims).unwrap();
        Principal::from_claims(claims, &config())
    }

    #[tokio::test]
    async fn known_subject_resolves_to_user_id() {
        let caller = principal(json!({ "sub": "kc-1" }));
        assert_eq!(current_user().resolve_user_id(&caller).await.unwrap(), 11);
        assert_eq!(
            current_user().audit_context(&caller).await,
            AuditContext::for_user(11)
        );
    }

    #[tokio::test]
    async fn unknown_subject_is_illegal_state() {
        let caller = principal(json!({ "sub": "kc-404" }));
        assert_matches!(
            current_user().resolve_user_id(&caller).await,
            Err(CoreError::IllegalState(_))
        );
        assert_eq!(
            current_user().audit_context(&caller).await,
            AuditContext::anonymous()
        );
    }

    #[tokio::test]
    async fn anonymous_caller_has_no_author() {
        assert_matches!(
            current_user().resolve_user_id(&Principal::Anonymous).await,
            Err(CoreError::Unauthorized(_))
        );
        assert_eq!(
            current_user().audit_context(&Principal::Anonymous).await,
            AuditContext::anonymous()
        );
    }
}
