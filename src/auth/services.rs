use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{
    dto::{AuthPayload, LoginRequest, PublicUser, RegisterRequest},
    error::AuthError,
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::CredentialStore,
    repo_types::NewUser,
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Register/login workflows over an injected store, hasher and token issuer.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    keys: JwtKeys,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher, keys: JwtKeys) -> Self {
        Self {
            store,
            hasher,
            keys,
        }
    }

    pub fn keys(&self) -> &JwtKeys {
        &self.keys
    }

    #[instrument(skip(self, input), fields(email = %input.email, username = %input.username))]
    pub async fn register(&self, input: RegisterRequest) -> Result<AuthPayload, AuthError> {
        let name = input.name.trim();
        let username = input.username.trim();
        let email = normalize_email(&input.email);

        if name.is_empty() || username.is_empty() || email.is_empty() || input.password.is_empty()
        {
            return Err(AuthError::MissingFields {
                message: "All fields are required.",
                detail: "Missing required fields: name, username, email, password",
            });
        }
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        if let Some(existing) = self.store.find_by_email_or_username(&email, username).await? {
            warn!(user_id = %existing.id, "email or username already registered");
            return Err(AuthError::Conflict);
        }

        let password_hash = self
            .hasher
            .hash_blocking(input.password)
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?;

        // A concurrent registration that slipped past the check above is
        // caught by the unique indexes and surfaces as Conflict here.
        let user = self
            .store
            .insert(NewUser {
                name: name.to_string(),
                username: username.to_string(),
                email,
                password_hash,
            })
            .await?;

        let token = self
            .keys
            .issue(user.id)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        info!(user_id = %user.id, "user registered");
        Ok(AuthPayload {
            user: PublicUser::from(user),
            token,
        })
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> Result<AuthPayload, AuthError> {
        let email = normalize_email(&input.email);
        if email.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingFields {
                message: "Email and password are required.",
                detail: "Missing required fields",
            });
        }

        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        let ok = self
            .hasher
            .verify_blocking(input.password, user.password_hash.clone())
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self
            .keys
            .issue(user.id)
            .map_err(|e| AuthError::Token(e.to_string()))?;

        info!(user_id = %user.id, "user logged in");
        Ok(AuthPayload {
            user: PublicUser::from(user),
            token,
        })
    }

    /// Public view of an already-authenticated user.
    #[instrument(skip(self))]
    pub async fn profile(&self, user_id: Uuid) -> Result<PublicUser, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .map(PublicUser::from)
            .ok_or(AuthError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{password::test_hasher, repo::memory::InMemoryCredentialStore},
        config::JwtConfig,
    };

    fn service() -> (AuthService, Arc<InMemoryCredentialStore>) {
        let store = Arc::new(InMemoryCredentialStore::default());
        let keys = JwtKeys::new(&JwtConfig {
            secret: "test-secret".into(),
        });
        (
            AuthService::new(store.clone(), test_hasher(), keys),
            store,
        )
    }

    fn register_req(name: &str, username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ada@x.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("ada@x"));
        assert!(!is_valid_email("ada.x.com"));
        assert!(!is_valid_email("ada @x.com"));
        assert!(!is_valid_email("a@@x.com"));
    }

    #[tokio::test]
    async fn register_then_login_same_user() {
        let (svc, _) = service();
        let reg = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(reg.user.auth, 0);
        assert_eq!(reg.user.name, "Ada");
        assert_eq!(svc.keys().verify(&reg.token).unwrap().sub, reg.user.id);

        let login = svc.login(login_req("ada@x.com", "secret1")).await.unwrap();
        assert_eq!(login.user.id, reg.user.id);
        assert_eq!(svc.keys().verify(&login.token).unwrap().sub, reg.user.id);
    }

    #[tokio::test]
    async fn register_validation_order() {
        let (svc, store) = service();

        let err = svc.register(register_req("", "u", "bad", "x")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingFields { .. }));

        let err = svc
            .register(register_req("Ada", "ada1", "not-an-email", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail));

        let err = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "12345"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));

        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn password_length_counts_characters_not_bytes() {
        let (svc, _) = service();
        // Three emoji: 12 bytes and 6 UTF-16 units, but only 3 characters.
        let err = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "😀😀😀"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));

        // Six multi-byte characters meet the minimum.
        let reg = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "äöüßéè"))
            .await
            .unwrap();
        let login = svc.login(login_req("ada@x.com", "äöüßéè")).await.unwrap();
        assert_eq!(login.user.id, reg.user.id);
    }

    #[tokio::test]
    async fn whitespace_only_fields_are_missing() {
        let (svc, _) = service();
        let err = svc
            .register(register_req("  ", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingFields { .. }));
    }

    #[tokio::test]
    async fn validation_runs_before_store() {
        let (svc, store) = service();
        store.fail_all();
        let err = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword));
        let err = svc.login(login_req("", "secret1")).await.unwrap_err();
        assert!(matches!(err, AuthError::MissingFields { .. }));
    }

    #[tokio::test]
    async fn duplicate_email_or_username_conflicts() {
        let (svc, store) = service();
        svc.register(register_req("Ada", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap();

        let err = svc
            .register(register_req("Other", "other", "ADA@x.com", "another1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));

        let err = svc
            .register(register_req("Other", "ada1", "other@x.com", "another1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_registrations_yield_one_user() {
        let (svc, store) = service();
        let a = svc.clone();
        let b = svc.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move {
                a.register(register_req("Ada", "ada1", "ada@x.com", "secret1")).await
            }),
            tokio::spawn(async move {
                b.register(register_req("Ada", "ada1", "ada@x.com", "secret1")).await
            }),
        );
        let results = [ra.unwrap(), rb.unwrap()];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AuthError::Conflict))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn login_unknown_email_is_not_found() {
        let (svc, _) = service();
        let err = svc
            .login(login_req("ghost@x.com", "whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn login_wrong_password_is_invalid_credentials() {
        let (svc, _) = service();
        svc.register(register_req("Ada", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap();
        let err = svc.login(login_req("ada@x.com", "wrong")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        let env = serde_json::to_string(&err.to_envelope()).unwrap();
        assert!(!env.contains("$argon2"));
    }

    #[tokio::test]
    async fn store_failure_is_internal() {
        let (svc, store) = service();
        store.fail_all();
        let err = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn profile_round_trip() {
        let (svc, _) = service();
        let reg = svc
            .register(register_req("Ada", "ada1", "ada@x.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(svc.profile(reg.user.id).await.unwrap(), reg.user);
        assert!(matches!(
            svc.profile(Uuid::new_v4()).await,
            Err(AuthError::NotFound)
        ));
    }
}
