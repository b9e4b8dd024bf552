use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{AuthSession, AuthUser, Claims, LoginInput, SignupInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    pub fn config(&self) -> &AuthConfig { &self.cfg }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, repository::mock::MockAuthRepository};
    /// use service::auth::domain::SignupInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = SignupInput { username: "NoName".into(), email: "user@example.com".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.username, "NoName");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn register(&self, input: SignupInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
        }
        if let Some(existing) = self.repo.find_user_by_username(&input.username).await? {
            debug!("user exists: {}", existing.username);
            return Err(AuthError::Conflict);
        }

        let user = self.repo.create_user(&input.username, &input.email).await?;
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, username = %user.username, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{AuthService, AuthConfig, decode_token, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{SignupInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(SignupInput { username: "u".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { username: "u".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(decode_token("secret", &session.token).unwrap().sub, "u");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_username(&input.username)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let token = issue_token(&self.cfg, &user)?;
        info!(user_id = %user.id, "user_logged_in");
        Ok(AuthSession { user, token })
    }
}

/// Sign a token for `user` valid for `cfg.token_ttl_hours`.
pub fn issue_token(cfg: &AuthConfig, user: &AuthUser) -> Result<String, AuthError> {
    let now = chrono::Utc::now();
    let exp = (now + chrono::Duration::hours(cfg.token_ttl_hours)).timestamp() as usize;
    let claims = Claims { sub: user.username.clone(), uid: user.id, exp, iat: now.timestamp() as usize };
    encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()))
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry of an HS256 token.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::new("test-secret"))
    }

    fn signup(username: &str, password: &str) -> SignupInput {
        SignupInput { username: username.into(), email: format!("{username}@example.com"), password: password.into() }
    }

    #[tokio::test]
    async fn register_then_login_issues_verifiable_token() {
        let svc = svc();
        let user = svc.register(signup("NoName", "S3curePass!")).await.unwrap();
        let session = svc.login(LoginInput { username: "NoName".into(), password: "S3curePass!".into() }).await.unwrap();
        assert_eq!(session.user, user);

        let claims = decode_token("test-secret", &session.token).unwrap();
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.sub, "NoName");
        assert!(decode_token("other-secret", &session.token).is_err());
    }

    #[tokio::test]
    async fn short_password_and_duplicates_rejected() {
        let svc = svc();
        let err = svc.register(signup("a", "short")).await.unwrap_err();
        assert_eq!(err.code(), 1001);
        svc.register(signup("dup", "LongEnough1")).await.unwrap();
        assert!(matches!(svc.register(signup("dup", "LongEnough1")).await, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn wrong_password_or_unknown_user_is_unauthorized() {
        let svc = svc();
        svc.register(signup("someone", "StrongPass123")).await.unwrap();
        let wrong = svc.login(LoginInput { username: "someone".into(), password: "wrong".into() }).await;
        assert!(matches!(wrong, Err(AuthError::Unauthorized)));
        let ghost = svc.login(LoginInput { username: "ghost".into(), password: "StrongPass123".into() }).await;
        assert!(matches!(ghost, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut cfg = AuthConfig::new("test-secret");
        cfg.token_ttl_hours = -2;
        let user = AuthUser { id: uuid::Uuid::new_v4(), username: "u".into(), email: "u@e.com".into() };
        let token = issue_token(&cfg, &user).unwrap();
        assert!(matches!(decode_token("test-secret", &token), Err(AuthError::TokenError(_))));
    }
}
