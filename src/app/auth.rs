use std::sync::Arc;

use anyhow::{anyhow, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::{local, version4::V4, Local};
use time::{Duration, OffsetDateTime};

use crate::domain::repository::{
    CommentRepository, CreateUserError, LikeRepository, UserRepository,
};
use crate::domain::user::{User, UserProfile};

const TOKEN_ISSUER: &str = "pinboard";
const MIN_PASSWORD_LEN: usize = 6;
/// One year.
pub const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: &'static str,
    },
    #[error("Email already exists")]
    EmailTaken,
    #[error("Username already exists")]
    UsernameTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    access_key: [u8; 32],
    token_ttl_hours: u64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, access_key: [u8; 32], token_ttl_hours: u64) -> Self {
        Self {
            users,
            access_key,
            token_ttl_hours,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<(User, IssuedToken), AuthError> {
        let email = email.trim();
        let username = username.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Invalid {
                field: "email",
                message: "a valid email is required",
            });
        }
        if username.is_empty() {
            return Err(AuthError::Invalid {
                field: "username",
                message: "username is required",
            });
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Invalid {
                field: "password",
                message: "Password must be at least 6 characters long",
            });
        }

        if let Some(existing) = self.users.find_by_email_or_username(email, username).await? {
            return Err(if existing.email == email {
                AuthError::EmailTaken
            } else {
                AuthError::UsernameTaken
            });
        }

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create(email, username, &password_hash)
            .await
            .map_err(|err| match err {
                CreateUserError::EmailTaken => AuthError::EmailTaken,
                CreateUserError::UsernameTaken => AuthError::UsernameTaken,
                CreateUserError::Storage(err) => AuthError::Internal(err),
            })?;
        let token = self.issue_token(user.id)?;
        Ok((user, token))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<(User, IssuedToken)>> {
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        if user.password_hash.is_empty() || !verify_password(password, &user.password_hash)? {
            return Ok(None);
        }

        let token = self.issue_token(user.id)?;
        Ok(Some((user, token)))
    }

    /// Decrypts and validates an access token. `None` means the token is
    /// malformed, expired, or not an access token.
    pub fn authenticate_access_token(&self, token: &str) -> Result<Option<AuthSession>> {
        let claims = match self.decrypt_claims(token)? {
            Some(claims) => claims,
            None => return Ok(None),
        };
        if !has_token_type(&claims, "access") {
            return Ok(None);
        }
        let user_id = match claim_user_id(&claims) {
            Ok(user_id) => user_id,
            Err(_) => return Ok(None),
        };
        Ok(Some(AuthSession { user_id }))
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.users.find_by_id(user_id).await
    }

    pub async fn get_profile(
        &self,
        user_id: i64,
        comments: &dyn CommentRepository,
        likes: &dyn LikeRepository,
    ) -> Result<Option<UserProfile>> {
        let user = match self.users.find_by_id(user_id).await? {
            Some(user) => user,
            None => return Ok(None),
        };
        let comments_count = comments.count_for_user(user_id).await?;
        let likes_count = likes.count_for_user(user_id).await?;
        Ok(Some(UserProfile::from_user(user, comments_count, likes_count)))
    }

    pub fn issue_token(&self, user_id: i64) -> Result<IssuedToken> {
        let (claims, expires_at) = self.build_access_claims(user_id)?;
        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let token = local::encrypt(&key, &claims, None, None)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn decrypt_claims(&self, token: &str) -> Result<Option<Claims>> {
        let key = SymmetricKey::<V4>::from(&self.access_key)?;
        let mut rules = ClaimsValidationRules::new();
        rules.validate_issuer_with(TOKEN_ISSUER);
        rules.validate_audience_with(TOKEN_ISSUER);

        let untrusted = match UntrustedToken::<Local, V4>::try_from(token) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        let trusted = match local::decrypt(&key, &untrusted, &rules, None, None) {
            Ok(token) => token,
            Err(_) => return Ok(None),
        };
        Ok(trusted.payload_claims().cloned())
    }

    fn build_access_claims(&self, user_id: i64) -> Result<(Claims, OffsetDateTime)> {
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.token_ttl_hours) {
            return Err(anyhow!(
                "token ttl must be between 1 and {} hours",
                MAX_TOKEN_TTL_HOURS
            ));
        }
        let ttl_seconds = self.token_ttl_hours * 60 * 60;
        let duration = std::time::Duration::from_secs(ttl_seconds);
        let mut claims = Claims::new_expires_in(&duration)?;
        claims.issuer(TOKEN_ISSUER)?;
        claims.audience(TOKEN_ISSUER)?;
        claims.subject(&user_id.to_string())?;
        claims.add_additional("typ", "access")?;
        let expires_at = OffsetDateTime::now_utc() + Duration::seconds(i64::try_from(ttl_seconds)?);
        Ok((claims, expires_at))
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {}", err))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| anyhow!("failed to parse password hash: {}", err))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn claim_user_id(claims: &Claims) -> Result<i64> {
    let value = claims
        .get_claim("sub")
        .and_then(|value| value.as_str())
        .ok_or_else(|| anyhow!("missing sub claim"))?;
    Ok(value.parse::<i64>()?)
}

fn has_token_type(claims: &Claims, expected: &str) -> bool {
    claims
        .get_claim("typ")
        .and_then(|value| value.as_str())
        .map(|value| value == expected)
        .unwrap_or(false)
}
