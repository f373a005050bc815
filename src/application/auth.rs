use argon2::password_hash::rand_core::OsRng as SaltRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{TokenRepository, UserRepository};
use crate::domain::user::{NewUserInput, ProfileChanges, Role, TokenKind, UserView};

const ACCESS_TOKEN_MINUTES: i64 = 60;
const REFRESH_TOKEN_HOURS: i64 = 24;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    pub user: UserView,
}

pub(crate) fn hash_password(password: &str) -> Result<String, DomainError> {
    let salt = SaltString::generate(&mut SaltRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DomainError::Internal(format!("password hashing failed: {e}")))
}

pub(crate) fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct AuthService<R> {
    repo: R,
}

impl<R: UserRepository + TokenRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn register(&self, input: RegisterInput) -> Result<UserView, DomainError> {
        let username = input.username.trim().to_string();
        if username.is_empty() {
            return Err(DomainError::Validation("username must not be empty".into()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(DomainError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        self.repo.create(NewUserInput {
            username,
            email: input.email,
            password_hash: hash_password(&input.password)?,
            role: input.role.unwrap_or(Role::Client),
        })
    }

    pub fn login(&self, username: &str, password: &str) -> Result<TokenPair, DomainError> {
        let credentials = self
            .repo
            .find_credentials(username)?
            .ok_or_else(|| DomainError::Unauthorized("invalid credentials".into()))?;

        if !verify_password(password, &credentials.password_hash) {
            return Err(DomainError::Unauthorized("invalid credentials".into()));
        }

        let user = credentials.user;
        let access = generate_token();
        let refresh = generate_token();
        self.repo.issue(
            user.id,
            TokenKind::Access,
            &access,
            Utc::now() + Duration::minutes(ACCESS_TOKEN_MINUTES),
        )?;
        self.repo.issue(
            user.id,
            TokenKind::Refresh,
            &refresh,
            Utc::now() + Duration::hours(REFRESH_TOKEN_HOURS),
        )?;

        Ok(TokenPair {
            access,
            refresh,
            user,
        })
    }

    /// Exchange a live refresh token for a fresh access token.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let user = self
            .repo
            .find_user_by_token(refresh_token, TokenKind::Refresh)?
            .ok_or_else(|| DomainError::Unauthorized("invalid or expired refresh token".into()))?;

        let access = generate_token();
        self.repo.issue(
            user.id,
            TokenKind::Access,
            &access,
            Utc::now() + Duration::minutes(ACCESS_TOKEN_MINUTES),
        )?;

        Ok(TokenPair {
            access,
            refresh: refresh_token.to_string(),
            user,
        })
    }

    pub fn profile(&self, user_id: Uuid) -> Result<UserView, DomainError> {
        self.repo
            .find_by_id(user_id)?
            .ok_or(DomainError::NotFound("user"))
    }

    pub fn update_profile(
        &self,
        user_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<UserView, DomainError> {
        self.repo.update_profile(user_id, changes)
    }

    pub fn promote(&self, actor: &UserView, target: Uuid) -> Result<UserView, DomainError> {
        if !actor.role.is_admin() {
            return Err(DomainError::PermissionDenied(
                "only admins can promote users".into(),
            ));
        }
        self.repo.promote_to_admin(target)
    }
}
