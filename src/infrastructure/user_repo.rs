use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::{TokenRepository, UserRepository};
use crate::domain::user::{NewUserInput, ProfileChanges, TokenKind, UserCredentials, UserView};
use crate::models::token::NewAuthToken;
use crate::models::user::{NewUser, User, UserProfileChangeset};
use crate::schema::{auth_tokens, users};

pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn user_view(row: User) -> Result<UserView, DomainError> {
    let role = row
        .role
        .parse()
        .map_err(|_| DomainError::Internal(format!("corrupt role '{}' in users table", row.role)))?;
    Ok(UserView {
        id: row.id,
        username: row.username,
        email: row.email,
        role,
        bio: row.bio,
        profile_picture: row.profile_picture,
        facebook: row.facebook,
        twitter: row.twitter,
        linkedin: row.linkedin,
        created_at: row.created_at,
    })
}

impl UserRepository for DieselUserRepository {
    fn create(&self, input: NewUserInput) -> Result<UserView, DomainError> {
        let mut conn = self.pool.get()?;

        let row: User = diesel::insert_into(users::table)
            .values(&NewUser {
                id: Uuid::new_v4(),
                username: input.username,
                email: input.email,
                password_hash: input.password_hash,
                role: input.role.as_str().to_string(),
            })
            .get_result(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Conflict("username already taken".to_string())
                }
                other => other.into(),
            })?;

        user_view(row)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<UserView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .find(id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(user_view).transpose()
    }

    fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = users::table
            .filter(users::username.eq(username))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(|row| {
            let password_hash = row.password_hash.clone();
            Ok(UserCredentials {
                user: user_view(row)?,
                password_hash,
            })
        })
        .transpose()
    }

    fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<UserView, DomainError> {
        let mut conn = self.pool.get()?;

        let row: Option<User> = diesel::update(users::table.find(id))
            .set(&UserProfileChangeset {
                bio: changes.bio,
                profile_picture: changes.profile_picture,
                facebook: changes.facebook,
                twitter: changes.twitter,
                linkedin: changes.linkedin,
                updated_at: Some(Utc::now()),
            })
            .get_result(&mut conn)
            .optional()?;

        row.map(user_view)
            .transpose()?
            .ok_or(DomainError::NotFound("user"))
    }

    fn promote_to_admin(&self, target: Uuid) -> Result<UserView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Guarding on the current role in the filter keeps the check and
            // the write in one statement.
            let promoted: Option<User> = diesel::update(
                users::table.filter(users::id.eq(target).and(users::role.eq("client"))),
            )
            .set((users::role.eq("admin"), users::updated_at.eq(Utc::now())))
            .get_result(conn)
            .optional()?;

            match promoted {
                Some(row) => user_view(row),
                None => {
                    let exists: Option<Uuid> = users::table
                        .find(target)
                        .select(users::id)
                        .first(conn)
                        .optional()?;
                    match exists {
                        Some(_) => Err(DomainError::InvalidState(
                            "only client accounts can be promoted".to_string(),
                        )),
                        None => Err(DomainError::NotFound("user")),
                    }
                }
            }
        })
    }
}

impl TokenRepository for DieselUserRepository {
    fn issue(
        &self,
        user_id: Uuid,
        kind: TokenKind,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(auth_tokens::table)
            .values(&NewAuthToken {
                id: Uuid::new_v4(),
                user_id,
                token: token.to_string(),
                kind: kind.as_str().to_string(),
                expires_at,
            })
            .execute(&mut conn)?;

        Ok(())
    }

    fn find_user_by_token(
        &self,
        token: &str,
        kind: TokenKind,
    ) -> Result<Option<UserView>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token.eq(token))
            .filter(auth_tokens::kind.eq(kind.as_str()))
            .filter(auth_tokens::expires_at.gt(Utc::now()))
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        row.map(user_view).transpose()
    }
}
