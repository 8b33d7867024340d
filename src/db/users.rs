use sqlx::{Pool, Sqlite};

use crate::crypto::CredentialStore;
use crate::db::models::{NewUser, User, UserProfile, UserSummary};
use crate::error::AppError;

pub struct UserRepository;

/// Current time in Unix microseconds.
fn now_micros() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

impl UserRepository {
    /// Hash the password and insert the user. Uniqueness is left to the
    /// primary key so concurrent registrations cannot both succeed.
    pub async fn register(
        pool: &Pool<Sqlite>,
        credentials: &CredentialStore,
        new_user: NewUser,
    ) -> Result<User, AppError> {
        let password_hash = credentials.hash(&new_user.password)?;
        let now = now_micros();

        let user = sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (username, password, first_name, last_name, phone, join_at, last_login_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING username, password, first_name, last_name, phone, join_at, last_login_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.phone)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateIdentity(format!(
                    "Username already taken: {}",
                    new_user.username
                ))
            }
            other => AppError::StoreUnavailable(other),
        })?;

        tracing::debug!("Registered user {}", user.username);
        Ok(user)
    }

    /// Check a username/password pair. Unknown users cost the same as a
    /// wrong password and are indistinguishable from one.
    pub async fn authenticate(
        pool: &Pool<Sqlite>,
        credentials: &CredentialStore,
        username: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT password FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(pool)
                .await?;

        let valid = match stored {
            Some(digest) => credentials.verify(password, &digest),
            None => credentials.verify_dummy(password),
        };

        Ok(valid)
    }

    /// Advance `last_login_at`; always strictly later than the stored value.
    pub async fn update_login_timestamp(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<(), AppError> {
        let updated: Option<String> = sqlx::query_scalar(
            r#"
UPDATE users
SET last_login_at = MAX(?, last_login_at + 1)
WHERE username = ?
RETURNING username
            "#,
        )
        .bind(now_micros())
        .bind(username)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("No such user: {}", username))),
        }
    }

    pub async fn all(pool: &Pool<Sqlite>) -> Result<Vec<UserSummary>, AppError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
SELECT username, first_name, last_name, phone
FROM users
ORDER BY username ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    pub async fn get(pool: &Pool<Sqlite>, username: &str) -> Result<UserProfile, AppError> {
        sqlx::query_as::<_, UserProfile>(
            r#"
SELECT username, first_name, last_name, phone, join_at, last_login_at
FROM users
WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No such user: {}", username)))
    }
}
