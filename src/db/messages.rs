use sqlx::{Pool, Sqlite};

use crate::db::models::{MessageJoinRow, ReceivedMessage, SentMessage};
use crate::error::AppError;

pub struct MessageRepository;

impl MessageRepository {
    /// Every message sent by `username`, oldest first, with the recipient joined in.
    pub async fn messages_from(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Vec<SentMessage>, AppError> {
        Self::ensure_user(pool, username).await?;

        let rows = sqlx::query_as::<_, MessageJoinRow>(
            r#"
SELECT m.id, m.body, m.sent_at, m.read_at, u.username, u.first_name, u.last_name, u.phone
FROM messages m
JOIN users u ON m.to_username = u.username
WHERE m.from_username = ?
ORDER BY m.sent_at ASC, m.id ASC
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        tracing::debug!("Loaded {} sent messages for {}", rows.len(), username);
        Ok(rows.into_iter().map(SentMessage::from).collect())
    }

    /// Every message received by `username`, oldest first, with the sender joined in.
    pub async fn messages_to(
        pool: &Pool<Sqlite>,
        username: &str,
    ) -> Result<Vec<ReceivedMessage>, AppError> {
        Self::ensure_user(pool, username).await?;

        let rows = sqlx::query_as::<_, MessageJoinRow>(
            r#"
SELECT m.id, m.body, m.sent_at, m.read_at, u.username, u.first_name, u.last_name, u.phone
FROM messages m
JOIN users u ON m.from_username = u.username
WHERE m.to_username = ?
ORDER BY m.sent_at ASC, m.id ASC
            "#,
        )
        .bind(username)
        .fetch_all(pool)
        .await?;

        tracing::debug!("Loaded {} received messages for {}", rows.len(), username);
        Ok(rows.into_iter().map(ReceivedMessage::from).collect())
    }

    // An unknown user is NotFound; a known user with no messages is an empty list.
    async fn ensure_user(pool: &Pool<Sqlite>, username: &str) -> Result<(), AppError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("No such user: {}", username))),
        }
    }
}
