use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full `users` row. Timestamps are Unix microseconds (UTC).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 PHC digest, never plaintext
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: i64,
    pub last_login_at: i64,
}

/// Registration input; `password` is plaintext until hashed.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: i64,
    pub last_login_at: i64,
}

/// A message joined against the profile of the other party.
#[derive(Debug, Clone, FromRow)]
pub struct MessageJoinRow {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub username: String, // Joined from users table
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

impl MessageJoinRow {
    fn split(self) -> (i64, String, i64, Option<i64>, UserSummary) {
        let user = UserSummary {
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            phone: self.phone,
        };
        (self.id, self.body, self.sent_at, self.read_at, user)
    }
}

/// A message sent by the subject user, with the recipient's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub to_user: UserSummary,
}

impl From<MessageJoinRow> for SentMessage {
    fn from(row: MessageJoinRow) -> Self {
        let (id, body, sent_at, read_at, to_user) = row.split();
        Self { id, body, sent_at, read_at, to_user }
    }
}

/// A message received by the subject user, with the sender's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: i64,
    pub read_at: Option<i64>,
    pub from_user: UserSummary,
}

impl From<MessageJoinRow> for ReceivedMessage {
    fn from(row: MessageJoinRow) -> Self {
        let (id, body, sent_at, read_at, from_user) = row.split();
        Self { id, body, sent_at, read_at, from_user }
    }
}
