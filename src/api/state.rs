use std::sync::Arc;
use sqlx::{Pool, Sqlite};
use crate::config::Config;
use crate::crypto::{CredentialStore, SessionIssuer};
use crate::error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionIssuer>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Pool<Sqlite>, config: Arc<Config>) -> Result<Self, AppError> {
        let credentials = CredentialStore::new(config.hash_work_factor)?;
        let sessions = SessionIssuer::new(&config.secret_key)?;

        Ok(Self {
            db,
            credentials: Arc::new(credentials),
            sessions: Arc::new(sessions),
            config,
        })
    }
}
