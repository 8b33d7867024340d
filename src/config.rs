use crate::error::AppError;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub hash_work_factor: u32,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("database_url", &self.database_url)
            .field("secret_key", &"<redacted>")
            .field("hash_work_factor", &self.hash_work_factor)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e)))
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let secret_key = std::env::var("SECRET_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Config("SECRET_KEY must be set".to_string()))?;

        let hash_work_factor: u32 = parse_var("HASH_WORK_FACTOR", "2")?;
        if hash_work_factor == 0 {
            return Err(AppError::Config("HASH_WORK_FACTOR must be at least 1".to_string()));
        }

        Ok(Config {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_var("SERVER_PORT", "3000")?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://messagely.db".to_string()),
            secret_key,
            hash_work_factor,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "20")?,
            db_min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30")?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
