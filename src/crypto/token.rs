use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Claims carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp); tokens are currently issued without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Mints and checks HS256 tokens with a process-wide secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionIssuer {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        if secret.is_empty() {
            return Err(AppError::Config("Signing secret is empty".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn issue(&self, username: &str) -> Result<String, AppError> {
        let claims = Claims {
            username: username.to_string(),
            iat: chrono::Utc::now().timestamp(),
            exp: None,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Crypto(format!("Failed to sign token: {}", e)))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthorized
        })?;

        // Honor an expiry if a token carries one
        if let Some(exp) = data.claims.exp {
            if exp <= chrono::Utc::now().timestamp() {
                return Err(AppError::Unauthorized);
            }
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_decode() {
        let issuer = SessionIssuer::new("test-secret").unwrap();
        let token = issuer.issue("alice").unwrap();

        assert!(!token.is_empty());
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp, None);
    }

    #[test]
    fn test_token_has_no_expiry_claim() {
        let issuer = SessionIssuer::new("test-secret").unwrap();
        let token = issuer.issue("alice").unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let raw = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &validation,
        )
        .unwrap();
        assert!(raw.claims.get("exp").is_none());
        assert_eq!(raw.claims["username"], "alice");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = SessionIssuer::new("one").unwrap().issue("alice").unwrap();
        let other = SessionIssuer::new("two").unwrap();
        assert!(matches!(other.decode(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = SessionIssuer::new("test-secret").unwrap();
        assert!(matches!(issuer.decode("invalid-token"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_expired_claim_rejected() {
        let issuer = SessionIssuer::new("test-secret").unwrap();
        let claims = Claims {
            username: "alice".to_string(),
            iat: 0,
            exp: Some(1),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &issuer.encoding_key).unwrap();
        assert!(matches!(issuer.decode(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert!(matches!(SessionIssuer::new(""), Err(AppError::Config(_))));
    }
}
