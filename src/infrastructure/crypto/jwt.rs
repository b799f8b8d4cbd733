//! JWT token handling (HS256)

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in minutes
    pub expire_minutes: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>, expire_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            expire_minutes,
        }
    }
}

/// Token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// User role
    pub role: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl TokenClaims {
    pub fn new(username: &str, role: &str, config: &JwtConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::minutes(config.expire_minutes);

        Self {
            sub: username.to_string(),
            role: role.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Create a signed token.
pub fn create_token(
    username: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = TokenClaims::new(username, role, config);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode a token. Expiry is enforced by the validation.
pub fn verify_token(
    token: &str,
    config: &JwtConfig,
) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret", 30)
    }

    #[test]
    fn roundtrip() {
        let token = create_token("alice", "admin", &config()).unwrap();
        let claims = verify_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, "alice");
        assert!(claims.is_admin());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = create_token("alice", "admin", &config()).unwrap();
        let other = JwtConfig::new("other-secret", 30);
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let expired = JwtConfig::new("test-secret", -10);
        let token = create_token("alice", "operator", &expired).unwrap();
        assert!(verify_token(&token, &config()).is_err());
    }
}
