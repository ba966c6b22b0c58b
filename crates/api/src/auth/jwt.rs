//! JWT access-token validation.
//!
//! Access tokens are HS256-signed JWTs issued by the identity service. This
//! server only verifies them and reads the subject.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use stylist_core::types::DbId;

/// The claims this server reads from an access token.
#[derive(Debug, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id in the identity service.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for JWT token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to verify tokens.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var      | Required | Default |
    /// |--------------|----------|---------|
    /// | `JWT_SECRET` | **yes**  | --      |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn config(secret: &str) -> JwtConfig {
        JwtConfig {
            secret: secret.to_string(),
        }
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn test_valid_token_yields_subject() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            json!({ "sub": 42, "exp": now + 900, "iat": now, "role": "user" }),
            SECRET,
        );

        let claims = validate_token(&token, &config(SECRET)).expect("token should validate");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.exp, now + 900);
    }

    #[test]
    fn test_expired_token_fails() {
        let now = chrono::Utc::now().timestamp();
        // Well past the default 60-second leeway.
        let token = sign(json!({ "sub": 1, "exp": now - 300 }), SECRET);

        assert!(validate_token(&token, &config(SECRET)).is_err());
    }

    #[test]
    fn test_different_secrets_fail() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(json!({ "sub": 1, "exp": now + 900 }), "secret-alpha");

        assert!(validate_token(&token, &config("secret-bravo")).is_err());
    }

    #[test]
    fn test_token_without_subject_fails() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(json!({ "exp": now + 900 }), SECRET);

        assert!(validate_token(&token, &config(SECRET)).is_err());
    }
}
