use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;

/// JWT claims carried by 3Tee access tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: String,
    pub exp: u64,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Validates HS256 Bearer tokens against the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.leeway = config.jwt_leeway.as_secs();

        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and extract the caller identity
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.sub.is_empty() {
            return Err(AppError::Unauthorized(
                "Token is missing a subject".to_string(),
            ));
        }

        Ok(AuthenticatedUser {
            sub: data.claims.sub,
            roles: data.claims.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn test_config() -> AuthConfig {
        AuthConfig {
            secret: "test-secret".to_string(),
            issuer: "threetee".to_string(),
            audience: "threetee-api".to_string(),
            jwt_leeway: Duration::from_secs(60),
        }
    }

    fn mint(config: &AuthConfig, sub: &str, exp_offset_secs: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            sub: sub.to_string(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            exp: (now + exp_offset_secs) as u64,
            roles: vec!["admin".to_string()],
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_token() {
        let config = test_config();
        let validator = JwtValidator::new(&config);
        let token = mint(&config, "user-1", 3600);

        let user = validator.validate_token(&token).unwrap();
        assert_eq!(user.sub, "user-1");
        assert!(user.is_admin());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let validator = JwtValidator::new(&config);
        let token = mint(&config, "user-1", -3600);

        assert!(validator.validate_token(&token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = test_config();
        let mut other = test_config();
        other.secret = "other-secret".to_string();
        let validator = JwtValidator::new(&other);
        let token = mint(&config, "user-1", 3600);

        assert!(validator.validate_token(&token).is_err());
    }
}
