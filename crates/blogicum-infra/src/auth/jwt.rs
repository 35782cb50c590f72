//! Session tokens signed as HS256 JWTs.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use blogicum_core::domain::Id;
use blogicum_core::ports::{AuthError, IssuedToken, Session, SessionTokens};

const DEV_SECRET: &str = "blogicum-dev-secret";
const DEFAULT_LIFETIME_HOURS: i64 = 24;

/// Signing key and token lifetime.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub lifetime: TimeDelta,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEV_SECRET.to_string(),
            lifetime: TimeDelta::hours(DEFAULT_LIFETIME_HOURS),
            issuer: "blogicum".to_string(),
        }
    }
}

impl JwtConfig {
    /// `JWT_SECRET`, `JWT_EXPIRATION_HOURS` and `JWT_ISSUER`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                let production = std::env::var("RUST_ENV")
                    .is_ok_and(|v| v == "production" || v == "prod");
                if production {
                    tracing::error!("JWT_SECRET is not set; sessions are signed with the dev secret");
                } else {
                    tracing::warn!("JWT_SECRET is not set; using the dev secret");
                }
                defaults.secret
            }
        };

        Self {
            secret,
            lifetime: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(TimeDelta::hours)
                .unwrap_or(defaults.lifetime),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// [`SessionTokens`] backed by `jsonwebtoken`.
pub struct JwtSessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtSessionTokens {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }
}

impl SessionTokens for JwtSessionTokens {
    fn issue(&self, user_id: Id, username: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + self.config.lifetime).timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(IssuedToken {
            token,
            lifetime: self.config.lifetime,
        })
    }

    fn verify(&self, token: &str) -> Result<Session, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::SessionExpired,
                _ => AuthError::MalformedToken(e.to_string()),
            })?
            .claims;

        let user_id = claims
            .sub
            .parse::<Id>()
            .map_err(|_| AuthError::MalformedToken(format!("bad subject '{}'", claims.sub)))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| AuthError::MalformedToken("expiry out of range".to_string()))?;

        Ok(Session {
            user_id,
            username: claims.username,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(lifetime: TimeDelta) -> JwtSessionTokens {
        JwtSessionTokens::new(JwtConfig {
            secret: "test-secret".to_string(),
            lifetime,
            issuer: "blogicum-test".to_string(),
        })
    }

    #[test]
    fn test_issued_token_verifies_to_same_user() {
        let tokens = tokens(TimeDelta::hours(1));

        let issued = tokens.issue(42, "alice").unwrap();
        let session = tokens.verify(&issued.token).unwrap();

        assert_eq!(session.user_id, 42);
        assert_eq!(session.username, "alice");
        assert!(session.expires_at > Utc::now());
        assert_eq!(issued.lifetime, TimeDelta::hours(1));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            tokens(TimeDelta::hours(1)).verify("not.a.jwt"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let issued = tokens(TimeDelta::hours(1)).issue(1, "alice").unwrap();
        let other = JwtSessionTokens::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..JwtConfig::default()
        });

        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_other_issuer_is_rejected() {
        let issued = tokens(TimeDelta::hours(1)).issue(1, "alice").unwrap();
        let other = JwtSessionTokens::new(JwtConfig {
            secret: "test-secret".to_string(),
            lifetime: TimeDelta::hours(1),
            issuer: "someone-else".to_string(),
        });

        assert!(other.verify(&issued.token).is_err());
    }

    #[test]
    fn test_expired_session() {
        let tokens = tokens(TimeDelta::hours(-2));
        let issued = tokens.issue(1, "alice").unwrap();

        assert!(matches!(
            tokens.verify(&issued.token),
            Err(AuthError::SessionExpired)
        ));
    }
}
