use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use crate::core::config::AuthConfig;
use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::SessionTokenDto;
use crate::features::auth::model::{QualitySession, SessionClaims, QUALITY_SUBJECT};

/// Issues and validates quality-team session tokens.
///
/// There is a single shared password; a successful login yields an HS256
/// token that every mutating endpoint requires.
pub struct SessionService {
    password_digest: [u8; 32],
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: ChronoDuration,
}

impl SessionService {
    pub fn new(config: &AuthConfig) -> Self {
        let ttl = ChronoDuration::seconds(config.token_ttl.as_secs() as i64);
        Self {
            password_digest: Sha256::digest(config.quality_password.as_bytes()).into(),
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            ttl,
        }
    }

    /// Compare digests so the check does not short-circuit on the first
    /// differing byte of the plain password.
    fn password_matches(&self, candidate: &str) -> bool {
        let candidate: [u8; 32] = Sha256::digest(candidate.as_bytes()).into();
        candidate
            .iter()
            .zip(self.password_digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Exchange the shared password for a session token
    pub fn login(&self, password: &str) -> Result<SessionTokenDto> {
        if !self.password_matches(password) {
            tracing::warn!("Rejected quality login: wrong password");
            return Err(AppError::Unauthorized("Incorrect password".to_string()));
        }

        let now = Utc::now();
        self.issue(now)
    }

    fn issue(&self, now: DateTime<Utc>) -> Result<SessionTokenDto> {
        let expires_at = now + self.ttl;
        let claims = SessionClaims {
            sub: QUALITY_SUBJECT.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))?;

        tracing::info!("Quality session opened, expires at {}", expires_at);

        Ok(SessionTokenDto {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.num_seconds(),
            expires_at,
        })
    }

    /// Validate a bearer token and return the session it carries
    pub fn validate_token(&self, token: &str) -> Result<QualitySession> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.sub = Some(QUALITY_SUBJECT.to_string());
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))?;

        let expires_at = DateTime::<Utc>::from_timestamp(data.claims.exp, 0)
            .ok_or_else(|| AppError::Unauthorized("Invalid token expiry".to_string()))?;

        Ok(QualitySession {
            subject: data.claims.sub,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(password: &str) -> AuthConfig {
        AuthConfig {
            quality_password: password.to_string(),
            token_secret: "test-secret".to_string(),
            token_ttl: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_login_and_validate() {
        let service = SessionService::new(&config("qualidade123"));
        let token = service.login("qualidade123").unwrap();
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.expires_in, 3600);

        let session = service.validate_token(&token.access_token).unwrap();
        assert_eq!(session.subject, QUALITY_SUBJECT);
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let service = SessionService::new(&config("qualidade123"));
        let err = service.login("qualidade12").unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issuer = SessionService::new(&config("a"));
        let mut other_config = config("a");
        other_config.token_secret = "another-secret".to_string();
        let other = SessionService::new(&other_config);

        let token = issuer.login("a").unwrap();
        assert!(other.validate_token(&token.access_token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = SessionService::new(&config("a"));
        let token = service
            .issue(Utc::now() - ChronoDuration::hours(2))
            .unwrap();
        assert!(matches!(
            service.validate_token(&token.access_token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = SessionService::new(&config("a"));
        assert!(service.validate_token("not-a-jwt").is_err());
    }
}
