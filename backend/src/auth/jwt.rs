use super::models::{AuthUser, Claims};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

/// Sessions last a week, matching the cookie max-age.
pub const SESSION_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT encoding error: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("JWT decoding error: {0}")]
    Decoding(String),
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn generate_token(&self, user: &AuthUser) -> Result<String, JwtError> {
        let now = Utc::now();
        let expiration = now + Duration::days(SESSION_DAYS);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.encode_claims(&claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key).map_err(JwtError::Encoding)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        if token.is_empty() || token.split('.').count() != 3 {
            return Err(JwtError::InvalidToken);
        }

        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(token_data) => {
                log::debug!(
                    "JWT token decoded. User: {}, Exp: {}",
                    token_data.claims.sub,
                    token_data.claims.exp
                );
                Ok(token_data.claims)
            }
            Err(err) => {
                log::debug!("JWT token decode error: {:?}", err);
                match err.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        Err(JwtError::TokenExpired)
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        Err(JwtError::InvalidToken)
                    }
                    _ => Err(JwtError::Decoding(err.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user() -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "fern@example.com".into(),
            name: "Fern".into(),
        }
    }

    #[test]
    fn test_token_round_trip() {
        let service = JwtService::new("secret");
        let user = user();
        let claims = service.verify_token(&service.generate_token(&user).unwrap()).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, "fern@example.com");
        assert_eq!(claims.exp - claims.iat, (SESSION_DAYS * 24 * 3600) as usize);
    }

    #[test]
    fn test_rejects_foreign_and_malformed_tokens() {
        let token = JwtService::new("one").generate_token(&user()).unwrap();
        assert!(matches!(
            JwtService::new("two").verify_token(&token),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(
            JwtService::new("one").verify_token("not-a-jwt"),
            Err(JwtError::InvalidToken)
        ));
        assert!(matches!(JwtService::new("one").verify_token(""), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::new("secret");
        let issued = Utc::now() - Duration::days(10);
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@example.com".into(),
            name: "Old".into(),
            iat: issued.timestamp() as usize,
            exp: (issued + Duration::days(1)).timestamp() as usize,
        };
        let token = service.encode_claims(&claims).unwrap();
        assert!(matches!(service.verify_token(&token), Err(JwtError::TokenExpired)));
    }
}
