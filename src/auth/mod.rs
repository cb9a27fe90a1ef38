use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{Caller, Role},
    error::{AppError, Result},
};

/// JWT payload issued by the platform's identity service. Company-scoped
/// roles carry the company they act for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<Uuid>,
    pub exp: usize,
}

/// Validates bearer tokens. Issuance lives in the identity service; this
/// side only needs the shared secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn verify(&self, token: &str) -> Result<Caller> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized)?;

        Ok(Caller {
            user_id: data.claims.sub,
            role: data.claims.role,
            company_id: data.claims.company_id,
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TokenVerifier {
    /// Mints a token with the same secret, for test fixtures only.
    pub fn issue_for_tests(secret: &str, caller: &Caller) -> String {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let claims = Claims {
            sub: caller.user_id,
            role: caller.role,
            company_id: caller.company_id,
            exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("test token encoding")
    }
}
