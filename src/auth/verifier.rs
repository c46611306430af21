//! HS256 token verification

use anyhow::{Context, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::Claims;

/// Verifies bearer tokens signed with the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a JWT token and return the claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.key, &self.validation).context("JWT validation failed")?;
        Ok(token_data.claims)
    }
}

/// Signs claims with `secret`. Token issuance belongs to the account service;
/// this exists for tests.
#[cfg(test)]
pub(crate) fn sign(claims: &Claims, secret: &str) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn claims(exp_offset: i64, iss: Option<&str>) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            exp: Utc::now().timestamp() + exp_offset,
            iat: Some(Utc::now().timestamp()),
            iss: iss.map(str::to_string),
            role: "car_owner".into(),
            email: Some("driver@example.com".into()),
            carwash_id: None,
        }
    }

    #[test]
    fn accepts_token_signed_with_secret() {
        let verifier = TokenVerifier::new("s3cret", None);
        let original = claims(3600, None);
        let verified = verifier.verify(&sign(&original, "s3cret")).unwrap();
        assert_eq!(verified.sub, original.sub);
        assert_eq!(verified.role, "car_owner");
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let verifier = TokenVerifier::new("s3cret", None);
        assert!(verifier.verify(&sign(&claims(3600, None), "other")).is_err());
        assert!(verifier.verify(&sign(&claims(-3600, None), "s3cret")).is_err());
        assert!(verifier.verify("not.a.token").is_err());
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let verifier = TokenVerifier::new("s3cret", Some("carwash-accounts"));
        assert!(verifier.verify(&sign(&claims(3600, Some("carwash-accounts")), "s3cret")).is_ok());
        assert!(verifier.verify(&sign(&claims(3600, Some("elsewhere")), "s3cret")).is_err());
    }
}
