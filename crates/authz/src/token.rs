//! Bearer token verification.
//!
//! Only verification lives here; issuing tokens belongs to the identity
//! provider.

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use thiserror::Error;

use crate::{Claim, ClaimSet};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token claims are not a JSON object")]
    MalformedClaims,

    #[error("no signing key configured")]
    NotConfigured,
}

/// Turns a bearer credential into the caller's claim set.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError>;
}

#[derive(Debug, Clone, Default)]
pub struct JwtVerifierConfig {
    pub secret: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

/// HS256 JWT verifier checking signature, expiry, and optionally issuer and audience.
#[derive(Debug, Clone)]
pub struct JwtVerifier {
    config: JwtVerifierConfig,
}

impl JwtVerifier {
    pub fn new(config: JwtVerifierConfig) -> Self {
        Self { config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256];
        validation.leeway = self.config.leeway_seconds;

        let mut required = vec!["exp"];
        match self.config.audience.as_deref() {
            Some(aud) => {
                validation.set_audience(&[aud]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        if let Some(iss) = self.config.issuer.as_deref() {
            validation.set_issuer(&[iss]);
            required.push("iss");
        }
        validation.set_required_spec_claims(&required);

        validation
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        let Some(secret) = self.config.secret.as_deref() else {
            return Err(TokenError::NotConfigured);
        };

        let data = decode::<Value>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation(),
        )?;

        flatten_claims(&data.claims)
    }
}

/// String claims map to one claim, string arrays to one claim per element.
fn flatten_claims(claims: &Value) -> Result<ClaimSet, TokenError> {
    let obj = claims.as_object().ok_or(TokenError::MalformedClaims)?;

    let mut set = ClaimSet::anonymous();
    for (claim_type, value) in obj {
        match value {
            Value::String(value) => set.push(Claim::new(claim_type, value)),
            Value::Array(items) => {
                for item in items.iter().filter_map(Value::as_str) {
                    set.push(Claim::new(claim_type, item));
                }
            }
            _ => {}
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret-with-enough-entropy";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(claims: Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier(issuer: Option<&str>, audience: Option<&str>) -> JwtVerifier {
        JwtVerifier::new(JwtVerifierConfig {
            secret: Some(SECRET.to_string()),
            issuer: issuer.map(str::to_string),
            audience: audience.map(str::to_string),
            leeway_seconds: 0,
        })
    }

    #[tokio::test]
    async fn valid_token_yields_flattened_claims() {
        let token = sign(
            json!({
                "name": "admin",
                "role": ["Admin", "Editor"],
                "exp": now() + 600,
            }),
            SECRET,
        );

        let claims = verifier(None, None).verify(&token).await.unwrap();
        assert!(claims.contains("name", "admin"));
        assert!(claims.contains("role", "Admin"));
        assert!(claims.contains("role", "Editor"));
    }

    #[tokio::test]
    async fn wrong_signature_is_rejected() {
        let token = sign(json!({"name": "admin", "exp": now() + 600}), "other-secret");
        let err = verifier(None, None).verify(&token).await.unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let token = sign(json!({"name": "admin", "exp": now() - 600}), SECRET);
        assert!(verifier(None, None).verify(&token).await.is_err());
    }

    #[tokio::test]
    async fn issuer_and_audience_are_enforced_when_configured() {
        let verifier = verifier(Some("catalog-idp"), Some("catalog"));

        let good = sign(
            json!({"name": "admin", "iss": "catalog-idp", "aud": "catalog", "exp": now() + 600}),
            SECRET,
        );
        assert!(verifier.verify(&good).await.is_ok());

        let wrong_aud = sign(
            json!({"name": "admin", "iss": "catalog-idp", "aud": "billing", "exp": now() + 600}),
            SECRET,
        );
        assert!(verifier.verify(&wrong_aud).await.is_err());

        let missing_iss = sign(json!({"name": "admin", "aud": "catalog", "exp": now() + 600}), SECRET);
        assert!(verifier.verify(&missing_iss).await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_verifier_accepts_nothing() {
        let token = sign(json!({"name": "admin", "exp": now() + 600}), SECRET);
        let verifier = JwtVerifier::new(JwtVerifierConfig::default());
        assert!(matches!(
            verifier.verify(&token).await,
            Err(TokenError::NotConfigured)
        ));
    }
}
