//! Claims-based authorization for the catalog service.
//!
//! A caller is described by a [`ClaimSet`]. Gated operations name a
//! [`RequiredClaim`] and call [`authorize`] before touching anything else.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod token;

pub use token::{JwtVerifier, JwtVerifierConfig, TokenError, TokenVerifier};

/// A single named attribute of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Claims carried by the caller's credential. Empty for anonymous callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claims: Vec<Claim>,
}

impl ClaimSet {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(claims: Vec<Claim>) -> Self {
        Self { claims }
    }

    pub fn push(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    pub fn is_anonymous(&self) -> bool {
        self.claims.is_empty()
    }

    /// Claim types compare case-insensitively, values exactly.
    pub fn contains(&self, claim_type: &str, value: &str) -> bool {
        self.claims
            .iter()
            .any(|claim| claim.claim_type.eq_ignore_ascii_case(claim_type) && claim.value == value)
    }
}

impl FromIterator<Claim> for ClaimSet {
    fn from_iter<I: IntoIterator<Item = Claim>>(iter: I) -> Self {
        Self {
            claims: iter.into_iter().collect(),
        }
    }
}

/// The claim/value pair a gated operation demands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredClaim {
    pub claim_type: String,
    pub value: String,
}

impl RequiredClaim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Authorization failure. Carries the requirement so it can be logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("missing required claim {}={}", .0.claim_type, .0.value)]
pub struct Denied(pub RequiredClaim);

/// Allow the caller only if it holds the required claim.
pub fn authorize(claims: &ClaimSet, required: &RequiredClaim) -> Result<(), Denied> {
    if claims.contains(&required.claim_type, &required.value) {
        Ok(())
    } else {
        tracing::debug!(
            target: "catalog-authz",
            claim_type = %required.claim_type,
            anonymous = claims.is_anonymous(),
            "authorization denied"
        );
        Err(Denied(required.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> RequiredClaim {
        RequiredClaim::new("name", "admin")
    }

    #[test]
    fn anonymous_is_denied() {
        let err = authorize(&ClaimSet::anonymous(), &admin()).unwrap_err();
        assert_eq!(err.to_string(), "missing required claim name=admin");
    }

    #[test]
    fn matching_claim_is_allowed() {
        let claims = ClaimSet::new(vec![
            Claim::new("role", "Admin"),
            Claim::new("name", "admin"),
        ]);
        assert!(authorize(&claims, &admin()).is_ok());
    }

    #[test]
    fn claim_type_ignores_case_but_value_does_not() {
        let claims: ClaimSet = [Claim::new("Name", "admin")].into_iter().collect();
        assert!(authorize(&claims, &admin()).is_ok());

        let claims: ClaimSet = [Claim::new("name", "Admin")].into_iter().collect();
        assert!(authorize(&claims, &admin()).is_err());
    }

    #[test]
    fn other_claims_do_not_grant_access() {
        let claims = ClaimSet::new(vec![
            Claim::new("role", "Admin"),
            Claim::new("name", "admin@test.com"),
        ]);
        assert!(authorize(&claims, &admin()).is_err());
    }
}
