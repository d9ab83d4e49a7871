//! Bearer credential handling.
//!
//! [`authenticate`] resolves the `Authorization: Bearer` header into a
//! [`ClaimSet`] stored in request extensions. Missing or invalid credentials
//! leave the request anonymous; handlers decide whether that is enough.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use catalog_authz::{ClaimSet, TokenVerifier};

pub type SharedVerifier = Arc<dyn TokenVerifier>;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Middleware attaching the caller's verified claims to the request.
pub async fn authenticate(
    State(verifier): State<SharedVerifier>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers()).map(str::to_owned);

    if let Some(token) = token {
        match verifier.verify(&token).await {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(err) => {
                tracing::debug!(error = %err, "bearer credential rejected, continuing anonymously");
            }
        }
    }

    next.run(request).await
}

/// The calling principal's claims; empty for anonymous callers.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub ClaimSet);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(
            parts.extensions.get::<ClaimSet>().cloned().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use catalog_authz::{Claim, TokenError};
    use tower::ServiceExt;

    struct StaticVerifier;

    #[async_trait::async_trait]
    impl TokenVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
            match token {
                "good" => Ok(ClaimSet::new(vec![Claim::new("name", "admin")])),
                _ => Err(TokenError::MalformedClaims),
            }
        }
    }

    async fn who(Caller(claims): Caller) -> String {
        if claims.contains("name", "admin") {
            "admin".to_string()
        } else {
            "anonymous".to_string()
        }
    }

    async fn call(authorization: Option<&str>) -> String {
        let verifier: SharedVerifier = Arc::new(StaticVerifier);
        let app = Router::new()
            .route("/who", get(who))
            .layer(axum::middleware::from_fn_with_state(verifier, authenticate));

        let mut request = axum::http::Request::builder().uri("/who");
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn valid_bearer_attaches_claims() {
        assert_eq!(call(Some("Bearer good")).await, "admin");
        assert_eq!(call(Some("bearer good")).await, "admin");
    }

    #[tokio::test]
    async fn missing_or_invalid_credentials_are_anonymous() {
        assert_eq!(call(None).await, "anonymous");
        assert_eq!(call(Some("Bearer bad")).await, "anonymous");
        assert_eq!(call(Some("Basic good")).await, "anonymous");
        assert_eq!(call(Some("Bearer ")).await, "anonymous");
    }
}
