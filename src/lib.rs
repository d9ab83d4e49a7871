//! Book catalog application library
//!
//! Wires settings, the persistence gateway, and the credential verifier into
//! the module registry served by `catalog-http`.

use std::sync::Arc;

use axum::Router;
use catalog_authz::{JwtVerifier, JwtVerifierConfig, RequiredClaim};
use catalog_db::BookGateway;
use catalog_http::auth::SharedVerifier;
use catalog_kernel::{
    settings::{AuthSettings, Settings},
    ModuleRegistry,
};

pub mod modules;

/// The claim/value pair that gates create and delete.
pub fn admin_claim(auth: &AuthSettings) -> RequiredClaim {
    RequiredClaim::new(&auth.admin_claim_type, &auth.admin_claim_value)
}

pub fn token_verifier(auth: &AuthSettings) -> SharedVerifier {
    if auth.jwt_secret.is_none() {
        tracing::warn!("auth.jwt_secret is not set; every caller is anonymous");
    }

    Arc::new(JwtVerifier::new(JwtVerifierConfig {
        secret: auth.jwt_secret.clone(),
        issuer: auth.issuer.clone(),
        audience: auth.audience.clone(),
        leeway_seconds: auth.leeway_seconds,
    }))
}

/// Registry with every application module registered over `gateway`.
pub fn build_registry(
    settings: &Settings,
    gateway: Arc<dyn BookGateway>,
) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, gateway, admin_claim(&settings.auth))?;
    Ok(registry)
}

/// Fully layered router, as served by the binary.
pub fn build_app(settings: &Settings, gateway: Arc<dyn BookGateway>) -> anyhow::Result<Router> {
    let registry = build_registry(settings, gateway)?;
    Ok(catalog_http::build_router(
        &registry,
        settings,
        token_verifier(&settings.auth),
    ))
}
