//! Per-request identity resolution and the Axum extractors that trigger it.
//!
//! The resolution order is load-bearing: a required-policy rejection may only
//! happen after a genuine authentication attempt had the chance to succeed,
//! and after authenticator errors have been distinguished from plain absence.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::error;

use crate::error::AppError;
use crate::runtime::AppState;

use super::authenticator::{Authenticator, ContextAuthenticator, DnAuthenticator, IdentityStore};
use super::extractor::{CertificateDnExtractor, CredentialExtractor, SecurityContextExtractor};
use super::principal::Principal;

pub struct IdentityResolver {
    extractor: Arc<dyn CredentialExtractor>,
    authenticator: Arc<dyn Authenticator>,
}

impl IdentityResolver {
    pub fn new(extractor: Arc<dyn CredentialExtractor>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self { extractor, authenticator }
    }

    /// Certificate deployment: DN from the transport, mapped through `store`.
    pub fn certificate(store: Arc<dyn IdentityStore>) -> Self {
        Self::new(Arc::new(CertificateDnExtractor), Arc::new(DnAuthenticator::new(store)))
    }

    /// Security-context deployment: identity established by the upstream
    /// filter pipeline, read back out of the request-scoped context.
    pub fn security_context() -> Self {
        Self::new(Arc::new(SecurityContextExtractor), Arc::new(ContextAuthenticator))
    }

    /// Resolve the caller identity for one request.
    ///
    /// Step order: extract (failure counts as absent), authenticate
    /// (errors abort the request, a match returns immediately), then policy:
    /// required rejects with unauthorized, optional falls back to anonymous.
    pub fn resolve(&self, parts: &Parts, required: bool) -> Result<Principal, AppError> {
        if let Some(credential) = self.extractor.extract(parts) {
            let scheme = credential.scheme();
            match self.authenticator.authenticate(&credential) {
                Ok(Some(principal)) => return Ok(principal),
                Ok(None) => {}
                Err(e) => {
                    // Log the scheme only; never raw credential material.
                    error!(target: "auth", "Error authenticating credentials (scheme={}): {}", scheme, e);
                    return Err(AppError::internal("auth_failure", "error authenticating credentials"));
                }
            }
        }
        if required {
            return Err(AppError::unauthorized(
                "unauthorized",
                "Credentials are required to access this resource.",
            ));
        }
        Ok(Principal::anonymous())
    }
}

/// Handler argument requiring an authenticated caller. Resolution failure
/// rejects the request before the handler runs.
pub struct Auth(pub Principal);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.resolver.resolve(parts, true).map(Auth)
    }
}

/// Handler argument tolerating anonymous callers: absent credentials resolve
/// to the anonymous principal instead of a rejection.
pub struct OptionalAuth(pub Principal);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.resolver.resolve(parts, false).map(OptionalAuth)
    }
}
