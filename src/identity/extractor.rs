//! Credential-extraction strategies. The deployment configuration picks one;
//! there is no runtime feature-detection between them.

use axum::http::request::Parts;

use super::credentials::{Credential, PeerCertificateDn, SecurityContext, CLIENT_CERT_DN_HEADER};

/// Produces zero-or-one raw credential from an inbound request. Transport
/// anomalies (missing attribute, undecodable header) yield `None`, never an
/// error: extraction failure must not abort optional-auth requests.
pub trait CredentialExtractor: Send + Sync {
    fn extract(&self, parts: &Parts) -> Option<Credential>;
}

/// Reads the client-certificate distinguished name: the request extension the
/// transport attached, falling back to the proxy-forwarded header.
#[derive(Debug, Default)]
pub struct CertificateDnExtractor;

impl CredentialExtractor for CertificateDnExtractor {
    fn extract(&self, parts: &Parts) -> Option<Credential> {
        if let Some(dn) = parts.extensions.get::<PeerCertificateDn>() {
            return Some(Credential::CertificateDn(dn.0.clone()));
        }
        let header = parts.headers.get(CLIENT_CERT_DN_HEADER)?;
        let dn = header.to_str().ok()?;
        if dn.is_empty() {
            return None;
        }
        Some(Credential::CertificateDn(dn.to_string()))
    }
}

/// Reads the request-scoped security context seeded by the upstream filter
/// pipeline. The generic anonymous marker counts as no credential, so
/// anonymous requests are never "authenticated" as a distinct account.
#[derive(Debug, Default)]
pub struct SecurityContextExtractor;

impl CredentialExtractor for SecurityContextExtractor {
    fn extract(&self, parts: &Parts) -> Option<Credential> {
        let ctx = parts.extensions.get::<SecurityContext>()?;
        if ctx.is_anonymous_marker() || ctx.authentication().is_none() {
            return None;
        }
        Some(Credential::Context(ctx.clone()))
    }
}
