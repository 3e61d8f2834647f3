use super::principal::Principal;

/// Request extension carrying the distinguished name the transport layer
/// extracted from the client certificate at TLS handshake time.
#[derive(Debug, Clone)]
pub struct PeerCertificateDn(pub String);

/// Header a TLS-terminating proxy may use to forward the client DN when the
/// runtime itself does not see the handshake.
pub const CLIENT_CERT_DN_HEADER: &str = "x-client-certificate-dn";

/// The authentication slot of a request's security context, populated by the
/// upstream filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Conventional placeholder for an unauthenticated caller. Not a real
    /// identity; resolution treats it the same as an empty context.
    Anonymous,
    Authenticated(Principal),
}

/// Per-request security context. Request-scoped, never shared across
/// requests, attached as a request extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    pub fn empty() -> Self { Self { authentication: None } }

    pub fn anonymous_marker() -> Self {
        Self { authentication: Some(Authentication::Anonymous) }
    }

    pub fn authenticated(principal: Principal) -> Self {
        Self { authentication: Some(Authentication::Authenticated(principal)) }
    }

    /// Named check for the anonymous placeholder. Keep this explicit: if the
    /// upstream pipeline changes its anonymous representation, this is the
    /// single place that must follow.
    pub fn is_anonymous_marker(&self) -> bool {
        matches!(self.authentication, Some(Authentication::Anonymous))
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }
}

/// One raw credential extracted from an inbound request. At most one per
/// request; never persisted.
#[derive(Debug, Clone)]
pub enum Credential {
    CertificateDn(String),
    Context(SecurityContext),
}

/// Loggable credential tag. Never carries raw credential material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    Certificate,
    SecurityContext,
}

impl Credential {
    pub fn scheme(&self) -> CredentialScheme {
        match self {
            Credential::CertificateDn(_) => CredentialScheme::Certificate,
            Credential::Context(_) => CredentialScheme::SecurityContext,
        }
    }
}

impl std::fmt::Display for CredentialScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialScheme::Certificate => write!(f, "certificate"),
            CredentialScheme::SecurityContext => write!(f, "security-context"),
        }
    }
}
