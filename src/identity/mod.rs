//! Request-scoped identity resolution: credentials, authenticators and the
//! per-request resolver. Keep the public surface thin and split the
//! implementation across sub-modules.

mod authenticator;
mod credentials;
mod extractor;
mod principal;
mod resolver;

pub use authenticator::{Authenticator, ContextAuthenticator, DnAuthenticator, IdentityStore, MemoryIdentityStore};
pub use credentials::{Authentication, Credential, CredentialScheme, PeerCertificateDn, SecurityContext, CLIENT_CERT_DN_HEADER};
pub use extractor::{CertificateDnExtractor, CredentialExtractor, SecurityContextExtractor};
pub use principal::Principal;
pub use resolver::{Auth, IdentityResolver, OptionalAuth};
