use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AuthError;
use crate::tprintln;

use super::credentials::{Authentication, Credential};
use super::principal::Principal;

/// Converts a raw credential into an optional typed principal.
///
/// `Ok(Some(_))` is an authenticated principal, `Ok(None)` means the
/// credential matched nothing (not an error at this layer; policy enforcement
/// happens in the resolver), `Err(_)` is an authenticator failure and must
/// propagate. Silently downgrading an error to `None` would let a malformed
/// credential bypass required authentication.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, credential: &Credential) -> Result<Option<Principal>, AuthError>;
}

/// Lookup source mapping a certificate distinguished name to a principal.
pub trait IdentityStore: Send + Sync {
    fn lookup_dn(&self, dn: &str) -> Result<Option<Principal>, AuthError>;
}

/// In-memory identity store keyed by exact DN.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    entries: HashMap<String, Principal>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self { Self::default() }

    pub fn with<S: Into<String>>(mut self, dn: S, principal: Principal) -> Self {
        self.entries.insert(dn.into(), principal);
        self
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

impl IdentityStore for MemoryIdentityStore {
    fn lookup_dn(&self, dn: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.entries.get(dn).cloned())
    }
}

/// Certificate-scheme authenticator: maps the DN through the identity store.
/// An unknown DN is absent, not a failure.
pub struct DnAuthenticator {
    store: Arc<dyn IdentityStore>,
}

impl DnAuthenticator {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self { Self { store } }
}

impl Authenticator for DnAuthenticator {
    fn authenticate(&self, credential: &Credential) -> Result<Option<Principal>, AuthError> {
        let Credential::CertificateDn(dn) = credential else {
            // Wrong scheme for this authenticator: absent, not an error.
            return Ok(None);
        };
        let principal = self.store.lookup_dn(dn)?;
        if let Some(p) = &principal {
            tprintln!("auth.dn user={} authorities={}", p.name, p.authorities.len());
        }
        Ok(principal)
    }
}

/// Security-context authenticator: the credential already carries the
/// identity authenticated by the upstream filter pipeline, so this is a
/// type-safe extraction. It fails only on a malformed stored value.
#[derive(Debug, Default)]
pub struct ContextAuthenticator;

impl Authenticator for ContextAuthenticator {
    fn authenticate(&self, credential: &Credential) -> Result<Option<Principal>, AuthError> {
        let Credential::Context(ctx) = credential else {
            return Ok(None);
        };
        match ctx.authentication() {
            Some(Authentication::Authenticated(principal)) => {
                if principal.name.is_empty() {
                    return Err(AuthError::Malformed("authenticated principal with empty name".into()));
                }
                if principal.anonymous {
                    return Err(AuthError::Malformed(
                        "authenticated principal flagged anonymous".into(),
                    ));
                }
                Ok(Some(principal.clone()))
            }
            // Anonymous markers and empty contexts are filtered at extraction,
            // but authentication must not rely on that.
            Some(Authentication::Anonymous) | None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SecurityContext;

    struct FailingStore;
    impl IdentityStore for FailingStore {
        fn lookup_dn(&self, _dn: &str) -> Result<Option<Principal>, AuthError> {
            Err(AuthError::Store("backend unavailable".into()))
        }
    }

    #[test]
    fn known_dn_authenticates() {
        let store = MemoryIdentityStore::new().with("CN=svc-a", Principal::named("svc-a").with_authority("svc"));
        let auth = DnAuthenticator::new(Arc::new(store));
        let p = auth
            .authenticate(&Credential::CertificateDn("CN=svc-a".into()))
            .unwrap()
            .unwrap();
        assert_eq!(p.name, "svc-a");
        assert!(p.has_authority("svc"));
    }

    #[test]
    fn unknown_dn_is_absent_not_error() {
        let auth = DnAuthenticator::new(Arc::new(MemoryIdentityStore::new()));
        let out = auth.authenticate(&Credential::CertificateDn("CN=stranger".into())).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn store_failure_propagates() {
        let auth = DnAuthenticator::new(Arc::new(FailingStore));
        let err = auth.authenticate(&Credential::CertificateDn("CN=svc-a".into())).unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[test]
    fn context_extraction_is_direct() {
        let cred = Credential::Context(SecurityContext::authenticated(Principal::named("alice")));
        let p = ContextAuthenticator.authenticate(&cred).unwrap().unwrap();
        assert_eq!(p.name, "alice");
    }

    #[test]
    fn malformed_context_value_is_an_error() {
        let cred = Credential::Context(SecurityContext::authenticated(Principal::named("")));
        let err = ContextAuthenticator.authenticate(&cred).unwrap_err();
        assert!(matches!(err, AuthError::Malformed(_)));
    }

    #[test]
    fn wrong_scheme_is_absent() {
        let cred = Credential::CertificateDn("CN=svc-a".into());
        assert!(ContextAuthenticator.authenticate(&cred).unwrap().is_none());
    }
}
