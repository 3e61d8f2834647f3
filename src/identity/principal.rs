use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The resolved caller identity for one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    #[serde(default)]
    pub authorities: BTreeSet<String>,
    #[serde(default)]
    pub anonymous: bool,
}

impl Principal {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), authorities: BTreeSet::new(), anonymous: false }
    }

    pub fn with_authority<S: Into<String>>(mut self, authority: S) -> Self {
        self.authorities.insert(authority.into());
        self
    }

    /// The fallback identity when authentication is optional and absent.
    pub fn anonymous() -> Self {
        Self { name: "anonymous".to_string(), authorities: BTreeSet::new(), anonymous: true }
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}
