/// Opaque identifier of an acting principal.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct AccountId(String);

impl AccountId {
    pub fn new<V: Into<String>>(value: V) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Acting principal of a request. Blocking is only meaningful for
/// identified principals, anonymous callers always pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    Identified(AccountId),
}

impl Principal {
    pub fn identified<V: Into<String>>(value: V) -> Self {
        Self::Identified(AccountId::new(value))
    }
}
