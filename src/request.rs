use serde::{Deserialize, Serialize};

/// Identity information extracted by the calling layer from a verified
/// identity-provider assertion.
///
/// `assertion: None` means the caller is unauthenticated. The core only reads
/// this value; it never mutates or re-verifies it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    /// The verified assertion, if any
    #[serde(default, rename = "auth")]
    pub assertion: Option<IdentityAssertion>,
}

impl AuthContext {
    /// A context with no identity.
    pub fn anonymous() -> Self {
        Self { assertion: None }
    }

    /// A context carrying `assertion`.
    pub fn authenticated(assertion: IdentityAssertion) -> Self {
        Self {
            assertion: Some(assertion),
        }
    }

    /// Returns the subject identifier, if an assertion is present.
    pub fn uid(&self) -> Option<&str> {
        self.assertion.as_ref().map(|a| a.uid.as_str())
    }
}

/// A verified identity: subject identifier plus token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityAssertion {
    /// Subject identifier, non-empty by provider contract
    pub uid: String,
    /// Claims carried by the token
    #[serde(default)]
    pub token: TokenClaims,
}

impl IdentityAssertion {
    /// Creates an assertion for `uid` with `token` claims.
    pub fn new(uid: impl Into<String>, token: TokenClaims) -> Self {
        Self {
            uid: uid.into(),
            token,
        }
    }
}

/// Token claims the policy core inspects.
///
/// Missing boolean claims read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Email address on the account
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the provider verified the email address
    #[serde(default)]
    pub email_verified: bool,
    /// Custom claim granting admin privileges
    #[serde(default)]
    pub admin: bool,
}

impl TokenClaims {
    /// Claims for a verified email address, without admin.
    pub fn verified(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            email_verified: true,
            admin: false,
        }
    }

    /// Sets the admin claim.
    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }
}
