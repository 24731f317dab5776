/// An access requirement checked by [`AccessGate`](crate::AccessGate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Caller must be authenticated with a verified email
    Authenticated,
    /// Caller must be authenticated and carry the admin claim
    Admin,
}

/// Requires an authenticated caller with a verified email.
pub struct Authenticated;

/// Requires an authenticated caller with the admin claim.
pub struct Admin;

impl From<Authenticated> for Requirement {
    fn from(_: Authenticated) -> Self {
        Requirement::Authenticated
    }
}

impl From<Admin> for Requirement {
    fn from(_: Admin) -> Self {
        Requirement::Admin
    }
}
