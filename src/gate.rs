use crate::{
    auth::{validate_admin_access, validate_authentication},
    error::ErrorCode,
    policy::Requirement,
    request::AuthContext,
};

/// Checks a list of access requirements against an [`AuthContext`].
///
/// Requirements are evaluated in the order they were added and evaluation
/// stops at the first failure. A gate with no requirements still refuses an
/// anonymous caller.
///
/// # Examples
///
/// ```
/// use marketplace_policy::{
///     AccessGate, Admin, Authenticated, AuthContext, ErrorCode, IdentityAssertion, TokenClaims,
/// };
///
/// let ctx = AuthContext::authenticated(IdentityAssertion::new(
///     "u-7",
///     TokenClaims::verified("ana@example.com"),
/// ));
///
/// let uid = AccessGate::new(&ctx).require(Authenticated).check();
/// assert_eq!(uid, Ok("u-7"));
///
/// let denied = AccessGate::new(&ctx).require(Authenticated).require(Admin).check();
/// assert_eq!(denied, Err(ErrorCode::InsufficientPermissions));
/// ```
#[derive(Debug)]
pub struct AccessGate<'a> {
    ctx: &'a AuthContext,
    requirements: Vec<Requirement>,
}

impl<'a> AccessGate<'a> {
    /// Creates a gate over `ctx` with no requirements.
    pub fn new(ctx: &'a AuthContext) -> Self {
        Self {
            ctx,
            requirements: Vec::new(),
        }
    }

    /// Adds a requirement. A requirement already present is not added twice.
    pub fn require(mut self, requirement: impl Into<Requirement>) -> Self {
        let req = requirement.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Evaluates every requirement, returning the caller's uid on success.
    ///
    /// # Errors
    ///
    /// Returns the code of the first failing requirement, or
    /// `unauthenticated` if the context has no identity.
    pub fn check(self) -> Result<&'a str, ErrorCode> {
        for req in &self.requirements {
            self.check_one(*req)?;
        }
        self.ctx.uid().ok_or(ErrorCode::Unauthenticated)
    }

    fn check_one(&self, req: Requirement) -> Result<(), ErrorCode> {
        let error = match req {
            Requirement::Authenticated => validate_authentication(self.ctx).error(),
            Requirement::Admin => validate_admin_access(self.ctx).error(),
        };
        match error {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }
}
