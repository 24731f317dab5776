//! Authentication and admin decisions derived from an [`AuthContext`].
//!
//! Both checks default closed: anything short of a verified identity is a
//! denial carrying an [`ErrorCode`].

use serde::Serialize;

use crate::error::ErrorCode;
use crate::request::AuthContext;

/// Outcome of [`validate_authentication`].
///
/// Either valid with a `uid`, or invalid with an `error`; never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthValidationResult {
    is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorCode>,
}

impl AuthValidationResult {
    fn granted(uid: String) -> Self {
        Self {
            is_valid: true,
            uid: Some(uid),
            error: None,
        }
    }

    fn denied(error: ErrorCode) -> Self {
        Self {
            is_valid: false,
            uid: None,
            error: Some(error),
        }
    }

    /// Returns `true` if the caller is authenticated with a verified email.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns the subject identifier on success.
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Returns the denial code on failure.
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    /// Converts into a `Result` carrying the uid.
    ///
    /// # Errors
    ///
    /// Returns the denial code when authentication failed.
    pub fn into_result(self) -> Result<String, ErrorCode> {
        match (self.uid, self.error) {
            (Some(uid), None) => Ok(uid),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ErrorCode::Unauthenticated),
        }
    }
}

/// Outcome of [`validate_admin_access`].
///
/// Either admin with a `uid`, or not admin with an `error`; never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminValidationResult {
    is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorCode>,
}

impl AdminValidationResult {
    fn granted(uid: String) -> Self {
        Self {
            is_admin: true,
            uid: Some(uid),
            error: None,
        }
    }

    fn denied(error: ErrorCode) -> Self {
        Self {
            is_admin: false,
            uid: None,
            error: Some(error),
        }
    }

    /// Returns `true` if the caller is an authenticated admin.
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the subject identifier on success.
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Returns the denial code on failure.
    pub fn error(&self) -> Option<ErrorCode> {
        self.error
    }

    /// Converts into a `Result` carrying the uid.
    ///
    /// # Errors
    ///
    /// Returns the denial code when admin access was refused.
    pub fn into_result(self) -> Result<String, ErrorCode> {
        match (self.uid, self.error) {
            (Some(uid), None) => Ok(uid),
            (_, Some(error)) => Err(error),
            (None, None) => Err(ErrorCode::InsufficientPermissions),
        }
    }
}

/// Decides whether `ctx` is authenticated.
///
/// | condition                              | result                    |
/// |----------------------------------------|---------------------------|
/// | no assertion                           | `unauthenticated`         |
/// | assertion, `email_verified` not true   | `email-not-verified`      |
/// | otherwise                              | valid, `uid` from context |
///
/// # Examples
///
/// ```
/// use marketplace_policy::{
///     validate_authentication, AuthContext, ErrorCode, IdentityAssertion, TokenClaims,
/// };
///
/// let anonymous = validate_authentication(&AuthContext::anonymous());
/// assert_eq!(anonymous.error(), Some(ErrorCode::Unauthenticated));
///
/// let ctx = AuthContext::authenticated(IdentityAssertion::new(
///     "u-42",
///     TokenClaims::verified("ana@example.com"),
/// ));
/// assert_eq!(validate_authentication(&ctx).uid(), Some("u-42"));
/// ```
pub fn validate_authentication(ctx: &AuthContext) -> AuthValidationResult {
    let result = match &ctx.assertion {
        None => AuthValidationResult::denied(ErrorCode::Unauthenticated),
        Some(assertion) if !assertion.token.email_verified => {
            AuthValidationResult::denied(ErrorCode::EmailNotVerified)
        }
        Some(assertion) => AuthValidationResult::granted(assertion.uid.clone()),
    };

    if let Some(code) = result.error {
        tracing::debug!(code = %code, uid = ctx.uid().unwrap_or("<none>"), "authentication denied");
    }
    result
}

/// Decides whether `ctx` carries admin privileges.
///
/// Runs [`validate_authentication`] first and passes its error through
/// unchanged. An authenticated caller without the `admin` claim gets
/// `insufficient-permissions`.
pub fn validate_admin_access(ctx: &AuthContext) -> AdminValidationResult {
    let auth = validate_authentication(ctx);
    if let Some(code) = auth.error {
        return AdminValidationResult::denied(code);
    }

    match (&ctx.assertion, auth.uid) {
        (Some(assertion), Some(uid)) if assertion.token.admin => {
            AdminValidationResult::granted(uid)
        }
        (_, uid) => {
            tracing::debug!(
                code = %ErrorCode::InsufficientPermissions,
                uid = uid.as_deref().unwrap_or("<none>"),
                "admin access denied"
            );
            AdminValidationResult::denied(ErrorCode::InsufficientPermissions)
        }
    }
}
