//! Policy and validation core for a services marketplace.
//!
//! Every check in this crate is a synchronous decision over data the caller
//! already extracted: an identity assertion, a form payload, a file
//! descriptor, a subject identifier. Nothing here persists, performs I/O at
//! evaluation time, or signs anything.
//!
//! # Components
//!
//! - [`MarkupSanitizer`] / [`sanitize`]: strip markup, script and SQL
//!   keywords from string fields of an untrusted record
//! - [`ProposalValidator`]: field rules for contract proposals
//! - [`FileUploadPolicy`]: size and type rules for uploads
//! - [`validate_authentication`] / [`validate_admin_access`]: decisions over an
//!   [`AuthContext`], composable through [`AccessGate`]
//! - [`FlagRegistry`]: feature flags with environment scope and deterministic
//!   percentage rollout
//!
//! Validators report failures as [`ErrorCode`] values inside result objects
//! rather than as `Err`. Only configuration loading returns [`ConfigError`].
//!
//! # Examples
//!
//! ```
//! use marketplace_policy::{
//!     validate_admin_access, AuthContext, ErrorCode, FileDescriptor, FileUploadPolicy,
//!     IdentityAssertion, TokenClaims,
//! };
//!
//! let ctx = AuthContext::authenticated(IdentityAssertion::new(
//!     "u-1",
//!     TokenClaims::verified("ana@example.com"),
//! ));
//! let admin = validate_admin_access(&ctx);
//! assert_eq!(admin.error(), Some(ErrorCode::InsufficientPermissions));
//!
//! let upload = FileDescriptor::new("malware.exe", 1024, "application/pdf");
//! let result = FileUploadPolicy::default().validate(&upload);
//! assert_eq!(result.errors(), &[ErrorCode::FileTypeNotAllowed]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod clock;
pub mod config;
mod error;
mod flags;
mod gate;
mod policy;
mod proposal;
mod request;
mod sanitizer;
mod tainted;
mod upload;
mod validation;
mod verified;

pub use auth::{
    validate_admin_access, validate_authentication, AdminValidationResult, AuthValidationResult,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use crate::config::PolicyConfig;
pub use error::{ConfigError, ErrorCode, UnknownErrorCode};
pub use flags::{
    default_flags, rollout_bucket, rollout_hash, Environment, FeatureFlag, FixedSubject,
    FlagRegistry, SubjectSource, UnknownEnvironment, ANONYMOUS_SUBJECT,
};
pub use gate::AccessGate;
pub use policy::{Admin, Authenticated, Requirement};
pub use proposal::{validate_proposal, ProposalFields, ProposalValidator, ServiceType};
pub use request::{AuthContext, IdentityAssertion, TokenClaims};
pub use sanitizer::{sanitize, MarkupSanitizer, Sanitizer};
pub use tainted::Tainted;
pub use upload::{
    validate_upload, FileDescriptor, FileUploadPolicy, ALLOWED_MIME_TYPES, BLOCKED_EXTENSIONS,
    MAX_UPLOAD_BYTES,
};
pub use validation::ValidationResult;
pub use verified::Verified;
