use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A fixed, enumerable token identifying a specific validation failure.
///
/// Callers branch on these codes instead of free-text messages. The wire form
/// (`as_str`, `Display`, serde) is the kebab-case token the UI layer expects.
///
/// # Examples
///
/// ```
/// use marketplace_policy::ErrorCode;
///
/// assert_eq!(ErrorCode::EmailNotVerified.as_str(), "email-not-verified");
/// assert_eq!("titulo-too-short".parse::<ErrorCode>(), Ok(ErrorCode::TituloTooShort));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    /// No identity assertion was presented
    Unauthenticated,
    /// Identity is present but the email address is not verified
    EmailNotVerified,
    /// Authenticated, but lacking the admin claim
    InsufficientPermissions,
    /// Proposal title shorter than three characters
    TituloTooShort,
    /// Proposal description missing or blank
    DescripcionEmpty,
    /// Proposal deadline missing or not in the future
    FechaLimitePast,
    /// Service type outside the accepted set
    TipoServicioInvalid,
    /// Suggested budget not strictly positive
    PresupuestoNegative,
    /// Uploaded file exceeds the size limit
    FileSizeTooLarge,
    /// Uploaded file has a disallowed MIME type or extension
    FileTypeNotAllowed,
}

impl ErrorCode {
    /// Every code, in declaration order.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::Unauthenticated,
        ErrorCode::EmailNotVerified,
        ErrorCode::InsufficientPermissions,
        ErrorCode::TituloTooShort,
        ErrorCode::DescripcionEmpty,
        ErrorCode::FechaLimitePast,
        ErrorCode::TipoServicioInvalid,
        ErrorCode::PresupuestoNegative,
        ErrorCode::FileSizeTooLarge,
        ErrorCode::FileTypeNotAllowed,
    ];

    /// Returns the wire token for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::EmailNotVerified => "email-not-verified",
            Self::InsufficientPermissions => "insufficient-permissions",
            Self::TituloTooShort => "titulo-too-short",
            Self::DescripcionEmpty => "descripcion-empty",
            Self::FechaLimitePast => "fecha-limite-past",
            Self::TipoServicioInvalid => "tipo-servicio-invalid",
            Self::PresupuestoNegative => "presupuesto-negative",
            Self::FileSizeTooLarge => "file-size-too-large",
            Self::FileTypeNotAllowed => "file-type-not-allowed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`ErrorCode`] token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error code: {0}")]
pub struct UnknownErrorCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownErrorCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownErrorCode(s.to_string()))
    }
}

/// Errors raised while loading or validating policy configuration.
///
/// This is the only fallible surface of the crate: every validator and flag
/// lookup returns a decision, never an error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized
    #[error("configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    /// A JSON flag document could not be parsed
    #[error("flag definitions are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two flags share the same key
    #[error("duplicate feature flag key: {0}")]
    DuplicateFlag(String),

    /// A rollout percentage outside 0..=100
    #[error("rollout percentage for flag '{key}' must be at most 100, got {value}")]
    RolloutOutOfRange {
        /// Offending flag key
        key: String,
        /// Configured percentage
        value: u8,
    },

    /// A flag with an empty key
    #[error("feature flag key must not be empty")]
    EmptyFlagKey,

    /// `all` given as the environment the process runs in
    #[error("environment 'all' is a flag scope, not a running environment")]
    UnscopedEnvironment,

    /// Upload size limit of zero bytes
    #[error("upload size limit must be greater than zero")]
    ZeroUploadLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_display_as_wire_tokens() {
        assert_eq!(ErrorCode::Unauthenticated.to_string(), "unauthenticated");
        assert_eq!(
            ErrorCode::InsufficientPermissions.to_string(),
            "insufficient-permissions"
        );
        assert_eq!(
            ErrorCode::FileTypeNotAllowed.to_string(),
            "file-type-not-allowed"
        );
    }

    #[test]
    fn every_code_parses_back() {
        for code in ErrorCode::ALL {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "not-a-code".parse::<ErrorCode>().unwrap_err();
        assert_eq!(err, UnknownErrorCode("not-a-code".to_string()));
        assert!(err.to_string().contains("not-a-code"));
    }

    #[test]
    fn serde_uses_kebab_case_tokens() {
        let json = serde_json::to_string(&ErrorCode::FechaLimitePast).unwrap();
        assert_eq!(json, "\"fecha-limite-past\"");

        let code: ErrorCode = serde_json::from_str("\"presupuesto-negative\"").unwrap();
        assert_eq!(code, ErrorCode::PresupuestoNegative);
    }

    #[test]
    fn config_error_messages() {
        let err = ConfigError::RolloutOutOfRange {
            key: "beta".to_string(),
            value: 150,
        };
        assert!(err.to_string().contains("beta"));
        assert!(err.to_string().contains("150"));

        let err = ConfigError::DuplicateFlag("dark-mode".to_string());
        assert_eq!(err.to_string(), "duplicate feature flag key: dark-mode");
    }
}
