use serde::Serialize;

use crate::error::ErrorCode;

/// Outcome of a rule-set validation.
///
/// `is_valid()` is `true` exactly when `errors()` is empty. Errors appear in
/// rule-evaluation order; every failing rule contributes one entry, and
/// repeated codes are kept.
///
/// # Examples
///
/// ```
/// use marketplace_policy::{ErrorCode, FileDescriptor, FileUploadPolicy};
///
/// let file = FileDescriptor::new("setup.exe", 1024, "application/pdf");
/// let result = FileUploadPolicy::default().validate(&file);
///
/// assert!(!result.is_valid());
/// assert_eq!(result.errors(), &[ErrorCode::FileTypeNotAllowed]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<ErrorCode>,
}

impl ValidationResult {
    /// A result with no errors.
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Returns `true` if no rule failed.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns the failed-rule codes in evaluation order.
    pub fn errors(&self) -> &[ErrorCode] {
        &self.errors
    }

    /// Returns `true` if `code` was produced by any rule.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.contains(&code)
    }

    /// Consumes the result, returning the error list.
    pub fn into_errors(self) -> Vec<ErrorCode> {
        self.errors
    }

    /// Converts into a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the full error list when any rule failed.
    pub fn into_result(self) -> Result<(), Vec<ErrorCode>> {
        if self.is_valid {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

/// Accumulates rule failures without short-circuiting.
#[derive(Debug, Default)]
pub(crate) struct RuleCollector {
    errors: Vec<ErrorCode>,
}

impl RuleCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records `code` when `passed` is false.
    pub(crate) fn check(&mut self, passed: bool, code: ErrorCode) -> &mut Self {
        if !passed {
            self.errors.push(code);
        }
        self
    }

    pub(crate) fn finish(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
        }
    }
}
