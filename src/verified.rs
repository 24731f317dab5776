/// A payload that has passed through a [`Sanitizer`](crate::Sanitizer).
///
/// There is no public constructor; holding a `Verified<T>` is proof that the
/// value went through the sanitization path.
///
/// # Construction Invariants
///
/// - Built only by `new_unchecked`, which is `pub(crate)`
/// - Every crate call site passes the output of
///   [`MarkupSanitizer::clean_str`](crate::MarkupSanitizer::clean_str) or
///   [`MarkupSanitizer::sanitize_record`](crate::MarkupSanitizer::sanitize_record)
///
/// # Security Properties
///
/// - Read access is free (`AsRef`, `into_inner`); the guarantee is about
///   where the value came from, not about hiding it
/// - "Verified" means markup, script, inline handlers and SQL keywords were
///   stripped. It says nothing about business rules; run
///   [`ProposalValidator`](crate::ProposalValidator) for those
/// - No `Default`: an empty `Verified` would carry no provenance
///
/// External code cannot forge one:
///
/// ```compile_fail
/// use marketplace_policy::Verified;
///
/// let forged = Verified::new_unchecked("data".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps an already-sanitized value. The caller vouches for it.
    ///
    /// Only sanitizer implementations call this. Making it `pub` lets any
    /// caller label raw input as clean.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the wrapper and returns the sanitized value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
