use std::fmt;

/// A payload received from an untrusted source (form submission, query
/// string, upload metadata) that has not been sanitized yet.
///
/// The wrapped value is unreachable from outside the crate. The only way out
/// is through a [`Sanitizer`](crate::Sanitizer), which yields a
/// [`Verified<T>`](crate::Verified).
///
/// # Security Properties
///
/// - No `Deref`, `AsRef`, `Borrow`, `From<T>` or `Into<T>`: a tainted value
///   cannot be read, formatted with `Display` or passed where `T` is expected
/// - `Debug` is kept and prints the raw value, marked as `Tainted`, for
///   development logs
/// - `Clone` is kept; cloning does not clean anything, both copies stay tainted
///
/// # Examples
///
/// ```
/// use marketplace_policy::{MarkupSanitizer, Sanitizer, Tainted};
///
/// let raw = Tainted::new("<b>Logo</b> redesign".to_string());
/// let clean = MarkupSanitizer::new().sanitize(raw);
///
/// assert_eq!(clean.as_ref(), "Logo redesign");
/// ```
// Do not add Deref, AsRef, Borrow or Into<T>: each one is a sanitizer bypass.
#[derive(Clone)]
pub struct Tainted<T> {
    // Must stay private. A public field skips the sanitizer entirely.
    inner: T,
}

impl<T> Tainted<T> {
    /// Marks a value as untrusted.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the raw value. Sanitizer implementations only.
    ///
    /// Used where the sanitizer builds a fresh value from the input (the JSON
    /// record path) and does not need ownership. Widening this to `pub`
    /// hands raw input to any caller.
    pub(crate) fn peek(&self) -> &T {
        &self.inner
    }

    /// Extracts the raw value. Sanitizer implementations only.
    ///
    /// Every caller must wrap what it returns in `Verified` only after
    /// cleaning it.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
