//! Markup and injection stripping for untrusted record payloads.
//!
//! Sanitization here never rejects input. Whatever cannot be made safe is
//! stripped, possibly down to an empty string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::{Tainted, Verified};

/// `<script ...> ... </script>` blocks, shortest enclosing pair.
static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script block pattern compiles")
});

/// Any remaining tag.
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern compiles"));

static JAVASCRIPT_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript:").expect("scheme pattern compiles"));

/// Inline handlers such as `onclick=` or `ONLOAD=`.
static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)on\w+=").expect("event handler pattern compiles"));

static SQL_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:SELECT|INSERT|UPDATE|DELETE|DROP|CREATE|ALTER|EXEC|UNION)\b")
        .expect("sql keyword pattern compiles")
});

/// Trait for turning tainted payloads into verified ones.
///
/// Implementations strip rather than reject, so the conversion cannot fail.
///
/// # Invariants
///
/// Implementations must:
///
/// - return only values they produced from the input, never the input passed
///   through unexamined
/// - be deterministic: the same input yields the same output
/// - leave the input untouched; the record path copies rather than edits
///
/// # Examples
///
/// ```
/// use marketplace_policy::{MarkupSanitizer, Sanitizer, Tainted};
///
/// let sanitizer = MarkupSanitizer::new();
/// let verified = sanitizer.sanitize(Tainted::new("  plain text  ".to_string()));
///
/// assert_eq!(verified.into_inner(), "plain text");
/// ```
pub trait Sanitizer<T> {
    /// Sanitizes `input`, returning the cleaned value.
    fn sanitize(&self, input: Tainted<T>) -> Verified<T>;
}

/// Strips script blocks, tags, `javascript:` schemes, inline event handlers
/// and SQL keywords from string values.
///
/// Passes run in a fixed order, each on the output of the previous one:
///
/// 1. `<script>...</script>` blocks (case-insensitive, attributes included)
/// 2. any remaining `<...>` tag
/// 3. the literal `javascript:` scheme, anywhere
/// 4. `on<word>=` handler prefixes
/// 5. whole-word `SELECT`, `INSERT`, `UPDATE`, `DELETE`, `DROP`, `CREATE`,
///    `ALTER`, `EXEC` and `UNION`
/// 6. leading and trailing whitespace
///
/// The result is not guaranteed to be idempotent on adversarial nested-tag
/// input; removing one tag can splice together a new one.
///
/// # Security Properties
///
/// - Output never contains a complete `<...>` tag: pass 2 runs after the
///   script pass and removes every `<` that has a later `>`
/// - Matching is case-insensitive for scripts, schemes, handlers and
///   keywords, so `<SCRIPT>`, `JavaScript:` and `OnLoad=` are all caught
/// - SQL keywords are removed only as whole words; `selection` and
///   `updated` survive
/// - Only top-level string values are cleaned. Nested arrays and objects are
///   copied verbatim and stay untrusted
/// - This is defence in depth for rendering and logging, not a substitute
///   for parameterized queries or output encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupSanitizer;

impl MarkupSanitizer {
    /// Creates a sanitizer.
    pub fn new() -> Self {
        Self
    }

    /// Runs every pass over a single string.
    ///
    /// # Examples
    ///
    /// ```
    /// use marketplace_policy::MarkupSanitizer;
    ///
    /// let clean = MarkupSanitizer::new().clean_str("<script>alert(1)</script>hello");
    /// assert_eq!(clean, "hello");
    /// ```
    pub fn clean_str(&self, input: &str) -> String {
        let s = SCRIPT_BLOCK.replace_all(input, "");
        let s = HTML_TAG.replace_all(&s, "");
        let s = JAVASCRIPT_SCHEME.replace_all(&s, "");
        let s = EVENT_HANDLER.replace_all(&s, "");
        let s = SQL_KEYWORD.replace_all(&s, "");
        s.trim().to_string()
    }

    /// Returns a copy of `record` with every top-level string value cleaned.
    ///
    /// Non-string values, including nested arrays and objects, are copied
    /// as-is. The input is never modified.
    pub fn sanitize_record(&self, record: &Map<String, Value>) -> Map<String, Value> {
        let mut changed = 0usize;
        let cleaned = record
            .iter()
            .map(|(field, value)| {
                let value = match value {
                    Value::String(raw) => {
                        let clean = self.clean_str(raw);
                        if clean != *raw {
                            changed += 1;
                        }
                        Value::String(clean)
                    }
                    other => other.clone(),
                };
                (field.clone(), value)
            })
            .collect();

        if changed > 0 {
            tracing::debug!(fields = record.len(), changed, "sanitized record payload");
        }
        cleaned
    }
}

impl Sanitizer<String> for MarkupSanitizer {
    fn sanitize(&self, input: Tainted<String>) -> Verified<String> {
        Verified::new_unchecked(self.clean_str(&input.into_inner()))
    }
}

impl Sanitizer<Map<String, Value>> for MarkupSanitizer {
    fn sanitize(&self, input: Tainted<Map<String, Value>>) -> Verified<Map<String, Value>> {
        Verified::new_unchecked(self.sanitize_record(input.peek()))
    }
}

/// Cleans every top-level string field of `record` with [`MarkupSanitizer`].
///
/// # Examples
///
/// ```
/// use marketplace_policy::sanitize;
/// use serde_json::json;
///
/// let payload = json!({ "titulo": "<i>Logo</i>", "presupuesto": 120 });
/// let clean = sanitize(payload.as_object().unwrap());
///
/// assert_eq!(clean["titulo"], "Logo");
/// assert_eq!(clean["presupuesto"], 120);
/// ```
pub fn sanitize(record: &Map<String, Value>) -> Map<String, Value> {
    MarkupSanitizer::new().sanitize_record(record)
}
