//! Feature flag registry with environment scoping and percentage rollout.
//!
//! The registry is an owned value handed to whoever needs it; there is no
//! process-global instance. Reads and toggles go through an `RwLock`, so a
//! shared `Arc<FlagRegistry>` is safe across threads.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;

/// Subject used for rollout bucketing when no identifier is available.
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Deployment environment, and the scope a flag applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    Development,
    /// Pre-production
    Staging,
    /// Live traffic
    Production,
    /// Flag scope only: applies in every environment
    All,
}

impl Environment {
    /// Returns the lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::All => "all",
        }
    }

    fn all() -> Self {
        Self::All
    }

    /// Returns `true` if a flag scoped to `self` applies when running in `current`.
    pub fn includes(&self, current: Environment) -> bool {
        *self == Self::All || *self == current
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown environment: {0}")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            "all" => Ok(Self::All),
            _ => Err(UnknownEnvironment(s.to_string())),
        }
    }
}

/// A named switch with optional environment scope and rollout percentage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlag {
    /// Unique key
    pub key: String,
    /// Base enabled state
    #[serde(default)]
    pub enabled: bool,
    /// Human-readable purpose
    #[serde(default)]
    pub description: String,
    /// Environment the flag applies to
    #[serde(default = "Environment::all")]
    pub environment: Environment,
    /// Share of subjects (0-100) that see the flag when it is enabled
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "rollout_percentage",
        alias = "rolloutpercentage"
    )]
    pub rollout_percentage: Option<u8>,
}

impl FeatureFlag {
    /// Creates a flag scoped to every environment with no rollout.
    pub fn new(key: impl Into<String>, enabled: bool) -> Self {
        Self {
            key: key.into(),
            enabled,
            description: String::new(),
            environment: Environment::All,
            rollout_percentage: None,
        }
    }

    /// Sets the description.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restricts the flag to one environment.
    pub fn in_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Limits the flag to `percentage` of subjects.
    pub fn with_rollout(mut self, percentage: u8) -> Self {
        self.rollout_percentage = Some(percentage);
        self
    }
}

/// The flag set shipped with the application.
pub fn default_flags() -> Vec<FeatureFlag> {
    vec![
        FeatureFlag::new("push-notifications", true)
            .describe("Web push notifications for new proposals and messages"),
        FeatureFlag::new("proposal-attachments", true)
            .describe("File attachments on contract proposals"),
        FeatureFlag::new("advanced-search", false)
            .describe("Faceted search over provider listings"),
        FeatureFlag::new("provider-dashboard-v2", true)
            .describe("Redesigned provider dashboard")
            .in_environment(Environment::Staging),
        FeatureFlag::new("instant-quotes", true)
            .describe("Suggested quotes on new proposals")
            .in_environment(Environment::Production)
            .with_rollout(25),
        FeatureFlag::new("debug-panel", true)
            .describe("In-app diagnostics panel")
            .in_environment(Environment::Development),
    ]
}

/// 32-bit polynomial string hash used for rollout bucketing.
///
/// Accumulates `hash * 31 + unit` over the UTF-16 code units of `subject`
/// with signed 32-bit wraparound and returns the absolute value. Existing
/// bucket assignments depend on this exact arithmetic.
pub fn rollout_hash(subject: &str) -> u32 {
    subject
        .encode_utf16()
        .fold(0i32, |hash, unit| {
            hash.wrapping_mul(31).wrapping_add(i32::from(unit))
        })
        .unsigned_abs()
}

/// Rollout bucket in `0..100` for `subject`.
///
/// ```
/// use marketplace_policy::rollout_bucket;
///
/// assert_eq!(rollout_bucket("ab"), 5);
/// assert_eq!(rollout_bucket("ab"), rollout_bucket("ab"));
/// ```
pub fn rollout_bucket(subject: &str) -> u32 {
    rollout_hash(subject) % 100
}

/// Supplies the identifier of the subject currently being evaluated.
pub trait SubjectSource: Send + Sync {
    /// Returns the current subject, or `None` when unknown.
    fn subject_id(&self) -> Option<String>;
}

impl<F> SubjectSource for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn subject_id(&self) -> Option<String> {
        self()
    }
}

/// A subject source that always reports the same identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedSubject(pub Option<String>);

impl FixedSubject {
    /// Always reports `subject`.
    pub fn new(subject: impl Into<String>) -> Self {
        Self(Some(subject.into()))
    }

    /// Never reports a subject.
    pub fn none() -> Self {
        Self(None)
    }
}

impl SubjectSource for FixedSubject {
    fn subject_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Registry of feature flags for one running environment.
///
/// Lookups never fail: an unknown key reads as disabled, and toggling an
/// unknown key does nothing.
///
/// # Examples
///
/// ```
/// use marketplace_policy::{Environment, FeatureFlag, FixedSubject, FlagRegistry};
///
/// let registry = FlagRegistry::new(
///     Environment::Production,
///     vec![
///         FeatureFlag::new("dark-mode", false),
///         FeatureFlag::new("beta-search", true).with_rollout(0),
///     ],
/// )
/// .expect("valid flags")
/// .with_subject_source(FixedSubject::new("user-42"));
///
/// assert!(!registry.is_enabled("dark-mode"));
/// registry.enable("dark-mode");
/// assert!(registry.is_enabled("dark-mode"));
///
/// assert!(!registry.is_enabled("beta-search"));
/// assert!(!registry.is_enabled("no-such-flag"));
/// ```
pub struct FlagRegistry {
    flags: RwLock<BTreeMap<String, FeatureFlag>>,
    environment: Environment,
    subject: Box<dyn SubjectSource>,
}

impl FlagRegistry {
    /// Builds a registry for `environment` from `flags`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on an empty or duplicate key, a rollout
    /// percentage above 100, or `environment` set to [`Environment::All`].
    pub fn new(
        environment: Environment,
        flags: impl IntoIterator<Item = FeatureFlag>,
    ) -> Result<Self, ConfigError> {
        validate_running_environment(environment)?;
        let mut registry = BTreeMap::new();
        for flag in flags {
            validate_flag(&flag)?;
            if registry.contains_key(&flag.key) {
                return Err(ConfigError::DuplicateFlag(flag.key));
            }
            registry.insert(flag.key.clone(), flag);
        }

        tracing::debug!(
            environment = %environment,
            flags = registry.len(),
            "feature flag registry loaded"
        );
        Ok(Self {
            flags: RwLock::new(registry),
            environment,
            subject: Box::new(FixedSubject::none()),
        })
    }

    /// Builds a registry from a JSON array of flag definitions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document does not parse, or any
    /// error [`FlagRegistry::new`] returns.
    pub fn from_json(environment: Environment, json: &str) -> Result<Self, ConfigError> {
        let flags: Vec<FeatureFlag> = serde_json::from_str(json)?;
        Self::new(environment, flags)
    }

    /// Builds a registry holding [`default_flags`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` only if the built-in set is itself invalid.
    pub fn with_defaults(environment: Environment) -> Result<Self, ConfigError> {
        Self::new(environment, default_flags())
    }

    /// Replaces the source of the current subject identifier.
    pub fn with_subject_source(mut self, source: impl SubjectSource + 'static) -> Self {
        self.subject = Box::new(source);
        self
    }

    /// Returns the environment flags are evaluated against.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Evaluates `key` for the current subject.
    ///
    /// A flag is on when all of these hold:
    ///
    /// 1. the key is known (unknown keys log a warning and read as off)
    /// 2. its environment scope is `all` or equals the registry's environment
    /// 3. its `enabled` field is `true`
    /// 4. with a rollout percentage below 100, the subject's
    ///    [`rollout_bucket`] is strictly less than that percentage
    ///
    /// Rule 3 applies under a rollout too, so a disabled flag is off for
    /// every subject regardless of its bucket. A missing subject buckets as
    /// [`ANONYMOUS_SUBJECT`].
    pub fn is_enabled(&self, key: &str) -> bool {
        let subject = self.subject.subject_id();
        self.is_enabled_for(key, subject.as_deref())
    }

    /// Evaluates `key` for an explicit subject (`None` buckets as anonymous).
    ///
    /// Same rules as [`is_enabled`](Self::is_enabled).
    pub fn is_enabled_for(&self, key: &str, subject: Option<&str>) -> bool {
        let flags = self.read();
        match flags.get(key) {
            Some(flag) => self.evaluate(flag, subject),
            None => {
                tracing::warn!(flag = %key, "unknown feature flag");
                false
            }
        }
    }

    /// Turns `key` on. Returns `false` if the key is unknown.
    pub fn enable(&self, key: &str) -> bool {
        self.set_enabled(key, true)
    }

    /// Turns `key` off. Returns `false` if the key is unknown.
    pub fn disable(&self, key: &str) -> bool {
        self.set_enabled(key, false)
    }

    /// Returns a copy of one flag definition.
    pub fn get(&self, key: &str) -> Option<FeatureFlag> {
        self.read().get(key).cloned()
    }

    /// Returns every flag, ordered by key.
    pub fn all_flags(&self) -> Vec<FeatureFlag> {
        self.read().values().cloned().collect()
    }

    /// Returns the flags enabled for the current subject, ordered by key.
    pub fn enabled_flags(&self) -> Vec<FeatureFlag> {
        let subject = self.subject.subject_id();
        self.read()
            .values()
            .filter(|flag| self.evaluate(flag, subject.as_deref()))
            .cloned()
            .collect()
    }

    fn evaluate(&self, flag: &FeatureFlag, subject: Option<&str>) -> bool {
        if !flag.environment.includes(self.environment) {
            return false;
        }

        match flag.rollout_percentage {
            Some(percentage) if percentage < 100 => {
                let subject = subject.unwrap_or(ANONYMOUS_SUBJECT);
                flag.enabled && rollout_bucket(subject) < u32::from(percentage)
            }
            _ => flag.enabled,
        }
    }

    fn set_enabled(&self, key: &str, enabled: bool) -> bool {
        let mut flags = self.write();
        match flags.get_mut(key) {
            Some(flag) => {
                flag.enabled = enabled;
                tracing::info!(flag = %key, enabled, "feature flag toggled");
                true
            }
            None => {
                tracing::debug!(flag = %key, enabled, "toggle ignored for unknown feature flag");
                false
            }
        }
    }

    // Writers only flip `enabled`, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, FeatureFlag>> {
        self.flags.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, FeatureFlag>> {
        self.flags.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for FlagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagRegistry")
            .field("environment", &self.environment)
            .field("flags", &*self.read())
            .finish_non_exhaustive()
    }
}

/// `All` is a flag scope only; a process always runs in one concrete environment.
pub(crate) fn validate_running_environment(environment: Environment) -> Result<(), ConfigError> {
    if environment == Environment::All {
        return Err(ConfigError::UnscopedEnvironment);
    }
    Ok(())
}

pub(crate) fn validate_flag(flag: &FeatureFlag) -> Result<(), ConfigError> {
    if flag.key.trim().is_empty() {
        return Err(ConfigError::EmptyFlagKey);
    }
    if let Some(value) = flag.rollout_percentage {
        if value > 100 {
            return Err(ConfigError::RolloutOutOfRange {
                key: flag.key.clone(),
                value,
            });
        }
    }
    Ok(())
}
