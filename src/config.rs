//! Static configuration for the policy core.
//!
//! Loaded once at process start with the `config` crate: an optional file
//! (format inferred from its extension) overlaid by environment variables
//! prefixed `MARKETPLACE_POLICY`, with `__` separating nested keys.
//!
//! - `MARKETPLACE_POLICY__ENVIRONMENT=production` -> `environment`
//! - `MARKETPLACE_POLICY__UPLOAD__MAX_SIZE_BYTES=1048576` -> `upload.max_size_bytes`
//!
//! Flag definitions come from the file, or from [`default_flags`] when it
//! lists none.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::flags::{
    default_flags, validate_flag, validate_running_environment, Environment, FeatureFlag,
    FlagRegistry,
};
use crate::upload::{FileUploadPolicy, ALLOWED_MIME_TYPES, BLOCKED_EXTENSIONS, MAX_UPLOAD_BYTES};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MARKETPLACE_POLICY";

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Environment the process runs in
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Upload limits
    #[serde(default)]
    pub upload: UploadLimits,

    /// Feature flag definitions
    #[serde(default = "default_flags")]
    pub flags: Vec<FeatureFlag>,
}

/// Upload limits fed into [`FileUploadPolicy`].
#[derive(Debug, Clone, Deserialize)]
pub struct UploadLimits {
    /// Maximum accepted size in bytes
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,

    /// Accepted MIME types
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,

    /// Refused filename suffixes
    #[serde(default = "default_blocked_extensions")]
    pub blocked_extensions: Vec<String>,
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_max_size_bytes() -> u64 {
    MAX_UPLOAD_BYTES
}

fn default_allowed_mime_types() -> Vec<String> {
    ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect()
}

fn default_blocked_extensions() -> Vec<String> {
    BLOCKED_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_size_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
            blocked_extensions: default_blocked_extensions(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            upload: UploadLimits::default(),
            flags: default_flags(),
        }
    }
}

impl PolicyConfig {
    /// Loads configuration from environment variables only.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed or fails
    /// [`validate`](Self::validate).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from `path` (if given), then environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed, a value
    /// cannot be parsed, or validation fails.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::info!(
            environment = %config.environment,
            flags = config.flags.len(),
            max_upload_bytes = config.upload.max_size_bytes,
            "policy configuration loaded"
        );
        Ok(config)
    }

    /// Checks semantic constraints the type system does not.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an `all` environment, a zero upload limit,
    /// or an invalid or duplicated flag.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_running_environment(self.environment)?;
        if self.upload.max_size_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }

        let mut seen = std::collections::HashSet::new();
        for flag in &self.flags {
            validate_flag(flag)?;
            if !seen.insert(flag.key.as_str()) {
                return Err(ConfigError::DuplicateFlag(flag.key.clone()));
            }
        }
        Ok(())
    }

    /// Builds the upload policy described by `upload`.
    pub fn upload_policy(&self) -> FileUploadPolicy {
        FileUploadPolicy::with_max_size(self.upload.max_size_bytes)
            .allow_mime_types(self.upload.allowed_mime_types.iter().cloned())
            .block_extensions(self.upload.blocked_extensions.iter().cloned())
    }

    /// Builds a flag registry for the configured environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the flag list is invalid.
    pub fn flag_registry(&self) -> Result<FlagRegistry, ConfigError> {
        FlagRegistry::new(self.environment, self.flags.iter().cloned())
    }
}
