//! Engine configuration loaded from TOML.
//!
//! ```toml
//! phases = ["requirement_refiner", "design_guidance", "deployment"]
//! default_due_time = "18:00"
//! due_utc_offset_minutes = 330
//! default_step_hours = "1.5"
//!
//! [notifications]
//! access_requested = "Access requested for task: {{ title }}"
//! ```
//!
//! Every key is optional; omitted keys take the values of
//! [`EngineConfig::default`].

use crate::notify::{NotificationTemplates, TemplateRenderError};
use crate::task::domain::{
    Effort, LockPolicy, PhaseCatalog, TaskDomainError, parse_time_of_day,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::FixedOffset;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PHASEGATE_CONFIG";

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        /// File that was requested.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: Arc<std::io::Error>,
    },

    /// The path in the environment variable is not valid UTF-8.
    #[error("{CONFIG_ENV} does not hold a UTF-8 path")]
    NonUtf8Path,

    /// The TOML document is malformed or holds unknown keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed domain validation.
    #[error("invalid configuration value: {0}")]
    Value(#[from] TaskDomainError),

    /// The UTC offset is outside the representable range.
    #[error("due_utc_offset_minutes {0} is out of range")]
    Offset(i32),

    /// A notification template override does not render.
    #[error(transparent)]
    Template(#[from] TemplateRenderError),
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawEngineConfig {
    phases: PhaseCatalog,
    default_due_time: String,
    due_utc_offset_minutes: i32,
    default_step_hours: String,
    notifications: NotificationTemplates,
}

impl Default for RawEngineConfig {
    fn default() -> Self {
        Self {
            phases: PhaseCatalog::canonical(),
            default_due_time: "23:59:00".to_owned(),
            due_utc_offset_minutes: 0,
            default_step_hours: "2".to_owned(),
            notifications: NotificationTemplates::default(),
        }
    }
}

/// Validated engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    catalog: PhaseCatalog,
    lock_policy: LockPolicy,
    default_step_effort: Effort,
    templates: NotificationTemplates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            catalog: PhaseCatalog::canonical(),
            lock_policy: LockPolicy::default(),
            default_step_effort: Effort::from_hours(2),
            templates: NotificationTemplates::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed TOML, unknown keys, an invalid
    /// catalog, time of day, offset, step estimate or template.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig = toml::from_str(content)?;
        Self::try_from(raw)
    }

    /// Reads and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// as [`EngineConfig::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source: Arc::new(source),
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads the file named by `PHASEGATE_CONFIG`, or the defaults when the
    /// variable is unset.
    ///
    /// # Errors
    ///
    /// As [`EngineConfig::load`], plus [`ConfigError::NonUtf8Path`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(|value| value.into_string().map_err(|_| ConfigError::NonUtf8Path))
            .transpose()?;
        Self::load_optional(path.as_deref().map(Utf8Path::new))
    }

    /// Loads `path` when given, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// As [`EngineConfig::load`].
    pub fn load_optional(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let Some(file) = path else {
            return Ok(Self::default());
        };
        let config = Self::load(file)?;
        tracing::debug!(path = %file, phases = config.catalog.phases().len(), "engine configuration loaded");
        Ok(config)
    }

    /// Returns the phase catalog.
    #[must_use]
    pub const fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    /// Returns the deadline interpretation.
    #[must_use]
    pub const fn lock_policy(&self) -> LockPolicy {
        self.lock_policy
    }

    /// Returns the estimate given to steps created without one.
    #[must_use]
    pub const fn default_step_effort(&self) -> Effort {
        self.default_step_effort
    }

    /// Returns the notification templates.
    #[must_use]
    pub const fn templates(&self) -> &NotificationTemplates {
        &self.templates
    }

    /// Replaces the deadline interpretation.
    #[must_use]
    pub const fn with_lock_policy(mut self, policy: LockPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    /// Replaces the phase catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: PhaseCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = ConfigError;

    fn try_from(raw: RawEngineConfig) -> Result<Self, Self::Error> {
        let due_time = parse_time_of_day(&raw.default_due_time)?;
        let offset = raw
            .due_utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::Offset(raw.due_utc_offset_minutes))?;
        let default_step_effort = Effort::parse_hours(&raw.default_step_hours)?;
        raw.notifications.check()?;

        Ok(Self {
            catalog: raw.phases,
            lock_policy: LockPolicy::new(due_time, offset),
            default_step_effort,
            templates: raw.notifications,
        })
    }
}
