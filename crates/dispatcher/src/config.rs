//! Dispatcher configuration
//!
//! Precedence: env vars > config file > defaults. Every section and field is
//! optional; an empty file yields the defaults.
//!
//! ```toml
//! [dispatch]
//! locale = "en-US"
//! role = "default"
//! requote_policy = "degrade"
//!
//! [recovery]
//! rate_limit_default_minutes = 15
//! permission_lock_minutes = 1440
//!
//! [probe]
//! reference_templates = [
//!     "https://x.com/i/status/{id}",
//!     "https://twitter.com/i/web/status/{id}",
//! ]
//! ```

use std::path::Path;

use account_pool::DEFAULT_ROLE;
use serde::Deserialize;

use crate::probe::{DEFAULT_REFERENCE_TEMPLATES, ID_PLACEHOLDER};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub dispatch: DispatchConfig,
    pub recovery: RecoveryConfig,
    pub probe: ProbeConfig,
}

/// Session and leasing settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Locale every session is constructed with
    pub locale: String,
    /// Pool role credentials are leased under
    pub role: String,
    pub requote_policy: RequotePolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            role: DEFAULT_ROLE.to_string(),
            requote_policy: RequotePolicy::default(),
        }
    }
}

/// What a bare requote returns when the acknowledgement lacks the post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequotePolicy {
    /// Synthesize a minimal degraded descriptor without another remote call
    #[default]
    Degrade,
    /// Fetch the target post, falling back to the degraded descriptor
    Enrich,
}

/// Lock durations applied by recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Rate-limit lock when the fault carries no reset time
    pub rate_limit_default_minutes: u64,
    /// Lock on the `<queue>_ops` bucket after a permission denial
    pub permission_lock_minutes: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            rate_limit_default_minutes: 15,
            permission_lock_minutes: 1440,
        }
    }
}

/// Quote-reference probing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// URL templates tried in order; `{id}` is replaced by the target id
    pub reference_templates: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            reference_templates: DEFAULT_REFERENCE_TEMPLATES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// `DISPATCHER_ROLE` overrides `dispatch.role`.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: DispatcherConfig = toml::from_str(&contents)?;

        if let Ok(role) = std::env::var("DISPATCHER_ROLE") {
            config.dispatch.role = role;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string, without env overlay.
    pub fn from_toml_str(contents: &str) -> common::Result<Self> {
        let config: DispatcherConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> common::Result<()> {
        if self.dispatch.locale.trim().is_empty() {
            return Err(common::Error::invalid("dispatch.locale", "must not be empty"));
        }

        if self.dispatch.role.trim().is_empty() {
            return Err(common::Error::invalid("dispatch.role", "must not be empty"));
        }

        if self.recovery.rate_limit_default_minutes == 0 {
            return Err(common::Error::invalid(
                "recovery.rate_limit_default_minutes",
                "must be greater than 0",
            ));
        }

        if self.recovery.permission_lock_minutes == 0 {
            return Err(common::Error::invalid(
                "recovery.permission_lock_minutes",
                "must be greater than 0",
            ));
        }

        if self.probe.reference_templates.is_empty() {
            return Err(common::Error::invalid(
                "probe.reference_templates",
                "must contain at least one template",
            ));
        }

        if let Some(bad) = self
            .probe
            .reference_templates
            .iter()
            .find(|t| !t.contains(ID_PLACEHOLDER))
        {
            return Err(common::Error::invalid(
                "probe.reference_templates",
                format!("entry must contain {ID_PLACEHOLDER}, got: {bad}"),
            ));
        }

        Ok(())
    }
}
