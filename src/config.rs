//! Embargo engine configuration management

use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main embargo engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbargoConfig {
    /// Permission token that bypasses every embargo
    #[serde(default = "default_bypass_permission")]
    pub bypass_permission: String,

    /// Group membership configuration
    #[serde(default)]
    pub groups: GroupConfig,

    /// Ownership graph configuration
    #[serde(default)]
    pub graph: GraphConfig,

    /// Message composition configuration
    #[serde(default)]
    pub messages: MessageConfig,
}

impl Default for EmbargoConfig {
    fn default() -> Self {
        Self {
            bypass_permission: default_bypass_permission(),
            groups: GroupConfig::default(),
            graph: GraphConfig::default(),
            messages: MessageConfig::default(),
        }
    }
}

fn default_bypass_permission() -> String {
    "bypass embargoes restrictions".to_string()
}

/// Group membership configuration
///
/// When disabled, group roles never exempt anyone, exactly as if no
/// group membership service were wired in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Consult group roles at all
    pub enabled: bool,

    /// Role tag of group administrators
    pub administrator_role: String,

    /// Role tag of group editors
    pub editor_role: String,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            administrator_role: "project_group-administrator".to_string(),
            editor_role: "project_group-editor".to_string(),
        }
    }
}

/// Ownership graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Only node reference fields with this name prefix are searched
    /// when locating the nodes that reference a media item
    pub reference_field_prefix: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reference_field_prefix: "field_".to_string(),
        }
    }
}

/// Message composition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// `chrono` format string for expiration dates
    pub date_format: String,

    /// Prefix of each detail line
    pub bullet: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            bullet: String::new(),
        }
    }
}

impl EmbargoConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else the default location if it exists,
    /// else built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Default config location (~/.embargoes/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".embargoes").join("config.toml"))
    }

    /// Reject configurations that would silently disable checks
    pub fn validate(&self) -> Result<()> {
        if self.bypass_permission.trim().is_empty() {
            return Err(Error::Config("bypass_permission must not be empty".into()));
        }
        if self.groups.enabled
            && (self.groups.administrator_role.trim().is_empty()
                || self.groups.editor_role.trim().is_empty())
        {
            return Err(Error::Config(
                "group roles must be named when groups are enabled".into(),
            ));
        }
        if self.messages.date_format.trim().is_empty() {
            return Err(Error::Config("messages.date_format must not be empty".into()));
        }
        if StrftimeItems::new(&self.messages.date_format)
            .any(|item| matches!(item, Item::Error))
        {
            return Err(Error::Config(format!(
                "messages.date_format is not a valid format string: {}",
                self.messages.date_format
            )));
        }
        Ok(())
    }
}
