use crate::errors::{StackError, Result};
use crate::git::GitRepository;
use serde::{Deserialize, Serialize};

/// Configuration section all tool settings live under
pub const SETTINGS_SECTION: &str = "patchstack";

/// Longest patch name the tool will ever generate
pub const MAX_NAME_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Initialize a stack on branches created with `branch --create`
    pub autoinit: bool,
    /// Maximum length of patch names generated from messages
    pub name_length: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            autoinit: true,
            name_length: 30,
        }
    }
}

impl Settings {
    /// Load settings from the repository's git configuration, falling back to defaults
    pub fn load(repo: &GitRepository) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(autoinit) = repo.config_get_bool(&Self::key("autoinit"))? {
            settings.autoinit = autoinit;
        }

        if let Some(length) = repo.config_get_i64(&Self::key("namelength"))? {
            settings.name_length = usize::try_from(length).map_err(|_| {
                StackError::config(format!("Invalid {}: {}", Self::key("namelength"), length))
            })?;
        }

        settings.validate()?;
        tracing::debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Fully qualified configuration key for a setting
    pub fn key(name: &str) -> String {
        format!("{SETTINGS_SECTION}.{name}")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.name_length == 0 || self.name_length > MAX_NAME_LENGTH {
            return Err(StackError::config(format!(
                "{} must be between 1 and {}",
                Self::key("namelength"),
                MAX_NAME_LENGTH
            )));
        }

        Ok(())
    }
}
