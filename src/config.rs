use crate::error::{Error, Result};
use crate::utils::normalize_base_url;
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const BASE_URL_ENV: &str = "CONTACT_BOOK_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "ContactBook")?;
        Some(proj.config_dir().join("config.toml"))
    }

    /// Settings from the default config file (or defaults), then the environment.
    pub fn load() -> Self {
        let env_override = std::env::var(BASE_URL_ENV).ok();
        match Self::config_path() {
            Some(path) => Self::load_at(&path, env_override),
            None => Self::default().with_override(env_override),
        }
    }

    /// Reads `path`, writing the defaults there on first run. The override is
    /// applied to the result only and never reaches the file.
    pub fn load_at(path: &Path, env_override: Option<String>) -> Self {
        let settings = if path.exists() {
            Self::load_from(path).unwrap_or_else(|e| {
                warn!("Ignoring {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            let defaults = Self::default();
            if let Err(e) = defaults.save_to(path) {
                warn!("Could not write {}: {}", path.display(), e);
            }
            defaults
        };
        settings.with_override(env_override)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let settings: Settings =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        Ok(settings.normalized())
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or_else(|| Error::Config("No config dir".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn with_override(self, base_url: Option<String>) -> Self {
        match base_url.filter(|url| !url.trim().is_empty()) {
            Some(base_url) => Self { base_url }.normalized(),
            None => self,
        }
    }

    fn normalized(self) -> Self {
        Self {
            base_url: normalize_base_url(&self.base_url),
        }
    }
}
