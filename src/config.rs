//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/taxon/taxon.toml`
//! 3. Local config: `<dir>/.taxon.toml` (catalog directory or cwd)
//! 4. Environment variables: `TAXON_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{BuildPolicy, FieldNames};

/// Raw field names for intermediate parsing (`None` means "inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawFieldNames {
    pub id: Option<String>,
    pub parent: Option<String>,
    pub label: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub policy: Option<BuildPolicy>,
    pub fields: RawFieldNames,
    pub catalog_dir: Option<PathBuf>,
    pub base_path: Option<String>,
}

/// Unified configuration for taxon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Treatment of dangling and cyclic parent references
    pub policy: BuildPolicy,
    /// Record fields holding id, parent id and label
    pub fields: FieldNames,
    /// Offline catalog mirror (default: cwd)
    pub catalog_dir: Option<PathBuf>,
    /// Prefix of every catalog resource path
    pub base_path: String,
}

/// Get the XDG config directory for taxon.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "taxon").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("taxon.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".taxon.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

fn parse_policy(value: &str) -> Result<BuildPolicy, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "lenient" => Ok(BuildPolicy::Lenient),
        "strict" => Ok(BuildPolicy::Strict),
        other => Err(ApplicationError::Config {
            message: format!("unknown policy '{}', expected 'lenient' or 'strict'", other),
        }),
    }
}

impl Settings {
    /// Directory of the catalog mirror, falling back to `fallback`.
    pub fn catalog_dir_or(&self, fallback: &Path) -> PathBuf {
        self.catalog_dir
            .clone()
            .unwrap_or_else(|| fallback.to_path_buf())
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            policy: overlay.policy.unwrap_or(self.policy),
            fields: FieldNames {
                id: overlay
                    .fields
                    .id
                    .clone()
                    .unwrap_or_else(|| self.fields.id.clone()),
                parent: overlay
                    .fields
                    .parent
                    .clone()
                    .unwrap_or_else(|| self.fields.parent.clone()),
                label: overlay
                    .fields
                    .label
                    .clone()
                    .unwrap_or_else(|| self.fields.label.clone()),
            },
            catalog_dir: overlay
                .catalog_dir
                .clone()
                .or_else(|| self.catalog_dir.clone()),
            base_path: overlay
                .base_path
                .clone()
                .unwrap_or_else(|| self.base_path.clone()),
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(dir) = &self.catalog_dir {
            let raw = dir.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            self.catalog_dir = Some(PathBuf::from(expanded));
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.taxon.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load only a given file on top of the defaults, without global config
    /// or environment variables.
    pub fn load_file(path: &Path) -> Result<Self, ApplicationError> {
        let mut settings = Self::default().merge_with(&load_raw_settings(path)?);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply TAXON_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TAXON").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("policy") {
            settings.policy = parse_policy(&val)?;
        }
        if let Ok(val) = config.get_string("catalog_dir") {
            settings.catalog_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get_string("base_path") {
            settings.base_path = val;
        }
        if let Ok(val) = config.get_string("fields.id") {
            settings.fields.id = val;
        }
        if let Ok(val) = config.get_string("fields.parent") {
            settings.fields.parent = val;
        }
        if let Ok(val) = config.get_string("fields.label") {
            settings.fields.label = val;
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_unset_fields_inherit() {
        let base = Settings::default();
        let overlay: RawSettings = toml::from_str(
            r#"
policy = "strict"
[fields]
parent = "parentCode"
"#,
        )
        .unwrap();

        let merged = base.merge_with(&overlay);
        assert_eq!(merged.policy, BuildPolicy::Strict);
        assert_eq!(merged.fields.parent, "parentCode");
        assert_eq!(merged.fields.id, "id");
        assert_eq!(merged.base_path, "");
        assert_eq!(merged.catalog_dir, None);
    }

    #[test]
    fn given_policy_strings_when_parsing_then_case_insensitive() {
        assert_eq!(parse_policy("STRICT").unwrap(), BuildPolicy::Strict);
        assert_eq!(parse_policy(" lenient ").unwrap(), BuildPolicy::Lenient);
        assert!(parse_policy("loose").is_err());
    }
}
