//! `wds.yaml` project settings.
//!
//! ```yaml
//! systems: design/systems   # preset sources (default: systems)
//! output: public/presets    # compiled artifacts (default: presets)
//! transformer:
//!   command: tailwindcss --config {config} --input - --output - {minify}
//!   timeout_secs: 60
//! ```
//!
//! Every key is optional. Without a `transformer.command` the built-in
//! transformer is used. Command-line flags override file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use wds_preset::{CommandTransformer, CssTransformer, StylesheetTransformer};

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "wds.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub systems: PathBuf,
    pub output: PathBuf,
    pub transformer: TransformerSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformerSettings {
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            systems: PathBuf::from("systems"),
            output: PathBuf::from("presets"),
            transformer: TransformerSettings::default(),
        }
    }
}

/// Command-line values that take precedence over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub systems: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Loads settings from `path`, or from `wds.yaml` in the working
    /// directory when no path is given.
    ///
    /// An explicit path must exist; the implicit file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(SETTINGS_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(systems) = overrides.systems {
            self.systems = systems;
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(command) = overrides.command {
            self.transformer.command = Some(command);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.transformer.timeout_secs = Some(timeout);
        }
    }

    /// Builds the configured stylesheet transformer.
    pub fn transformer(&self) -> Box<dyn StylesheetTransformer> {
        match &self.transformer.command {
            Some(command) => {
                let mut transformer = CommandTransformer::new(command.clone());
                if let Some(secs) = self.transformer.timeout_secs {
                    transformer = transformer.with_timeout(Duration::from_secs(secs));
                }
                Box::new(transformer)
            }
            None => Box::new(CssTransformer::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::from_yaml("").unwrap();
        assert_eq!(settings.systems, PathBuf::from("systems"));
        assert_eq!(settings.output, PathBuf::from("presets"));
        assert_eq!(settings.transformer.command, None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_yaml("output: dist\ntransformer:\n  timeout_secs: 5\n").unwrap();
        assert_eq!(settings.systems, PathBuf::from("systems"));
        assert_eq!(settings.output, PathBuf::from("dist"));
        assert_eq!(settings.transformer.timeout_secs, Some(5));
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Settings::from_yaml("sytems: typo\n").is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut settings = Settings::from_yaml("systems: a\noutput: b\n").unwrap();
        settings.apply(Overrides {
            systems: Some(PathBuf::from("c")),
            command: Some("cat".to_string()),
            ..Overrides::default()
        });
        assert_eq!(settings.systems, PathBuf::from("c"));
        assert_eq!(settings.output, PathBuf::from("b"));
        assert_eq!(settings.transformer.command.as_deref(), Some("cat"));
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        assert!(Settings::load(Some(&dir.path().join("missing.yaml"))).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wds.yaml");
        std::fs::write(&path, "systems: design\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.systems, PathBuf::from("design"));
    }
}
