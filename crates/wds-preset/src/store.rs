//! Preset sources.
//!
//! The engine loads named ancestors through the [`PresetStore`] trait and
//! never touches the filesystem itself. [`PresetRegistry`] is the store
//! shipped with the crate: inline definitions plus any number of source
//! directories.
//!
//! # Resolution
//!
//! 1. **Inline presets** (added via [`PresetRegistry::add_inline`] or
//!    [`PresetRegistry::add_definition`]) have highest priority
//! 2. **File presets** are searched in directory registration order (first
//!    directory wins)
//! 3. Names can be given with or without extension: both `"brand"` and
//!    `"brand.yml"` resolve
//!
//! # Supported Extensions
//!
//! | Priority | Extension | Description |
//! |----------|-----------|-------------|
//! | 1 (highest) | `.yaml` | Standard YAML extension |
//! | 2 | `.yml` | Short YAML extension |
//! | 3 (lowest) | `.json` | JSON documents |
//!
//! Runs of dots in a requested name collapse to a single dot and leading
//! slashes are dropped, so a name always stays inside a source directory.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PresetError, Result};
use crate::preset::PresetDefinition;

/// Recognized preset file extensions in priority order.
pub const PRESET_EXTENSIONS: &[&str] = &[".yaml", ".yml", ".json"];

/// Extension used when saving a preset source.
const SAVE_EXTENSION: &str = ".yml";

/// Looks up preset definitions by name.
///
/// Implementations return `Ok(None)` for an unknown name; the chain
/// resolver treats a missing ancestor as an optional extension and skips
/// it. `Err` is reserved for sources that exist but cannot be read or
/// parsed.
#[async_trait]
pub trait PresetStore: Send + Sync {
    async fn load_preset(&self, name: &str) -> Result<Option<PresetDefinition>>;
}

#[async_trait]
impl<T: PresetStore + ?Sized> PresetStore for Arc<T> {
    async fn load_preset(&self, name: &str) -> Result<Option<PresetDefinition>> {
        (**self).load_preset(name).await
    }
}

#[async_trait]
impl<T: PresetStore + ?Sized> PresetStore for &T {
    async fn load_preset(&self, name: &str) -> Result<Option<PresetDefinition>> {
        (**self).load_preset(name).await
    }
}

/// Registry of preset definitions from inline sources and directories.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = PresetRegistry::new();
/// registry.add_inline("base", "colors: |\n  primary: #0af")?;
/// registry.add_dir("./systems")?;
///
/// let preset = registry.get("brand").await?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct PresetRegistry {
    inline: HashMap<String, PresetDefinition>,
    dirs: Vec<PathBuf>,
}

impl PresetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inline preset from YAML text.
    ///
    /// Inline presets shadow file presets with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid definition.
    pub fn add_inline(&mut self, name: impl Into<String>, yaml: &str) -> Result<()> {
        let name = name.into();
        let preset = PresetDefinition::from_yaml(yaml)?.with_name(name.clone());
        self.inline.insert(name, preset);
        Ok(())
    }

    /// Adds an already-built definition.
    pub fn add_definition(&mut self, name: impl Into<String>, preset: PresetDefinition) {
        let name = name.into();
        self.inline.insert(name.clone(), preset.with_name(name));
    }

    /// Adds a directory to search for preset files.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a directory.
    pub fn add_dir<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(PresetError::load(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        self.dirs.push(path.to_path_buf());
        Ok(())
    }

    /// Gets a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::NotFound`] if no source has the name, or a
    /// parse/load error if the source exists but is invalid.
    pub async fn get(&self, name: &str) -> Result<PresetDefinition> {
        self.load_preset(name)
            .await?
            .ok_or_else(|| PresetError::NotFound {
                name: name.to_string(),
            })
    }

    /// Checks whether a preset exists, without loading it.
    pub fn contains(&self, name: &str) -> bool {
        self.inline.contains_key(name) || self.find_file(name).is_some()
    }

    /// Locates the file backing `name`, honoring directory order and
    /// extension priority.
    pub fn find_file(&self, name: &str) -> Option<PathBuf> {
        let name = sanitize_name(name);
        let has_extension = PRESET_EXTENSIONS.iter().any(|ext| name.ends_with(ext));

        for dir in &self.dirs {
            if has_extension {
                let path = dir.join(&name);
                if path.is_file() {
                    return Some(path);
                }
                continue;
            }
            for ext in PRESET_EXTENSIONS {
                let path = dir.join(format!("{}{}", name, ext));
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    /// Lists every known preset name (without extension), sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a registered directory cannot be read.
    pub async fn names(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = self.inline.keys().cloned().collect();

        for dir in &self.dirs {
            let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
                PresetError::load(format!("failed to read {}: {}", dir.display(), e))
            })?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| PresetError::load(e.to_string()))?
            {
                let file_name = entry.file_name();
                let Some(file_name) = file_name.to_str() else {
                    continue;
                };
                if let Some(base) = strip_extension(file_name) {
                    names.insert(base.to_string());
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Saves a preset source into the first registered directory.
    ///
    /// The text is validated before anything is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid definition, if no
    /// directory is registered, or if the write fails.
    pub async fn save(&self, name: &str, source: &str) -> Result<PathBuf> {
        PresetDefinition::from_yaml(source)?;

        let dir = self
            .dirs
            .first()
            .ok_or_else(|| PresetError::load("no preset directory registered"))?;
        let name = sanitize_name(name);
        let path = dir.join(format!("{}{}", name, SAVE_EXTENSION));

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PresetError::load(e.to_string()))?;
        }
        tokio::fs::write(&path, source).await.map_err(|e| {
            PresetError::load(format!("failed to write {}: {}", path.display(), e))
        })?;

        debug!(preset = %name, path = %path.display(), "saved preset source");
        Ok(path)
    }

    async fn load_file(path: &Path, name: &str) -> Result<PresetDefinition> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PresetError::load(format!("failed to read {}: {}", path.display(), e))
        })?;

        let preset = PresetDefinition::from_yaml(&content).map_err(|e| match e {
            PresetError::Parse { message, .. } => PresetError::Parse {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;

        let base = strip_extension(name).unwrap_or(name);
        Ok(preset.with_name(base))
    }
}

#[async_trait]
impl PresetStore for PresetRegistry {
    async fn load_preset(&self, name: &str) -> Result<Option<PresetDefinition>> {
        if let Some(preset) = self.inline.get(name) {
            return Ok(Some(preset.clone()));
        }

        match self.find_file(name) {
            Some(path) => {
                debug!(preset = %name, path = %path.display(), "loading preset file");
                let sanitized = sanitize_name(name);
                Self::load_file(&path, &sanitized).await.map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Collapses runs of two or more dots into one and drops leading slashes.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut previous_dot = false;
    for c in name.trim_start_matches('/').chars() {
        if c == '.' {
            if !previous_dot {
                out.push(c);
            }
            previous_dot = true;
        } else {
            out.push(c);
            previous_dot = false;
        }
    }
    out
}

/// Strips a recognized preset extension, if any.
fn strip_extension(name: &str) -> Option<&str> {
    PRESET_EXTENSIONS
        .iter()
        .find_map(|ext| name.strip_suffix(ext))
}
