//! Preset and component definitions.
//!
//! A [`PresetDefinition`] is one design-system document. It is normally
//! loaded from YAML (JSON works too, being a subset):
//!
//! ```yaml
//! extends: [brand, base]
//! corePlugins: default
//!
//! devices: |
//!   phone:   640px
//!   tablet:  768px
//!   tall:    raw:(min-height: 800px)
//!
//! colors: |
//!   primary: #0af
//!   danger:  #e44
//!
//! radius: |
//!   DEFAULT: 0.25rem
//!   full:    9999px
//!
//! components:
//!   btn:
//!     apply: px-4 py-2 rounded
//!     parts:
//!       icon: w-4 h-4
//!     modifiers:
//!       primary: bg-primary
//!
//! styles: |
//!   body { margin: 0; }
//!
//! minify: true
//! ```
//!
//! Definitions can also be built in code with the `with_*` methods. The
//! engine treats a definition as read-only input; the only fields it fills
//! in are [`presets`](PresetDefinition::presets) and a normalized
//! [`core_plugins`](PresetDefinition::core_plugins).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dsl::ThemeSource;
use crate::error::{PresetError, Result};
use crate::plugins::PluginSpec;

/// The `extends` field: nothing, one preset name, or several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Extends {
    #[default]
    None,
    One(String),
    Many(Vec<String>),
}

impl Extends {
    /// The referenced preset names, in declared order.
    pub fn names(&self) -> &[String] {
        match self {
            Extends::None => &[],
            Extends::One(name) => std::slice::from_ref(name),
            Extends::Many(names) => names,
        }
    }

    pub fn is_none(&self) -> bool {
        self.names().is_empty()
    }
}

impl From<&str> for Extends {
    fn from(name: &str) -> Self {
        Extends::One(name.to_string())
    }
}

impl<const N: usize> From<[&str; N]> for Extends {
    fn from(names: [&str; N]) -> Self {
        Extends::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for Extends {
    fn from(names: Vec<String>) -> Self {
        Extends::Many(names)
    }
}

/// A reusable style unit: a base rule plus part, modifier and variant rules.
///
/// Every value is a whitespace-separated list of utility classes. For a
/// component named `btn`:
///
/// | Field       | Selector         |
/// |-------------|------------------|
/// | `apply`     | `.btn`           |
/// | `parts`     | `.btn__<part>`   |
/// | `modifiers` | `.btn--<name>`   |
/// | `variants`  | `.btn-<name>`    |
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ComponentDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parts: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub modifiers: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variants: IndexMap<String, String>,
}

impl ComponentDefinition {
    /// Creates a component applying the given utility classes.
    pub fn new(apply: impl Into<String>) -> Self {
        Self {
            apply: Some(apply.into()),
            ..Self::default()
        }
    }

    pub fn part(mut self, name: impl Into<String>, classes: impl Into<String>) -> Self {
        self.parts.insert(name.into(), classes.into());
        self
    }

    pub fn modifier(mut self, name: impl Into<String>, classes: impl Into<String>) -> Self {
        self.modifiers.insert(name.into(), classes.into());
        self
    }

    pub fn variant(mut self, name: impl Into<String>, classes: impl Into<String>) -> Self {
        self.variants.insert(name.into(), classes.into());
        self
    }
}

/// One design-system definition, possibly extending others.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetDefinition {
    /// Preset name; set from the store key when loaded by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Extends::is_none")]
    pub extends: Extends,

    #[serde(default, alias = "plugins", skip_serializing_if = "Option::is_none")]
    pub core_plugins: Option<PluginSpec>,

    /// Breakpoints: name to width, or `raw:<media query>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<ThemeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<ThemeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<ThemeSource>,

    #[serde(default, alias = "radius", skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<ThemeSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<ThemeSource>,

    /// Free-form theme extensions, passed through to `theme.extend`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extend: IndexMap<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub components: IndexMap<String, ComponentDefinition>,

    /// Stylesheet text appended verbatim after the component layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<String>,

    #[serde(default)]
    pub minify: bool,

    #[serde(default)]
    pub resolve: bool,

    /// Resolved ancestor chain, base first. Filled in by compilation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub presets: Vec<PresetDefinition>,
}

impl PresetDefinition {
    /// Creates an empty, unnamed definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty definition with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parses a definition from YAML (or JSON) text.
    ///
    /// An empty document is an empty definition.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Parse`] if the document is not a valid definition.
    ///
    /// # Example
    ///
    /// ```rust
    /// use wds_preset::PresetDefinition;
    ///
    /// let preset = PresetDefinition::from_yaml(r#"
    /// extends: base
    /// colors: |
    ///   primary: #0af
    /// "#).unwrap();
    /// assert_eq!(preset.extends.names(), ["base"]);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| PresetError::parse(e.to_string()))
    }

    /// Sets the name, returning `self` for chaining.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The name, or `"<anonymous>"` for definitions submitted inline.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn extending(mut self, extends: impl Into<Extends>) -> Self {
        self.extends = extends.into();
        self
    }

    pub fn with_plugins(mut self, plugins: PluginSpec) -> Self {
        self.core_plugins = Some(plugins);
        self
    }

    pub fn with_devices(mut self, devices: impl Into<ThemeSource>) -> Self {
        self.devices = Some(devices.into());
        self
    }

    pub fn with_colors(mut self, colors: impl Into<ThemeSource>) -> Self {
        self.colors = Some(colors.into());
        self
    }

    pub fn with_spacing(mut self, spacing: impl Into<ThemeSource>) -> Self {
        self.spacing = Some(spacing.into());
        self
    }

    pub fn with_border_radius(mut self, radius: impl Into<ThemeSource>) -> Self {
        self.border_radius = Some(radius.into());
        self
    }

    pub fn with_sizes(mut self, sizes: impl Into<ThemeSource>) -> Self {
        self.sizes = Some(sizes.into());
        self
    }

    pub fn with_extend(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extend.insert(key.into(), value);
        self
    }

    pub fn with_component(mut self, name: impl Into<String>, component: ComponentDefinition) -> Self {
        self.components.insert(name.into(), component);
        self
    }

    pub fn with_styles(mut self, styles: impl Into<String>) -> Self {
        self.styles = Some(styles.into());
        self
    }

    pub fn minified(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn resolved(mut self, resolve: bool) -> Self {
        self.resolve = resolve;
        self
    }
}
