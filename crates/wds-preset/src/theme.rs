//! Merging theme fragments and plugin lists across a resolved chain.
//!
//! [`merge`] folds every definition of a chain (ancestors first, the
//! requested preset last) into one [`MergedConfiguration`], the document
//! handed to the stylesheet transformer:
//!
//! ```json
//! {
//!   "corePlugins": ["preflight", "container"],
//!   "theme": {
//!     "screens": { "portrait": { "raw": "(orientation: portrait)" }, "phone": "640px" },
//!     "colors": { "transparent": "transparent", "current": "currentColor", "primary": "#0af" }
//!   },
//!   "minify": false,
//!   "resolve": false
//! }
//! ```
//!
//! Each fragment is a shallow merge: for a given key the most derived
//! definition wins, while the key keeps the position where it first
//! appeared.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dsl::{self, ThemeSource, Tokens, DEFAULT_KEY, SHADE_SEPARATOR};
use crate::error::Result;
use crate::plugins::{dedup_first, resolve_plugins, DEFAULT_PLUGINS};
use crate::preset::PresetDefinition;

const RAW_PREFIX: &str = "raw:";

const SYNTHETIC_SCREENS: [(&str, &str); 2] = [
    ("portrait", "(orientation: portrait)"),
    ("landscape", "(orientation: landscape)"),
];

const SYNTHETIC_COLORS: [(&str, &str); 2] = [("transparent", "transparent"), ("current", "currentColor")];

/// A breakpoint: a plain min-width, or a raw media query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ScreenValue {
    Width(String),
    Raw { raw: String },
}

impl ScreenValue {
    /// Reads a device value, where `raw:<query>` is a raw media query.
    pub fn parse(value: &str) -> Self {
        match value.strip_prefix(RAW_PREFIX) {
            Some(query) => ScreenValue::Raw {
                raw: query.trim().to_string(),
            },
            None => ScreenValue::Width(value.to_string()),
        }
    }
}

/// A color: a single value, or a `DEFAULT` value plus named shades.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ColorValue {
    Plain(String),
    Shades(IndexMap<String, String>),
}

/// The `theme` section of a merged configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<IndexMap<String, ScreenValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<IndexMap<String, ColorValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Tokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<Tokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Tokens>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub extend: IndexMap<String, serde_json::Value>,
}

impl ThemeConfig {
    /// Returns `base` with every value of `self` laid over it.
    ///
    /// Used for full resolution: the transformer's defaults fill in every
    /// key this theme does not override.
    pub fn expand_with(&self, base: &ThemeConfig) -> ThemeConfig {
        ThemeConfig {
            screens: overlay(base.screens.as_ref(), self.screens.as_ref()),
            colors: overlay(base.colors.as_ref(), self.colors.as_ref()),
            spacing: overlay(base.spacing.as_ref(), self.spacing.as_ref()),
            border_radius: overlay(base.border_radius.as_ref(), self.border_radius.as_ref()),
            sizes: overlay(base.sizes.as_ref(), self.sizes.as_ref()),
            extend: overlay(Some(&base.extend), Some(&self.extend)).unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &ThemeConfig::default()
    }
}

fn overlay<V: Clone>(
    base: Option<&IndexMap<String, V>>,
    over: Option<&IndexMap<String, V>>,
) -> Option<IndexMap<String, V>> {
    match (base, over) {
        (None, None) => None,
        (Some(base), None) => Some(base.clone()),
        (None, Some(over)) => Some(over.clone()),
        (Some(base), Some(over)) => {
            let mut merged = base.clone();
            merged.extend(over.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
    }
}

/// The document handed to the stylesheet transformer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedConfiguration {
    pub core_plugins: Vec<String>,
    pub theme: ThemeConfig,
    pub minify: bool,
    pub resolve: bool,
}

impl MergedConfiguration {
    /// Canonical pretty-printed JSON text of this configuration.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Merged raw token values, exported alongside the stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DesignTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Tokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Tokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<Tokens>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<Tokens>,
}

impl DesignTokens {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Every theme fragment folded across a chain, still as raw tokens.
#[derive(Debug, Default)]
struct Fragments {
    devices: Option<Tokens>,
    colors: Option<Tokens>,
    spacing: Option<Tokens>,
    border_radius: Option<Tokens>,
    sizes: Option<Tokens>,
    extend: IndexMap<String, serde_json::Value>,
}

impl Fragments {
    fn fold<'a>(presets: impl Iterator<Item = &'a PresetDefinition>) -> Result<Self> {
        let mut fragments = Fragments::default();
        for preset in presets {
            fold_source(&mut fragments.devices, preset.devices.as_ref())?;
            fold_source(&mut fragments.colors, preset.colors.as_ref())?;
            fold_source(&mut fragments.spacing, preset.spacing.as_ref())?;
            fold_source(&mut fragments.border_radius, preset.border_radius.as_ref())?;
            fold_source(&mut fragments.sizes, preset.sizes.as_ref())?;
            for (key, value) in &preset.extend {
                fragments.extend.insert(key.clone(), value.clone());
            }
        }
        Ok(fragments)
    }
}

fn fold_source(acc: &mut Option<Tokens>, source: Option<&ThemeSource>) -> Result<()> {
    if let Some(tokens) = dsl::parse(source)? {
        acc.get_or_insert_with(Tokens::new).extend(tokens);
    }
    Ok(())
}

/// Merges a chain and its requested preset into one configuration.
///
/// `chain` holds the ancestors, most basal first; `preset` is the requested
/// definition. Later definitions win per key.
///
/// Plugins are concatenated across the chain and deduplicated, first
/// occurrence kept. If no definition declares `corePlugins` at all, the
/// default plugin set is used.
///
/// `minify` and `resolve` are taken from `preset` alone.
///
/// # Errors
///
/// Returns [`PresetError::MalformedDsl`](crate::PresetError::MalformedDsl)
/// if any fragment text is malformed.
///
/// # Example
///
/// ```rust
/// use wds_preset::theme::{merge, ColorValue};
/// use wds_preset::PresetDefinition;
///
/// let base = PresetDefinition::named("base").with_colors("primary: #111\naccent: #333");
/// let app = PresetDefinition::named("app").with_colors("accent: #444");
///
/// let config = merge(&[base], &app).unwrap();
/// let colors = config.theme.colors.unwrap();
/// assert_eq!(colors["accent"], ColorValue::Plain("#444".into()));
/// assert_eq!(colors["transparent"], ColorValue::Plain("transparent".into()));
/// ```
pub fn merge(chain: &[PresetDefinition], preset: &PresetDefinition) -> Result<MergedConfiguration> {
    let entries = || chain.iter().chain(std::iter::once(preset));
    let fragments = Fragments::fold(entries())?;

    let core_plugins = if entries().all(|p| p.core_plugins.is_none()) {
        DEFAULT_PLUGINS.iter().map(|p| p.to_string()).collect()
    } else {
        dedup_first(entries().flat_map(|p| resolve_plugins(p.core_plugins.as_ref())))
    };

    let theme = ThemeConfig {
        screens: fragments.devices.as_ref().map(screens),
        colors: fragments.colors.as_ref().map(colors),
        spacing: fragments.spacing,
        border_radius: fragments.border_radius,
        sizes: fragments.sizes,
        extend: fragments.extend,
    };

    Ok(MergedConfiguration {
        core_plugins,
        theme,
        minify: preset.minify,
        resolve: preset.resolve,
    })
}

/// Merges the raw token values of a chain, for export.
///
/// Values are the folded DSL entries, without synthetic entries or any
/// screen and shade conversion.
pub fn design_tokens(chain: &[PresetDefinition], preset: &PresetDefinition) -> Result<DesignTokens> {
    let fragments = Fragments::fold(chain.iter().chain(std::iter::once(preset)))?;
    Ok(DesignTokens {
        sizes: fragments.sizes,
        colors: fragments.colors,
        spacing: fragments.spacing,
        devices: fragments.devices,
    })
}

fn screens(devices: &Tokens) -> IndexMap<String, ScreenValue> {
    let mut screens: IndexMap<String, ScreenValue> = SYNTHETIC_SCREENS
        .iter()
        .map(|(name, query)| {
            (
                name.to_string(),
                ScreenValue::Raw {
                    raw: query.to_string(),
                },
            )
        })
        .collect();
    for (name, value) in devices {
        screens.insert(name.clone(), ScreenValue::parse(value));
    }
    screens
}

/// Groups `name.shade` keys under their base color.
fn colors(tokens: &Tokens) -> IndexMap<String, ColorValue> {
    let mut grouped: IndexMap<String, IndexMap<String, String>> = SYNTHETIC_COLORS
        .iter()
        .map(|(name, value)| {
            let mut shades = IndexMap::new();
            shades.insert(DEFAULT_KEY.to_string(), value.to_string());
            (name.to_string(), shades)
        })
        .collect();

    for (key, value) in tokens {
        let (name, shade) = match key.split_once(SHADE_SEPARATOR) {
            Some((name, shade)) if !name.is_empty() && !shade.is_empty() => (name, shade),
            _ => (key.as_str(), DEFAULT_KEY),
        };
        grouped
            .entry(name.to_string())
            .or_default()
            .insert(shade.to_string(), value.clone());
    }

    grouped
        .into_iter()
        .map(|(name, mut shades)| {
            let value = if shades.len() == 1 && shades.contains_key(DEFAULT_KEY) {
                ColorValue::Plain(shades.swap_remove(DEFAULT_KEY).unwrap_or_default())
            } else {
                ColorValue::Shades(shades)
            };
            (name, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::PluginSpec;
    use serde_json::json;

    fn plain(value: &str) -> ColorValue {
        ColorValue::Plain(value.to_string())
    }

    #[test]
    fn test_merge_color_precedence() {
        let c = PresetDefinition::named("c").with_colors("primary: #111");
        let b = PresetDefinition::named("b").with_colors("primary: #222\naccent: #333");
        let a = PresetDefinition::named("a").with_colors("accent: #444");

        let config = merge(&[c, b], &a).unwrap();
        let colors = config.theme.colors.unwrap();
        let entries: Vec<(&str, &ColorValue)> =
            colors.iter().map(|(k, v)| (k.as_str(), v)).collect();
        assert_eq!(
            entries,
            vec![
                ("transparent", &plain("transparent")),
                ("current", &plain("currentColor")),
                ("primary", &plain("#222")),
                ("accent", &plain("#444")),
            ]
        );
    }

    #[test]
    fn test_merge_synthetic_color_overridable() {
        let a = PresetDefinition::named("a").with_colors("current: red");
        let colors = merge(&[], &a).unwrap().theme.colors.unwrap();
        assert_eq!(colors.get_index(1), Some((&"current".to_string(), &plain("red"))));
    }

    #[test]
    fn test_merge_without_fragments_omits_them() {
        let config = merge(&[], &PresetDefinition::named("a")).unwrap();
        assert!(config.theme.is_empty());
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["theme"], json!({}));
    }

    #[test]
    fn test_merge_screens() {
        let a = PresetDefinition::named("a")
            .with_devices("phone: 640px\ntall: raw:(min-height: 800px)\nportrait: 300px");
        let screens = merge(&[], &a).unwrap().theme.screens.unwrap();

        let keys: Vec<&str> = screens.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["portrait", "landscape", "phone", "tall"]);
        assert_eq!(screens["portrait"], ScreenValue::Width("300px".into()));
        assert_eq!(
            screens["landscape"],
            ScreenValue::Raw {
                raw: "(orientation: landscape)".into()
            }
        );
        assert_eq!(screens["phone"], ScreenValue::Width("640px".into()));
        assert_eq!(
            screens["tall"],
            ScreenValue::Raw {
                raw: "(min-height: 800px)".into()
            }
        );
    }

    #[test]
    fn test_merge_color_shades() {
        let base = PresetDefinition::named("base").with_colors("primary: #0af\nprimary.light: #6cf");
        let app = PresetDefinition::named("app").with_colors("primary.dark: #058");
        let colors = merge(&[base], &app).unwrap().theme.colors.unwrap();

        let value = serde_json::to_value(&colors["primary"]).unwrap();
        assert_eq!(value, json!({ "DEFAULT": "#0af", "light": "#6cf", "dark": "#058" }));
    }

    #[test]
    fn test_merge_plugins_first_seen() {
        let base = PresetDefinition::named("base")
            .with_plugins(["preflight", "container"].into_iter().collect());
        let app = PresetDefinition::named("app")
            .with_plugins(["container", "gridRow*"].into_iter().collect());
        let config = merge(&[base], &app).unwrap();
        assert_eq!(
            config.core_plugins,
            vec!["preflight", "container", "gridRow", "gridRowStart", "gridRowEnd"]
        );
    }

    #[test]
    fn test_merge_plugins_default_when_undeclared() {
        let config = merge(&[PresetDefinition::named("base")], &PresetDefinition::named("a")).unwrap();
        assert_eq!(config.core_plugins.len(), DEFAULT_PLUGINS.len());
    }

    #[test]
    fn test_merge_plugins_explicit_none_is_empty() {
        let a = PresetDefinition::named("a").with_plugins(PluginSpec::None);
        assert!(merge(&[], &a).unwrap().core_plugins.is_empty());
    }

    #[test]
    fn test_merge_flags_from_requested_only() {
        let base = PresetDefinition::named("base").minified(true).resolved(true);
        let config = merge(&[base], &PresetDefinition::named("a")).unwrap();
        assert!(!config.minify);
        assert!(!config.resolve);
    }

    #[test]
    fn test_merge_extend_shallow() {
        let base = PresetDefinition::named("base")
            .with_extend("fontFamily", json!({ "sans": ["Inter"] }))
            .with_extend("zIndex", json!({ "modal": "50" }));
        let app = PresetDefinition::named("app").with_extend("fontFamily", json!({ "mono": ["Fira"] }));
        let extend = merge(&[base], &app).unwrap().theme.extend;
        assert_eq!(extend["fontFamily"], json!({ "mono": ["Fira"] }));
        assert_eq!(extend["zIndex"], json!({ "modal": "50" }));
    }

    #[test]
    fn test_merge_propagates_malformed_dsl() {
        let a = PresetDefinition::named("a").with_spacing("sm 1px");
        assert!(merge(&[], &a).is_err());
    }

    #[test]
    fn test_merged_json_field_names() {
        let a = PresetDefinition::named("a")
            .with_border_radius("full: 9999px")
            .with_plugins(PluginSpec::None);
        let value = serde_json::to_value(merge(&[], &a).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "corePlugins": [],
                "theme": { "borderRadius": { "full": "9999px" } },
                "minify": false,
                "resolve": false
            })
        );
    }

    #[test]
    fn test_design_tokens_are_raw() {
        let base = PresetDefinition::named("base").with_devices("tall: raw:(min-height: 800px)");
        let app = PresetDefinition::named("app").with_colors("primary.light: #6cf");
        let tokens = design_tokens(&[base], &app).unwrap();
        assert_eq!(tokens.devices.unwrap()["tall"], "raw:(min-height: 800px)");
        assert_eq!(tokens.colors.unwrap()["primary.light"], "#6cf");
        assert_eq!(tokens.sizes, None);
    }

    #[test]
    fn test_expand_with_base_theme() {
        let mut base = ThemeConfig::default();
        base.spacing = Some(IndexMap::from([
            ("1".to_string(), "0.25rem".to_string()),
            ("2".to_string(), "0.5rem".to_string()),
        ]));
        base.colors = Some(IndexMap::from([("black".to_string(), plain("#000"))]));

        let mut theme = ThemeConfig::default();
        theme.spacing = Some(IndexMap::from([("2".to_string(), "1rem".to_string())]));

        let expanded = theme.expand_with(&base);
        let spacing = expanded.spacing.unwrap();
        assert_eq!(spacing["1"], "0.25rem");
        assert_eq!(spacing["2"], "1rem");
        assert_eq!(expanded.colors.unwrap()["black"], plain("#000"));
        assert_eq!(expanded.screens, None);
    }
}
