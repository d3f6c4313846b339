//! Core plugin (feature) lists.
//!
//! A preset enables stylesheet features through `corePlugins`, written as
//! one of three keywords or an explicit list:
//!
//! ```yaml
//! corePlugins: default        # curated baseline
//! corePlugins: all            # every known feature
//! corePlugins: none           # nothing
//! corePlugins:                # explicit, with prefix wildcards
//!   - preflight
//!   - grid*
//! ```
//!
//! [`resolve_plugins`] expands a [`PluginSpec`] against the fixed
//! [`ALL_PLUGINS`] vocabulary. Output order is part of the contract: entries
//! are expanded in input order, wildcards in vocabulary order, and the first
//! occurrence of a duplicate wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize, Serializer};

/// Every feature the stylesheet transformer knows about, in its own order.
pub const ALL_PLUGINS: &[&str] = &[
    "preflight",
    "container",
    "accessibility",
    "pointerEvents",
    "visibility",
    "position",
    "inset",
    "isolation",
    "zIndex",
    "order",
    "gridColumn",
    "gridColumnStart",
    "gridColumnEnd",
    "gridRow",
    "gridRowStart",
    "gridRowEnd",
    "float",
    "clear",
    "margin",
    "boxSizing",
    "lineClamp",
    "display",
    "aspectRatio",
    "height",
    "maxHeight",
    "minHeight",
    "width",
    "minWidth",
    "maxWidth",
    "flex",
    "flexShrink",
    "flexGrow",
    "flexBasis",
    "tableLayout",
    "captionSide",
    "borderCollapse",
    "borderSpacing",
    "transformOrigin",
    "translate",
    "rotate",
    "skew",
    "scale",
    "transform",
    "animation",
    "cursor",
    "touchAction",
    "userSelect",
    "resize",
    "scrollSnapType",
    "scrollSnapAlign",
    "scrollSnapStop",
    "scrollMargin",
    "scrollPadding",
    "listStylePosition",
    "listStyleType",
    "listStyleImage",
    "appearance",
    "columns",
    "breakBefore",
    "breakInside",
    "breakAfter",
    "gridAutoColumns",
    "gridAutoFlow",
    "gridAutoRows",
    "gridTemplateColumns",
    "gridTemplateRows",
    "flexDirection",
    "flexWrap",
    "placeContent",
    "placeItems",
    "alignContent",
    "alignItems",
    "justifyContent",
    "justifyItems",
    "gap",
    "space",
    "divideWidth",
    "divideStyle",
    "divideColor",
    "divideOpacity",
    "placeSelf",
    "alignSelf",
    "justifySelf",
    "overflow",
    "overscrollBehavior",
    "scrollBehavior",
    "textOverflow",
    "hyphens",
    "whitespace",
    "wordBreak",
    "borderRadius",
    "borderWidth",
    "borderStyle",
    "borderColor",
    "borderOpacity",
    "backgroundColor",
    "backgroundOpacity",
    "backgroundImage",
    "gradientColorStops",
    "boxDecorationBreak",
    "backgroundSize",
    "backgroundAttachment",
    "backgroundClip",
    "backgroundPosition",
    "backgroundRepeat",
    "backgroundOrigin",
    "fill",
    "stroke",
    "strokeWidth",
    "objectFit",
    "objectPosition",
    "padding",
    "textAlign",
    "textIndent",
    "verticalAlign",
    "fontFamily",
    "fontSize",
    "fontWeight",
    "textTransform",
    "fontStyle",
    "fontVariantNumeric",
    "lineHeight",
    "letterSpacing",
    "textColor",
    "textOpacity",
    "textDecoration",
    "textDecorationColor",
    "textDecorationStyle",
    "textDecorationThickness",
    "textUnderlineOffset",
    "fontSmoothing",
    "placeholderColor",
    "placeholderOpacity",
    "caretColor",
    "accentColor",
    "opacity",
    "backgroundBlendMode",
    "mixBlendMode",
    "boxShadow",
    "boxShadowColor",
    "outlineStyle",
    "outlineWidth",
    "outlineOffset",
    "outlineColor",
    "ringWidth",
    "ringColor",
    "ringOpacity",
    "ringOffsetWidth",
    "ringOffsetColor",
    "blur",
    "brightness",
    "contrast",
    "dropShadow",
    "grayscale",
    "hueRotate",
    "invert",
    "saturate",
    "sepia",
    "filter",
    "backdropBlur",
    "backdropBrightness",
    "backdropContrast",
    "backdropGrayscale",
    "backdropHueRotate",
    "backdropInvert",
    "backdropOpacity",
    "backdropSaturate",
    "backdropSepia",
    "backdropFilter",
    "transitionProperty",
    "transitionDelay",
    "transitionDuration",
    "transitionTimingFunction",
    "willChange",
    "content",
];

/// Baseline features enabled by `corePlugins: default`.
pub const DEFAULT_PLUGINS: &[&str] = &[
    "preflight",
    "container",
    "accessibility",
    "alignContent",
    "alignItems",
    "alignSelf",
    "animation",
    "backgroundAttachment",
    "backgroundColor",
    "backgroundImage",
    "backgroundPosition",
    "backgroundRepeat",
    "backgroundSize",
    "blur",
    "borderCollapse",
    "borderColor",
    "borderRadius",
    "borderStyle",
    "borderWidth",
    "boxShadow",
    "content",
    "display",
    "dropShadow",
    "fill",
    "filter",
    "flex",
    "flexDirection",
    "flexGrow",
    "flexShrink",
    "flexWrap",
    "float",
    "fontFamily",
    "fontSize",
    "fontStyle",
    "fontWeight",
    "gap",
    "grayscale",
    "gridAutoColumns",
    "gridAutoFlow",
    "gridAutoRows",
    "gridColumn",
    "gridColumnEnd",
    "gridColumnStart",
    "gridRow",
    "gridRowEnd",
    "gridRowStart",
    "gridTemplateColumns",
    "gridTemplateRows",
    "height",
    "inset",
    "justifyContent",
    "justifyItems",
    "justifySelf",
    "lineHeight",
    "listStylePosition",
    "listStyleType",
    "margin",
    "maxHeight",
    "maxWidth",
    "minHeight",
    "minWidth",
    "opacity",
    "order",
    "outlineStyle",
    "overflow",
    "padding",
    "position",
    "resize",
    "ringColor",
    "ringOffsetColor",
    "ringOffsetWidth",
    "ringOpacity",
    "ringWidth",
    "rotate",
    "scale",
    "stroke",
    "strokeWidth",
    "tableLayout",
    "textAlign",
    "textColor",
    "textDecoration",
    "textOverflow",
    "transform",
    "visibility",
    "whitespace",
    "width",
    "zIndex",
];

const WILDCARD: char = '*';

/// A `corePlugins` value as written in a preset.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_yaml::Value")]
pub enum PluginSpec {
    /// `"default"`: the [`DEFAULT_PLUGINS`] baseline.
    Default,
    /// `"all"`: the whole [`ALL_PLUGINS`] vocabulary.
    All,
    /// `"none"`: no features.
    None,
    /// Plugin names, each optionally ending in `*` for a prefix match.
    List(Vec<String>),
    /// Anything else; resolves to no features.
    Unrecognized(serde_yaml::Value),
}

impl From<serde_yaml::Value> for PluginSpec {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::String(s) => match s.as_str() {
                "default" => PluginSpec::Default,
                "all" => PluginSpec::All,
                "none" => PluginSpec::None,
                _ => PluginSpec::Unrecognized(serde_yaml::Value::String(s)),
            },
            serde_yaml::Value::Sequence(items) => PluginSpec::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        serde_yaml::Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => PluginSpec::Unrecognized(other),
        }
    }
}

impl Serialize for PluginSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PluginSpec::Default => serializer.serialize_str("default"),
            PluginSpec::All => serializer.serialize_str("all"),
            PluginSpec::None => serializer.serialize_str("none"),
            PluginSpec::List(items) => items.serialize(serializer),
            PluginSpec::Unrecognized(value) => value.serialize(serializer),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for PluginSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        PluginSpec::List(iter.into_iter().map(Into::into).collect())
    }
}

/// Expands a plugin spec into a concrete, duplicate-free feature list.
///
/// # Example
///
/// ```rust
/// use wds_preset::plugins::{resolve_plugins, PluginSpec};
///
/// let spec: PluginSpec = ["preflight", "gridRow*", "preflight"].into_iter().collect();
/// assert_eq!(
///     resolve_plugins(Some(&spec)),
///     vec!["preflight", "gridRow", "gridRowStart", "gridRowEnd"],
/// );
/// ```
pub fn resolve_plugins(spec: Option<&PluginSpec>) -> Vec<String> {
    match spec {
        Some(PluginSpec::All) => to_owned(ALL_PLUGINS),
        Some(PluginSpec::Default) => to_owned(DEFAULT_PLUGINS),
        Some(PluginSpec::List(entries)) => {
            dedup_first(entries.iter().flat_map(|entry| expand_entry(entry)))
        }
        Some(PluginSpec::None) | Some(PluginSpec::Unrecognized(_)) | None => Vec::new(),
    }
}

fn expand_entry(entry: &str) -> Vec<String> {
    match entry.strip_suffix(WILDCARD) {
        Some(stem) => ALL_PLUGINS
            .iter()
            .filter(|name| name.starts_with(stem))
            .map(|name| name.to_string())
            .collect(),
        None => vec![entry.to_string()],
    }
}

fn to_owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Removes duplicates, keeping the first occurrence of each item.
pub fn dedup_first<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> PluginSpec {
        items.iter().copied().collect()
    }

    #[test]
    fn test_absent_is_empty() {
        assert!(resolve_plugins(None).is_empty());
    }

    #[test]
    fn test_keywords() {
        assert_eq!(resolve_plugins(Some(&PluginSpec::All)).len(), ALL_PLUGINS.len());
        assert_eq!(
            resolve_plugins(Some(&PluginSpec::Default)).len(),
            DEFAULT_PLUGINS.len()
        );
        assert!(resolve_plugins(Some(&PluginSpec::None)).is_empty());
    }

    #[test]
    fn test_list_dedup_keeps_first() {
        assert_eq!(resolve_plugins(Some(&list(&["a", "b", "a"]))), vec!["a", "b"]);
    }

    #[test]
    fn test_wildcard_expands_in_vocabulary_order() {
        let expected: Vec<String> = ALL_PLUGINS
            .iter()
            .filter(|name| name.starts_with("grid"))
            .map(|name| name.to_string())
            .collect();
        assert!(!expected.is_empty());
        assert_eq!(resolve_plugins(Some(&list(&["grid*"]))), expected);
    }

    #[test]
    fn test_bare_wildcard_is_everything() {
        assert_eq!(resolve_plugins(Some(&list(&["*"]))), to_owned(ALL_PLUGINS));
    }

    #[test]
    fn test_wildcard_without_match_is_empty() {
        assert!(resolve_plugins(Some(&list(&["nothing*"]))).is_empty());
    }

    #[test]
    fn test_vocabulary_has_no_duplicates() {
        assert_eq!(dedup_first(to_owned(ALL_PLUGINS)).len(), ALL_PLUGINS.len());
    }

    #[test]
    fn test_default_is_subset_of_vocabulary() {
        for name in DEFAULT_PLUGINS {
            assert!(ALL_PLUGINS.contains(name), "{} missing from ALL_PLUGINS", name);
        }
    }

    #[test]
    fn test_deserialize_keywords_and_lists() {
        let spec: PluginSpec = serde_yaml::from_str("all").unwrap();
        assert_eq!(spec, PluginSpec::All);

        let spec: PluginSpec = serde_yaml::from_str("- preflight\n- grid*").unwrap();
        assert_eq!(spec, list(&["preflight", "grid*"]));

        let spec: PluginSpec = serde_yaml::from_str("everything").unwrap();
        assert!(resolve_plugins(Some(&spec)).is_empty());

        let spec: PluginSpec = serde_yaml::from_str("42").unwrap();
        assert!(resolve_plugins(Some(&spec)).is_empty());
    }

    #[test]
    fn test_serialize_keyword_and_list() {
        assert_eq!(serde_json::to_string(&PluginSpec::Default).unwrap(), r#""default""#);
        assert_eq!(
            serde_json::to_string(&list(&["a", "b"])).unwrap(),
            r#"["a","b"]"#
        );
    }
}
