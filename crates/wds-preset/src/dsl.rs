//! Theme value sources and the `key: value // comment` text format.
//!
//! Every theme fragment of a preset (`devices`, `colors`, `spacing`,
//! `borderRadius`, `sizes`) can be written either as a block of text:
//!
//! ```yaml
//! colors: |
//!   primary:   #0af   // brand
//!   secondary: #f98
//! ```
//!
//! or as a structured mapping:
//!
//! ```yaml
//! colors:
//!   primary: "#0af"
//!   secondary: "#f98"
//! ```
//!
//! [`ThemeSource`] holds either form and [`parse`] normalizes both into the
//! same ordered [`Tokens`] mapping, so nothing past this module needs to
//! know which one the author used.
//!
//! Nested mappings are flattened one level: `primary: { DEFAULT: "#0af",
//! light: "#6cf" }` becomes the tokens `primary` and `primary.light`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{PresetError, Result};

const DEFINITION_SEPARATOR: char = ':';
const COMMENT_SEPARATOR: &str = "//";

/// Separator between a token name and its shade sub-key (`primary.light`).
pub const SHADE_SEPARATOR: char = '.';

/// Key that maps a nested entry back onto its parent token.
pub const DEFAULT_KEY: &str = "DEFAULT";

/// Normalized theme values: token name to trimmed value, in first-seen order.
pub type Tokens = IndexMap<String, String>;

/// A theme fragment as written in a preset definition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged, try_from = "serde_yaml::Value")]
pub enum ThemeSource {
    /// Newline-delimited `key: value // comment` text.
    Text(String),
    /// Already-structured entries.
    Map(IndexMap<String, String>),
}

impl From<&str> for ThemeSource {
    fn from(text: &str) -> Self {
        ThemeSource::Text(text.to_string())
    }
}

impl From<String> for ThemeSource {
    fn from(text: String) -> Self {
        ThemeSource::Text(text)
    }
}

impl From<IndexMap<String, String>> for ThemeSource {
    fn from(map: IndexMap<String, String>) -> Self {
        ThemeSource::Map(map)
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for ThemeSource {
    fn from(entries: [(K, V); N]) -> Self {
        ThemeSource::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl TryFrom<serde_yaml::Value> for ThemeSource {
    type Error = String;

    fn try_from(value: serde_yaml::Value) -> std::result::Result<Self, Self::Error> {
        match value {
            serde_yaml::Value::String(s) => Ok(ThemeSource::Text(s)),
            serde_yaml::Value::Mapping(map) => {
                let mut entries = IndexMap::new();
                for (key, value) in map {
                    let key = scalar_to_string(&key)
                        .ok_or_else(|| format!("theme keys must be scalars, got {:?}", key))?;
                    match value {
                        serde_yaml::Value::Mapping(nested) => {
                            for (sub, value) in nested {
                                let sub = scalar_to_string(&sub).ok_or_else(|| {
                                    format!("theme keys must be scalars, got {:?}", sub)
                                })?;
                                let value = scalar_to_string(&value).ok_or_else(|| {
                                    format!("value of '{}.{}' must be a scalar", key, sub)
                                })?;
                                let name = if sub == DEFAULT_KEY {
                                    key.clone()
                                } else {
                                    format!("{}{}{}", key, SHADE_SEPARATOR, sub)
                                };
                                entries.insert(name, value);
                            }
                        }
                        other => {
                            let value = scalar_to_string(&other)
                                .ok_or_else(|| format!("value of '{}' must be a scalar", key))?;
                            entries.insert(key, value);
                        }
                    }
                }
                Ok(ThemeSource::Map(entries))
            }
            other => Err(format!(
                "expected definition text or a mapping, got {:?}",
                other
            )),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Normalizes a theme fragment into [`Tokens`].
///
/// Returns `Ok(None)` when the fragment is absent or an empty string; that
/// is a valid "nothing declared" result and differs from an empty mapping.
///
/// # Errors
///
/// Returns [`PresetError::MalformedDsl`] for a text line without `:`.
///
/// # Example
///
/// ```rust
/// use wds_preset::dsl::{parse, ThemeSource};
///
/// let source = ThemeSource::from("phone: 640px // small\ntablet: 768px\n");
/// let tokens = parse(Some(&source)).unwrap().unwrap();
/// assert_eq!(tokens["phone"], "640px");
/// assert_eq!(tokens["tablet"], "768px");
/// ```
pub fn parse(input: Option<&ThemeSource>) -> Result<Option<Tokens>> {
    match input {
        None => Ok(None),
        Some(ThemeSource::Text(text)) if text.is_empty() => Ok(None),
        Some(ThemeSource::Text(text)) => parse_text(text).map(Some),
        Some(ThemeSource::Map(map)) => Ok(Some(
            map.iter()
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect(),
        )),
    }
}

fn parse_text(text: &str) -> Result<Tokens> {
    let mut tokens = Tokens::new();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let (key, rest) =
            line.split_once(DEFINITION_SEPARATOR)
                .ok_or_else(|| PresetError::MalformedDsl {
                    line_number: index + 1,
                    line: line.trim().to_string(),
                })?;

        let value = match rest.split_once(COMMENT_SEPARATOR) {
            Some((value, _comment)) => value,
            None => rest,
        };

        tokens.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(tokens)
}

/// Writes tokens back out as definition text, one `key: value` per line.
pub fn to_dsl_text(tokens: &Tokens) -> String {
    tokens
        .iter()
        .map(|(k, v)| format!("{}{} {}\n", k, DEFINITION_SEPARATOR, v))
        .collect()
}
