//! `extends` chain resolution.
//!
//! A preset can extend one or more named presets, which can extend others in
//! turn. [`resolve_chain`] flattens that graph into a single list ordered
//! from the most basal ancestor to the requested preset, which is the order
//! every later merge step folds over (later entries win).
//!
//! # Ordering
//!
//! For `app` extending `[brand, base]`:
//!
//! - direct ancestors appear in reverse declared order, so the last-declared
//!   (`base`) is the most basal and the first-declared (`brand`) sits right
//!   before `app`
//! - an ancestor's own ancestors are placed ahead of the direct ones; if
//!   `brand` extends `tokens`, the chain is `[tokens, base, brand, app]`
//! - a preset reachable through several branches appears once, at its most
//!   basal position
//!
//! # Failure policy
//!
//! - an ancestor name the store does not know is skipped with a warning
//! - an ancestor that is already on the path being resolved is a
//!   [`PresetError::CyclicExtension`]
//! - a requested preset (the start of the walk) that cannot be found is a
//!   [`PresetError::NotFound`]
//!
//! Ancestors are loaded one at a time, in resolution order, and each name
//! is loaded at most once per resolution.

use std::collections::{HashMap, HashSet};

use futures::future::{BoxFuture, FutureExt};
use tracing::{debug, warn};

use crate::error::{PresetError, Result};
use crate::plugins::{resolve_plugins, PluginSpec};
use crate::preset::PresetDefinition;
use crate::store::PresetStore;

/// The start of a resolution: a preset name, or a definition in hand.
#[derive(Debug, Clone)]
pub enum PresetRef {
    Name(String),
    Definition(PresetDefinition),
}

impl From<&str> for PresetRef {
    fn from(name: &str) -> Self {
        PresetRef::Name(name.to_string())
    }
}

impl From<String> for PresetRef {
    fn from(name: String) -> Self {
        PresetRef::Name(name)
    }
}

impl From<PresetDefinition> for PresetRef {
    fn from(preset: PresetDefinition) -> Self {
        PresetRef::Definition(preset)
    }
}

/// A requested preset together with its flattened ancestors.
#[derive(Debug, Clone)]
pub struct ResolvedChain {
    /// Ancestors, most basal first. Does not include `preset`.
    pub ancestors: Vec<PresetDefinition>,
    /// The requested preset.
    pub preset: PresetDefinition,
}

impl ResolvedChain {
    /// Iterates ancestors first, then the requested preset.
    pub fn iter(&self) -> impl Iterator<Item = &PresetDefinition> {
        self.ancestors.iter().chain(std::iter::once(&self.preset))
    }

    /// Labels of every entry, ancestors first.
    pub fn labels(&self) -> Vec<&str> {
        self.iter().map(PresetDefinition::label).collect()
    }
}

/// Resolves a preset (by name or definition) and its whole ancestry.
///
/// # Errors
///
/// - [`PresetError::NotFound`] if `start` is a name the store does not know
/// - [`PresetError::CyclicExtension`] if the `extends` graph has a cycle
/// - any error the store reports while loading a source
pub async fn resolve_chain<S>(store: &S, start: impl Into<PresetRef>) -> Result<ResolvedChain>
where
    S: PresetStore + ?Sized,
{
    let preset = match start.into() {
        PresetRef::Definition(preset) => preset,
        PresetRef::Name(name) => {
            store
                .load_preset(&name)
                .await?
                .ok_or(PresetError::NotFound { name })?
        }
    };

    let ancestors = resolve_ancestors(store, &preset).await?;
    Ok(ResolvedChain { ancestors, preset })
}

/// Resolves the ancestors of `preset`, most basal first.
///
/// The preset itself is not part of the result. Each named ancestor is
/// loaded and expanded once per call, however many branches reach it.
pub async fn resolve_ancestors<S>(store: &S, preset: &PresetDefinition) -> Result<Vec<PresetDefinition>>
where
    S: PresetStore + ?Sized,
{
    let path: Vec<String> = preset.name.iter().cloned().collect();
    let mut resolver = Resolver::new(store);
    resolver.walk(preset, path).await
}

/// Per-request memo of loaded and expanded ancestors.
///
/// An entry in `expanded` is only written once its walk has finished, so a
/// name still on the current path is never served from the memo and cycle
/// detection sees it.
struct Resolver<'a, S: ?Sized> {
    store: &'a S,
    loaded: HashMap<String, Option<PresetDefinition>>,
    expanded: HashMap<String, Vec<PresetDefinition>>,
}

impl<'a, S> Resolver<'a, S>
where
    S: PresetStore + ?Sized,
{
    fn new(store: &'a S) -> Self {
        Self {
            store,
            loaded: HashMap::new(),
            expanded: HashMap::new(),
        }
    }

    async fn load(&mut self, name: &str) -> Result<Option<PresetDefinition>> {
        if let Some(hit) = self.loaded.get(name) {
            return Ok(hit.clone());
        }
        let ancestor = self
            .store
            .load_preset(name)
            .await?
            .map(|ancestor| normalize(ancestor, name));
        self.loaded.insert(name.to_string(), ancestor.clone());
        Ok(ancestor)
    }

    fn walk<'b>(
        &'b mut self,
        preset: &'b PresetDefinition,
        path: Vec<String>,
    ) -> BoxFuture<'b, Result<Vec<PresetDefinition>>> {
        async move {
            let names = preset.extends.names();
            if names.is_empty() {
                return Ok(Vec::new());
            }
            debug!(preset = preset.label(), extends = ?names, "resolving extends");

            let mut loaded = Vec::with_capacity(names.len());
            for name in names {
                if path.contains(name) {
                    let mut cycle = path.clone();
                    cycle.push(name.clone());
                    return Err(PresetError::CyclicExtension { path: cycle });
                }

                match self.load(name).await? {
                    Some(ancestor) => loaded.push((name.clone(), ancestor)),
                    None => warn!(
                        preset = preset.label(),
                        ancestor = %name,
                        "skipping unknown ancestor preset"
                    ),
                }
            }

            let mut chain: Vec<PresetDefinition> =
                loaded.iter().rev().map(|(_, ancestor)| ancestor.clone()).collect();

            for (name, ancestor) in &loaded {
                let mut inherited = match self.expanded.get(name) {
                    Some(done) => done.clone(),
                    None => {
                        let mut sub_path = path.clone();
                        sub_path.push(name.clone());
                        let done = self.walk(ancestor, sub_path).await?;
                        self.expanded.insert(name.clone(), done.clone());
                        done
                    }
                };
                inherited.append(&mut chain);
                chain = inherited;
            }

            Ok(dedup_by_name(chain))
        }
        .boxed()
    }
}

/// Names a freshly loaded ancestor and expands its plugin list.
///
/// An absent `corePlugins` stays absent so the merge can still tell
/// "not declared" apart from an explicit empty list.
fn normalize(mut ancestor: PresetDefinition, reference: &str) -> PresetDefinition {
    if ancestor.name.is_none() {
        ancestor.name = Some(reference.to_string());
    }
    if let Some(spec) = &ancestor.core_plugins {
        let plugins = resolve_plugins(Some(spec));
        ancestor.core_plugins = Some(PluginSpec::List(plugins));
    }
    ancestor
}

/// Keeps the first (most basal) occurrence of each named preset.
fn dedup_by_name(chain: Vec<PresetDefinition>) -> Vec<PresetDefinition> {
    let mut seen = HashSet::new();
    chain
        .into_iter()
        .filter(|preset| match &preset.name {
            Some(name) => seen.insert(name.clone()),
            None => true,
        })
        .collect()
}
