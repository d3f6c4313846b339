//! # WDS Preset - Design-System Preset Compilation
//!
//! `wds-preset` compiles declarative design-system definitions (colors,
//! spacing, breakpoints, reusable component classes and an enabled-feature
//! list) into a merged theme configuration and a component stylesheet
//! template, then hands both to a stylesheet transformer.
//!
//! Definitions can extend one another. The engine flattens the `extends`
//! graph into one deterministic chain before anything is merged.
//!
//! ## Core Concepts
//!
//! - [`PresetDefinition`]: one design-system document, usually YAML
//! - [`dsl`]: the `key: value // comment` text format for theme values
//! - [`plugins`]: `"default"`, `"all"`, `"none"` and `grid*`-style plugin lists
//! - [`resolve_chain`]: `extends` resolution, base first, with cycle detection
//! - [`merge`]: theme and plugin merging across the chain
//! - [`generate_template`]: component rules and raw styles as a stylesheet template
//! - [`Compiler`]: the whole pipeline, producing a [`CompiledArtifact`]
//!
//! ## Quick Start
//!
//! ```rust
//! use wds_preset::{Compiler, CssTransformer, PresetDefinition, PresetRegistry};
//!
//! # tokio_test_block(async {
//! let mut store = PresetRegistry::new();
//! store.add_inline("base", r#"
//! colors: |
//!   primary: #0af
//! components:
//!   btn:
//!     apply: px-4 py-2
//! "#).unwrap();
//!
//! let compiler = Compiler::new(store, CssTransformer::new());
//! let mut app = PresetDefinition::from_yaml(r#"
//! extends: base
//! colors: |
//!   accent: #f98
//! "#).unwrap();
//!
//! let artifact = compiler.compile(&mut app).await.unwrap();
//! assert!(artifact.is_ok());
//! assert!(artifact.css.contains(".btn {"));
//! assert!(artifact.json.contains("\"accent\": \"#f98\""));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Collaborators
//!
//! The engine does no I/O of its own. Named presets come from a
//! [`PresetStore`] ([`PresetRegistry`] covers inline definitions and source
//! directories) and the final CSS from a [`StylesheetTransformer`]
//! ([`CssTransformer`] built in, [`CommandTransformer`] for external tools).

pub mod chain;
pub mod components;
pub mod compile;
pub mod dsl;
mod error;
pub mod plugins;
pub mod preset;
pub mod store;
pub mod theme;
pub mod transform;

// Error types
pub use error::{Diagnostic, ErrorKind, PresetError, Result, TransformError};

// Definitions
pub use dsl::{ThemeSource, Tokens};
pub use plugins::{resolve_plugins, PluginSpec, ALL_PLUGINS, DEFAULT_PLUGINS};
pub use preset::{ComponentDefinition, Extends, PresetDefinition};

// Pipeline stages
pub use chain::{resolve_ancestors, resolve_chain, PresetRef, ResolvedChain};
pub use components::generate_template;
pub use compile::{CompiledArtifact, Compiler};
pub use theme::{
    design_tokens, merge, ColorValue, DesignTokens, MergedConfiguration, ScreenValue, ThemeConfig,
};

// Collaborators
pub use store::{PresetRegistry, PresetStore, PRESET_EXTENSIONS};
pub use transform::{
    CommandTransformer, CssTransformer, StylesheetTransformer, TransformOptions,
};
