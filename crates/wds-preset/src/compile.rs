//! The compilation pipeline.
//!
//! [`Compiler`] ties the pieces together for one request:
//!
//! ```text
//! resolve chain -> merge configuration -> generate template -> transform
//! ```
//!
//! Chain and DSL failures abort with a [`PresetError`]. A transformer
//! failure does not: it is packaged into the [`CompiledArtifact`] together
//! with the configuration that was handed to the transformer, so callers
//! can still show what was attempted.

use serde::Serialize;
use tracing::{info, warn};

use crate::chain::{resolve_ancestors, resolve_chain};
use crate::components::generate_template;
use crate::error::{Diagnostic, PresetError, Result};
use crate::plugins::PluginSpec;
use crate::preset::PresetDefinition;
use crate::store::PresetStore;
use crate::theme::{design_tokens, merge};
use crate::transform::{StylesheetTransformer, TransformOptions};

/// Terminal output of one compilation request.
///
/// On success `error` is `None` and every text field is set. On a
/// transform failure `error` is set, `css` is empty, and `json` and
/// `tokens` still hold the merged configuration and tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompiledArtifact {
    pub error: Option<Diagnostic>,
    /// The transformed stylesheet.
    pub css: String,
    /// The merged configuration handed to the transformer, as JSON.
    pub json: String,
    /// The merged raw design tokens, as JSON.
    pub tokens: String,
}

impl CompiledArtifact {
    /// An artifact for a request that failed before anything was merged.
    pub fn failed(error: &PresetError) -> Self {
        Self {
            error: Some(Diagnostic::from(error)),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Compiles preset definitions against a store and a transformer.
#[derive(Debug, Clone)]
pub struct Compiler<S, T> {
    store: S,
    transformer: T,
}

impl<S, T> Compiler<S, T>
where
    S: PresetStore,
    T: StylesheetTransformer,
{
    pub fn new(store: S, transformer: T) -> Self {
        Self { store, transformer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    /// Compiles a definition in hand.
    ///
    /// On return, `preset.core_plugins` holds the merged plugin list and
    /// `preset.presets` the resolved ancestors, unless either is empty.
    ///
    /// # Errors
    ///
    /// Chain and DSL errors; see [`resolve_chain`] and [`merge`]. Transform
    /// failures are reported through [`CompiledArtifact::error`] instead.
    pub async fn compile(&self, preset: &mut PresetDefinition) -> Result<CompiledArtifact> {
        let ancestors = resolve_ancestors(&self.store, preset).await?;
        self.compile_resolved(preset, ancestors).await
    }

    /// Loads a preset from the store and compiles it.
    ///
    /// # Errors
    ///
    /// [`PresetError::NotFound`] if the store does not know `name`, plus
    /// everything [`Compiler::compile`] can return.
    pub async fn compile_named(&self, name: &str) -> Result<CompiledArtifact> {
        let chain = resolve_chain(&self.store, name).await?;
        let mut preset = chain.preset;
        self.compile_resolved(&mut preset, chain.ancestors).await
    }

    async fn compile_resolved(
        &self,
        preset: &mut PresetDefinition,
        ancestors: Vec<PresetDefinition>,
    ) -> Result<CompiledArtifact> {
        info!(
            preset = preset.label(),
            ancestors = ancestors.len(),
            "compiling preset"
        );

        let mut config = merge(&ancestors, preset)?;
        let tokens = design_tokens(&ancestors, preset)?.to_json()?;

        if !config.core_plugins.is_empty() {
            preset.core_plugins = Some(PluginSpec::List(config.core_plugins.clone()));
        }
        let template = generate_template(&ancestors, preset);
        if !ancestors.is_empty() {
            preset.presets = ancestors;
        }

        if config.resolve {
            config.theme = config.theme.expand_with(&self.transformer.base_theme());
        }
        let json = config.to_json()?;

        let options = TransformOptions::minify(config.minify);
        match self.transformer.transform(&config, &template, options).await {
            Ok(css) => {
                info!(preset = preset.label(), bytes = css.len(), "compiled preset");
                Ok(CompiledArtifact {
                    error: None,
                    css,
                    json,
                    tokens,
                })
            }
            Err(err) => {
                warn!(preset = preset.label(), error = %err, "stylesheet transform failed");
                Ok(CompiledArtifact {
                    error: Some(Diagnostic::from(err)),
                    css: String::new(),
                    json,
                    tokens,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TransformError};
    use crate::store::PresetRegistry;
    use crate::theme::{MergedConfiguration, ThemeConfig};
    use async_trait::async_trait;
    use indexmap::IndexMap;
    use std::sync::Mutex;

    /// Echoes the template and records what it was handed.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(MergedConfiguration, String, TransformOptions)>>,
    }

    #[async_trait]
    impl StylesheetTransformer for Recorder {
        async fn transform(
            &self,
            config: &MergedConfiguration,
            template: &str,
            options: TransformOptions,
        ) -> std::result::Result<String, TransformError> {
            self.calls
                .lock()
                .unwrap()
                .push((config.clone(), template.to_string(), options));
            Ok(template.to_string())
        }

        fn base_theme(&self) -> ThemeConfig {
            ThemeConfig {
                spacing: Some(IndexMap::from([("4".to_string(), "1rem".to_string())])),
                ..ThemeConfig::default()
            }
        }
    }

    struct Failing;

    #[async_trait]
    impl StylesheetTransformer for Failing {
        async fn transform(
            &self,
            _config: &MergedConfiguration,
            _template: &str,
            _options: TransformOptions,
        ) -> std::result::Result<String, TransformError> {
            Err(TransformError::new("`bg-nope` class does not exist").with_excerpt("@apply bg-nope;"))
        }
    }

    fn store() -> PresetRegistry {
        let mut store = PresetRegistry::new();
        store
            .add_inline("base", "corePlugins: [preflight]\ncolors: |\n  primary: #111\n")
            .unwrap();
        store
            .add_inline(
                "brand",
                "extends: base\ncorePlugins: [container]\ncomponents:\n  btn:\n    apply: px-4\n",
            )
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_compile_success() {
        let compiler = Compiler::new(store(), Recorder::default());
        let mut preset = PresetDefinition::named("app")
            .extending("brand")
            .with_colors("accent: #444")
            .minified(true);

        let artifact = compiler.compile(&mut preset).await.unwrap();
        assert!(artifact.is_ok());
        assert!(artifact.css.contains(".btn {"));

        let json: serde_json::Value = serde_json::from_str(&artifact.json).unwrap();
        assert_eq!(json["corePlugins"], serde_json::json!(["preflight", "container"]));
        assert_eq!(json["theme"]["colors"]["primary"], "#111");
        assert_eq!(json["theme"]["colors"]["accent"], "#444");
        assert_eq!(json["minify"], true);

        let tokens: serde_json::Value = serde_json::from_str(&artifact.tokens).unwrap();
        assert_eq!(tokens["colors"]["accent"], "#444");

        let calls = compiler.transformer().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].2.minify);
    }

    #[tokio::test]
    async fn test_compile_writes_back_plugins_and_chain() {
        let compiler = Compiler::new(store(), Recorder::default());
        let mut preset = PresetDefinition::named("app").extending("brand");

        compiler.compile(&mut preset).await.unwrap();
        assert_eq!(
            preset.core_plugins,
            Some(PluginSpec::List(vec!["preflight".into(), "container".into()]))
        );
        let names: Vec<&str> = preset.presets.iter().map(PresetDefinition::label).collect();
        assert_eq!(names, vec!["base", "brand"]);
    }

    #[tokio::test]
    async fn test_compile_without_ancestors_leaves_presets_empty() {
        let compiler = Compiler::new(store(), Recorder::default());
        let mut preset = PresetDefinition::named("solo").with_plugins(PluginSpec::None);

        compiler.compile(&mut preset).await.unwrap();
        assert!(preset.presets.is_empty());
        assert_eq!(preset.core_plugins, Some(PluginSpec::None));
    }

    #[tokio::test]
    async fn test_compile_is_idempotent() {
        let compiler = Compiler::new(store(), Recorder::default());
        let mut preset = PresetDefinition::named("app").extending("brand");

        let first = compiler.compile(&mut preset).await.unwrap();
        let second = compiler.compile(&mut preset).await.unwrap();
        assert_eq!(first.json, second.json);
        assert_eq!(first.css, second.css);
    }

    #[tokio::test]
    async fn test_transform_failure_is_packaged() {
        let compiler = Compiler::new(store(), Failing);
        let mut preset = PresetDefinition::named("app").extending("brand");

        let artifact = compiler.compile(&mut preset).await.unwrap();
        let error = artifact.error.as_ref().unwrap();
        assert_eq!(error.kind, ErrorKind::Transform);
        assert_eq!(error.source.as_deref(), Some("@apply bg-nope;"));
        assert!(artifact.css.is_empty());
        assert!(!artifact.json.is_empty());
    }

    #[tokio::test]
    async fn test_resolve_expands_with_base_theme() {
        let compiler = Compiler::new(store(), Recorder::default());

        let mut overrides = PresetDefinition::named("a").with_spacing("2: 0.5rem");
        let artifact = compiler.compile(&mut overrides).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&artifact.json).unwrap();
        assert!(json["theme"]["spacing"].get("4").is_none());

        let mut resolved = PresetDefinition::named("b").with_spacing("2: 0.5rem").resolved(true);
        let artifact = compiler.compile(&mut resolved).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&artifact.json).unwrap();
        assert_eq!(json["theme"]["spacing"]["4"], "1rem");
        assert_eq!(json["theme"]["spacing"]["2"], "0.5rem");
    }

    #[tokio::test]
    async fn test_compile_named() {
        let compiler = Compiler::new(store(), Recorder::default());
        let artifact = compiler.compile_named("brand").await.unwrap();
        assert!(artifact.css.contains(".btn {"));

        let missing = compiler.compile_named("ghost").await;
        assert!(matches!(missing, Err(PresetError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_malformed_dsl_propagates() {
        let compiler = Compiler::new(store(), Recorder::default());
        let mut preset = PresetDefinition::named("a").with_colors("primary #0af");
        let err = compiler.compile(&mut preset).await.unwrap_err();
        assert!(matches!(err, PresetError::MalformedDsl { line_number: 1, .. }));

        let artifact = CompiledArtifact::failed(&err);
        assert_eq!(artifact.error.unwrap().kind, ErrorKind::MalformedDsl);
        assert!(artifact.json.is_empty());
    }
}
