//! Command handlers.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use wds_preset::{
    merge, resolve_chain, CompiledArtifact, Compiler, PresetDefinition, PresetRegistry,
    StylesheetTransformer,
};

use crate::settings::Settings;

const CSS_EXTENSION: &str = ".css";
const CONFIG_EXTENSION: &str = ".conf.json";
const TOKENS_EXTENSION: &str = ".tokens.json";

type BoxedCompiler = Compiler<PresetRegistry, Box<dyn StylesheetTransformer>>;

fn registry(settings: &Settings) -> Result<PresetRegistry> {
    let mut registry = PresetRegistry::new();
    registry
        .add_dir(&settings.systems)
        .with_context(|| format!("cannot use systems directory {}", settings.systems.display()))?;
    Ok(registry)
}

fn compiler(settings: &Settings, registry: PresetRegistry) -> BoxedCompiler {
    Compiler::new(registry, settings.transformer())
}

/// Compiles each named preset and writes its artifacts.
pub async fn compile(settings: &Settings, names: &[String]) -> Result<()> {
    let compiler = compiler(settings, registry(settings)?);
    for name in names {
        compile_one(&compiler, &settings.output, name).await?;
    }
    Ok(())
}

/// Compiles every preset in the systems directory, stopping on the first failure.
pub async fn build(settings: &Settings) -> Result<()> {
    let registry = registry(settings)?;
    let names = registry.names().await?;
    if names.is_empty() {
        info!(systems = %settings.systems.display(), "no presets found");
        return Ok(());
    }

    let compiler = compiler(settings, registry);
    for name in &names {
        compile_one(&compiler, &settings.output, name).await?;
    }
    info!(count = names.len(), "build finished");
    Ok(())
}

async fn compile_one(compiler: &BoxedCompiler, output: &Path, name: &str) -> Result<()> {
    let artifact = compiler
        .compile_named(name)
        .await
        .with_context(|| format!("failed to compile {}", name))?;

    if let Some(diagnostic) = &artifact.error {
        error!(preset = %name, "{}", diagnostic.message);
        if let Some(source) = &diagnostic.source {
            eprintln!("  --> {}", source);
        }
        bail!("failed to compile {}", name);
    }

    let written = write_artifact(output, name, &artifact).await?;
    info!(preset = %name, files = written.len(), output = %output.display(), "wrote artifacts");
    Ok(())
}

async fn write_artifact(output: &Path, name: &str, artifact: &CompiledArtifact) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("cannot create {}", output.display()))?;

    let files = [
        (CSS_EXTENSION, &artifact.css),
        (CONFIG_EXTENSION, &artifact.json),
        (TOKENS_EXTENSION, &artifact.tokens),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (extension, content) in files {
        let path = output.join(format!("{}{}", name, extension));
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("cannot write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

/// Prints the resolved chain of a preset, base first.
pub async fn chain(settings: &Settings, name: &str) -> Result<()> {
    let registry = registry(settings)?;
    let chain = resolve_chain(&registry, name).await?;
    for label in chain.labels() {
        println!("{}", label);
    }
    Ok(())
}

/// Prints the configuration a compile of `name` hands to the transformer.
pub async fn config(settings: &Settings, name: &str) -> Result<()> {
    let registry = registry(settings)?;
    let chain = resolve_chain(&registry, name).await?;

    let mut config = merge(&chain.ancestors, &chain.preset)?;
    if config.resolve {
        config.theme = config.theme.expand_with(&settings.transformer().base_theme());
    }
    println!("{}", config.to_json()?);
    Ok(())
}

async fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("cannot read definition from stdin")?;
            Ok(text)
        }
    }
}

/// Stores a definition read from a file (or stdin) as `<name>.yml` in the
/// systems directory. Invalid definitions are rejected before writing.
pub async fn save(settings: &Settings, name: &str, file: Option<&Path>) -> Result<()> {
    let source = read_source(file).await?;

    tokio::fs::create_dir_all(&settings.systems)
        .await
        .with_context(|| format!("cannot create {}", settings.systems.display()))?;
    let registry = registry(settings)?;
    if registry.contains(name) {
        info!(preset = %name, "replacing existing preset");
    }

    let path = registry
        .save(name, &source)
        .await
        .with_context(|| format!("failed to save {}", name))?;
    let preset = registry.get(name).await?;
    info!(
        preset = %name,
        path = %path.display(),
        extends = ?preset.extends.names(),
        "saved preset"
    );
    Ok(())
}

/// Compiles a definition read from a file (or stdin) and prints the artifact.
pub async fn generate(settings: &Settings, file: Option<&Path>) -> Result<()> {
    let source = read_source(file).await?;

    // A missing systems directory just means nothing to extend.
    let mut registry = PresetRegistry::new();
    if settings.systems.is_dir() {
        registry.add_dir(&settings.systems)?;
    }
    let compiler = compiler(settings, registry);

    let result = match PresetDefinition::from_yaml(&source) {
        Ok(mut preset) => compiler.compile(&mut preset).await,
        Err(err) => Err(err),
    };
    let artifact = match &result {
        Ok(artifact) => artifact.clone(),
        Err(err) => CompiledArtifact::failed(err),
    };

    println!("{}", serde_json::to_string_pretty(&artifact)?);
    if !artifact.is_ok() {
        bail!("compilation failed");
    }
    Ok(())
}
