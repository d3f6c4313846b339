//! Stylesheet transformers.
//!
//! The engine produces a [`MergedConfiguration`] and a stylesheet template;
//! turning those into final CSS is the job of a [`StylesheetTransformer`].
//! Two are provided:
//!
//! - [`CssTransformer`]: validates the template with `cssparser` and can
//!   minify it. No external tooling required.
//! - [`CommandTransformer`]: pipes the template through an external command
//!   (a utility-class generator, typically) and returns its stdout.

mod command;
mod native;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransformError;
use crate::theme::{MergedConfiguration, ThemeConfig};

pub use command::CommandTransformer;
pub use native::CssTransformer;

/// Per-call transformer options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Run the optimizing post-processing step.
    pub minify: bool,
}

impl TransformOptions {
    pub fn minify(minify: bool) -> Self {
        Self { minify }
    }
}

/// Turns a merged configuration and a stylesheet template into CSS.
#[async_trait]
pub trait StylesheetTransformer: Send + Sync {
    /// Transforms `template` under `config`.
    ///
    /// Failures carry the transformer's own message and, where possible, an
    /// excerpt of the offending template text.
    async fn transform(
        &self,
        config: &MergedConfiguration,
        template: &str,
        options: TransformOptions,
    ) -> Result<String, TransformError>;

    /// Default theme values used when a preset asks for full resolution.
    fn base_theme(&self) -> ThemeConfig {
        ThemeConfig::default()
    }
}

#[async_trait]
impl<T: StylesheetTransformer + ?Sized> StylesheetTransformer for Arc<T> {
    async fn transform(
        &self,
        config: &MergedConfiguration,
        template: &str,
        options: TransformOptions,
    ) -> Result<String, TransformError> {
        (**self).transform(config, template, options).await
    }

    fn base_theme(&self) -> ThemeConfig {
        (**self).base_theme()
    }
}

#[async_trait]
impl<T: StylesheetTransformer + ?Sized> StylesheetTransformer for Box<T> {
    async fn transform(
        &self,
        config: &MergedConfiguration,
        template: &str,
        options: TransformOptions,
    ) -> Result<String, TransformError> {
        (**self).transform(config, template, options).await
    }

    fn base_theme(&self) -> ThemeConfig {
        (**self).base_theme()
    }
}
