//! Error types for preset compilation.
//!
//! [`PresetError`] covers everything that aborts a compilation request:
//! malformed theme text, cyclic `extends` graphs, unknown top-level presets,
//! and documents that fail to load or parse. [`TransformError`] is kept
//! separate because the orchestrator never propagates it; it is folded into
//! the [`CompiledArtifact`](crate::CompiledArtifact) instead.
//!
//! Both convert into a [`Diagnostic`], the serializable payload handed to
//! callers that report failures (HTTP handlers, the CLI).

use std::path::PathBuf;

use serde::Serialize;

/// Errors that abort a compilation request.
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    /// A DSL line has no `:` separator.
    #[error("malformed definition on line {line_number}: '{line}' (expected 'key: value')")]
    MalformedDsl { line_number: usize, line: String },

    /// An `extends` chain revisits a preset that is already being resolved.
    #[error("cyclic extension: {}", .path.join(" -> "))]
    CyclicExtension { path: Vec<String> },

    /// A requested top-level preset could not be found.
    #[error("preset not found: {name}")]
    NotFound { name: String },

    /// A definition document could not be parsed.
    #[error("{}", parse_message(.path.as_ref(), .message))]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    /// The preset store failed to read or write a source.
    #[error("failed to load preset: {message}")]
    Load { message: String },

    /// The merged configuration could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn parse_message(path: Option<&PathBuf>, message: &str) -> String {
    match path {
        Some(p) => format!("failed to parse preset {}: {}", p.display(), message),
        None => format!("failed to parse preset: {}", message),
    }
}

impl PresetError {
    /// Creates a parse error without a source path.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            path: None,
            message: message.into(),
        }
    }

    /// Creates a load error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// The diagnostic kind for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PresetError::MalformedDsl { .. } => ErrorKind::MalformedDsl,
            PresetError::CyclicExtension { .. } => ErrorKind::CyclicExtension,
            PresetError::NotFound { .. } => ErrorKind::NotFound,
            PresetError::Parse { .. } => ErrorKind::Parse,
            PresetError::Load { .. } => ErrorKind::Load,
            PresetError::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Failure reported by a [`StylesheetTransformer`](crate::transform::StylesheetTransformer).
///
/// The message is the transformer's own diagnostic, untouched. `excerpt`
/// holds the offending fragment of the template when the transformer can
/// point at one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransformError {
    pub message: String,
    pub excerpt: Option<String>,
}

impl TransformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            excerpt: None,
        }
    }

    /// Attaches the offending source fragment.
    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }
}

/// Kind tag carried by a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    MalformedDsl,
    CyclicExtension,
    NotFound,
    Transform,
    Parse,
    Load,
    Serialization,
}

/// Structured error payload: kind, message and an optional source excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&PresetError> for Diagnostic {
    fn from(err: &PresetError) -> Self {
        let source = match err {
            PresetError::MalformedDsl { line, .. } => Some(line.clone()),
            _ => None,
        };
        Self {
            kind: err.kind(),
            message: err.to_string(),
            source,
        }
    }
}

impl From<TransformError> for Diagnostic {
    fn from(err: TransformError) -> Self {
        Self {
            kind: ErrorKind::Transform,
            message: err.message,
            source: err.excerpt,
        }
    }
}

/// Result type for preset operations.
pub type Result<T> = std::result::Result<T, PresetError>;
