//! Transformer that shells out to an external command.
//!
//! The template is piped to the command's stdin and its stdout is the
//! transformed stylesheet. Two placeholders are substituted in the command
//! line before it runs:
//!
//! | Placeholder | Replaced with |
//! |-------------|---------------|
//! | `{config}`  | path of a temporary file holding the merged configuration JSON |
//! | `{minify}`  | `--minify` when minification is requested, nothing otherwise |
//!
//! ```text
//! tailwindcss --config {config} --input - --output - {minify}
//! ```

use std::io::{self, Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::{StylesheetTransformer, TransformOptions};
use crate::error::TransformError;
use crate::theme::{MergedConfiguration, ThemeConfig};

const CONFIG_PLACEHOLDER: &str = "{config}";
const MINIFY_PLACEHOLDER: &str = "{minify}";
const MINIFY_FLAG: &str = "--minify";

#[derive(Debug, Error)]
enum ShellError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("command `{0}` timed out after {1:?}")]
    Timeout(String, Duration),
    #[error("command `{command}` failed with {status}{}", stderr_suffix(.stderr))]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("command output was not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Runs an external command as the stylesheet transformer.
#[derive(Debug, Clone)]
pub struct CommandTransformer {
    command: String,
    timeout: Option<Duration>,
    base_theme: ThemeConfig,
}

impl CommandTransformer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            base_theme: ThemeConfig::default(),
        }
    }

    /// Kills the command if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the defaults merged in for presets that ask for full resolution.
    pub fn with_base_theme(mut self, theme: ThemeConfig) -> Self {
        self.base_theme = theme;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn command_line(&self, config_path: &str, minify: bool) -> String {
        self.command
            .replace(CONFIG_PLACEHOLDER, &shell_quote(config_path))
            .replace(MINIFY_PLACEHOLDER, if minify { MINIFY_FLAG } else { "" })
    }
}

#[async_trait]
impl StylesheetTransformer for CommandTransformer {
    async fn transform(
        &self,
        config: &MergedConfiguration,
        template: &str,
        options: TransformOptions,
    ) -> Result<String, TransformError> {
        let json = config
            .to_json()
            .map_err(|e| TransformError::new(e.to_string()))?;

        let mut config_file = tempfile::Builder::new()
            .prefix("wds-config-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| TransformError::new(format!("failed to create config file: {}", e)))?;
        config_file
            .write_all(json.as_bytes())
            .and_then(|_| config_file.flush())
            .map_err(|e| TransformError::new(format!("failed to write config file: {}", e)))?;

        let command = self.command_line(&config_file.path().to_string_lossy(), options.minify);
        let input = template.to_string();
        let timeout = self.timeout;
        debug!(command = %command, "running transformer command");

        let result = tokio::task::spawn_blocking(move || run_piped(&command, &input, timeout))
            .await
            .map_err(|e| TransformError::new(format!("transformer task failed: {}", e)))?;

        // The config file is removed on drop, after the command has exited.
        drop(config_file);

        result.map_err(|e| {
            warn!(error = %e, "transformer command failed");
            TransformError::new(e.to_string())
        })
    }

    fn base_theme(&self) -> ThemeConfig {
        self.base_theme.clone()
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Execute a shell command with the given input piped to stdin.
///
/// Returns the command's stdout on success; stderr is captured for the
/// failure message. stdin is fed and stdout and stderr are drained on their
/// own threads, so a full pipe in either direction cannot block the wait.
fn run_piped(command_str: &str, input: &str, timeout: Option<Duration>) -> Result<String, ShellError> {
    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(command_str);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(command_str);
        c
    };

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    // Fed from its own thread so a command that never reads its input
    // cannot hold us ahead of the timeout.
    let stdin = child.stdin.take().map(|pipe| feed(pipe, input.as_bytes().to_vec()));

    let status = match timeout {
        Some(duration) => match child.wait_timeout(duration)? {
            Some(status) => status,
            None => {
                child.kill()?;
                let _ = child.wait();
                return Err(ShellError::Timeout(command_str.to_string(), duration));
            }
        },
        None => child.wait()?,
    };

    if let Some(handle) = stdin {
        handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "pipe writer panicked"))??;
    }
    let output = collect(stdout)?;
    let errors = collect(stderr)?;

    if !status.success() {
        return Err(ShellError::CommandFailed {
            command: command_str.to_string(),
            status,
            stderr: String::from_utf8_lossy(&errors).trim().to_string(),
        });
    }

    Ok(String::from_utf8(output)?)
}

fn feed<W: Write + Send + 'static>(mut pipe: W, input: Vec<u8>) -> JoinHandle<io::Result<()>> {
    thread::spawn(move || match pipe.write_all(&input) {
        // The command may exit without reading its input.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>, ShellError> {
    match handle {
        None => Ok(Vec::new()),
        Some(handle) => handle
            .join()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "pipe reader panicked"))?
            .map_err(ShellError::from),
    }
}
