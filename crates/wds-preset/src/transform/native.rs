//! Built-in transformer on top of `cssparser`.
//!
//! It does not expand utility classes; the template comes back as written,
//! after a token-level check:
//!
//! - every `{`, `(` and `[` block is closed
//! - no stray closing bracket
//! - no unterminated string or malformed `url(...)`
//!
//! With [`TransformOptions::minify`] set, comments are dropped and runs of
//! whitespace collapse to a single space (or to nothing around `{`, `}`,
//! `;` and `,`).

use async_trait::async_trait;
use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, SourceLocation, ToCss, Token};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::debug;

use super::{StylesheetTransformer, TransformOptions};
use crate::error::TransformError;
use crate::theme::{ColorValue, MergedConfiguration, ScreenValue, ThemeConfig};

static BASE_THEME: Lazy<ThemeConfig> = Lazy::new(|| {
    let tokens = |entries: &[(&str, &str)]| -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };

    ThemeConfig {
        screens: Some(
            [("sm", "640px"), ("md", "768px"), ("lg", "1024px"), ("xl", "1280px"), ("2xl", "1536px")]
                .iter()
                .map(|(k, v)| (k.to_string(), ScreenValue::Width(v.to_string())))
                .collect(),
        ),
        colors: Some(
            [
                ("transparent", "transparent"),
                ("current", "currentColor"),
                ("black", "#000"),
                ("white", "#fff"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), ColorValue::Plain(v.to_string())))
            .collect(),
        ),
        spacing: Some(tokens(&[
            ("0", "0px"),
            ("px", "1px"),
            ("1", "0.25rem"),
            ("2", "0.5rem"),
            ("3", "0.75rem"),
            ("4", "1rem"),
            ("6", "1.5rem"),
            ("8", "2rem"),
            ("12", "3rem"),
            ("16", "4rem"),
        ])),
        border_radius: Some(tokens(&[
            ("none", "0px"),
            ("sm", "0.125rem"),
            ("DEFAULT", "0.25rem"),
            ("md", "0.375rem"),
            ("lg", "0.5rem"),
            ("full", "9999px"),
        ])),
        sizes: None,
        extend: IndexMap::new(),
    }
});

/// Validating, optionally minifying, transformer with no external tooling.
#[derive(Debug, Clone, Copy, Default)]
pub struct CssTransformer;

impl CssTransformer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StylesheetTransformer for CssTransformer {
    async fn transform(
        &self,
        _config: &MergedConfiguration,
        template: &str,
        options: TransformOptions,
    ) -> Result<String, TransformError> {
        validate(template)?;
        if options.minify {
            debug!(bytes = template.len(), "minifying stylesheet");
            Ok(minify(template))
        } else {
            Ok(template.to_string())
        }
    }

    fn base_theme(&self) -> ThemeConfig {
        BASE_THEME.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Problem {
    Unclosed(char),
    UnexpectedCloser(char),
    UnterminatedString,
    BadUrl,
}

impl Problem {
    fn message(self) -> String {
        match self {
            Problem::Unclosed(closer) => format!("unclosed block, expected '{}'", closer),
            Problem::UnexpectedCloser(closer) => format!("unexpected '{}'", closer),
            Problem::UnterminatedString => "unterminated string".to_string(),
            Problem::BadUrl => "malformed url()".to_string(),
        }
    }
}

fn problem<'i>(location: SourceLocation, problem: Problem) -> ParseError<'i, Problem> {
    ParseError {
        kind: ParseErrorKind::Custom(problem),
        location,
    }
}

/// Checks that the template tokenizes into balanced blocks.
fn validate(template: &str) -> Result<(), TransformError> {
    let mut input = ParserInput::new(template);
    let mut parser = Parser::new(&mut input);

    match check_tokens(&mut parser) {
        Ok(()) => Ok(()),
        Err(err) => {
            let message = match err.kind {
                ParseErrorKind::Custom(problem) => problem.message(),
                other => format!("{:?}", other),
            };
            let location = err.location;
            let mut error = TransformError::new(format!(
                "{} at line {}, column {}",
                message,
                location.line + 1,
                location.column
            ));
            if let Some(line) = template.lines().nth(location.line as usize) {
                error = error.with_excerpt(line.trim());
            }
            Err(error)
        }
    }
}

fn check_tokens<'i, 't>(parser: &mut Parser<'i, 't>) -> Result<(), ParseError<'i, Problem>> {
    loop {
        let location = parser.current_source_location();
        let closer = match parser.next_including_whitespace_and_comments() {
            Err(_) => return Ok(()),
            Ok(Token::CurlyBracketBlock) => '}',
            Ok(Token::ParenthesisBlock) | Ok(Token::Function(_)) => ')',
            Ok(Token::SquareBracketBlock) => ']',
            Ok(Token::CloseCurlyBracket) => {
                return Err(problem(location, Problem::UnexpectedCloser('}')))
            }
            Ok(Token::CloseParenthesis) => {
                return Err(problem(location, Problem::UnexpectedCloser(')')))
            }
            Ok(Token::CloseSquareBracket) => {
                return Err(problem(location, Problem::UnexpectedCloser(']')))
            }
            Ok(Token::BadString(_)) => return Err(problem(location, Problem::UnterminatedString)),
            Ok(Token::BadUrl(_)) => return Err(problem(location, Problem::BadUrl)),
            Ok(_) => continue,
        };

        let inner_end = parser.parse_nested_block(|nested| {
            check_tokens(nested)?;
            Ok(nested.position())
        })?;

        // Blocks still open at end of input are closed silently; a closed
        // block has consumed its closing token past the inner end.
        if parser.position() == inner_end {
            return Err(problem(location, Problem::Unclosed(closer)));
        }
    }
}

/// Strips comments and collapses whitespace. Expects a validated template.
fn minify(template: &str) -> String {
    let mut input = ParserInput::new(template);
    let mut parser = Parser::new(&mut input);
    let mut out = String::with_capacity(template.len());
    let _ = minify_tokens(&mut parser, &mut out);
    out
}

fn is_tight(c: char) -> bool {
    matches!(c, '{' | '}' | ';' | ',')
}

fn minify_tokens<'i, 't>(
    parser: &mut Parser<'i, 't>,
    out: &mut String,
) -> Result<(), ParseError<'i, ()>> {
    let mut pending_space = false;
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };

        // A comment still separates the tokens around it.
        if matches!(token, Token::WhiteSpace(_) | Token::Comment(_)) {
            pending_space = true;
            continue;
        }

        let starts_tight = matches!(
            token,
            Token::CurlyBracketBlock | Token::Semicolon | Token::Comma
        );
        let after_tight = out.chars().last().map_or(true, is_tight);
        if pending_space && !starts_tight && !after_tight {
            out.push(' ');
        }
        pending_space = false;

        let _ = token.to_css(out);

        let closer = match token {
            Token::CurlyBracketBlock => '}',
            Token::ParenthesisBlock | Token::Function(_) => ')',
            Token::SquareBracketBlock => ']',
            _ => continue,
        };
        parser.parse_nested_block(|nested| minify_tokens(nested, out))?;
        out.push(closer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(template: &str, minify: bool) -> Result<String, TransformError> {
        CssTransformer::new()
            .transform(
                &MergedConfiguration::default(),
                template,
                TransformOptions::minify(minify),
            )
            .await
    }

    #[tokio::test]
    async fn test_passes_template_through() {
        let template = "@tailwind base;\n\n@layer components {\n.btn {\n  @apply px-4;\n}\n}\n";
        assert_eq!(run(template, false).await.unwrap(), template);
    }

    #[tokio::test]
    async fn test_unclosed_block_rejected() {
        let err = run("body {\n  margin: 0;\n.btn { color: red; }\n", false)
            .await
            .unwrap_err();
        assert!(err.message.contains("unclosed block"), "{}", err.message);
        assert!(err.message.contains("line 1"), "{}", err.message);
        assert_eq!(err.excerpt.as_deref(), Some("body {"));
    }

    #[tokio::test]
    async fn test_unclosed_outer_block_after_nested_rule() {
        let err = run("@media print {\n  .a { color: red; }", false)
            .await
            .unwrap_err();
        assert!(err.message.contains("unclosed block"), "{}", err.message);
        assert_eq!(err.excerpt.as_deref(), Some("@media print {"));
    }

    #[tokio::test]
    async fn test_stray_closer_rejected() {
        let err = run(".a { }\n}\n", false).await.unwrap_err();
        assert!(err.message.starts_with("unexpected '}'"), "{}", err.message);
        assert!(err.message.contains("line 2"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_mismatched_closer_inside_block_rejected() {
        let err = run(".a { color: red) }", false).await.unwrap_err();
        assert!(err.message.starts_with("unexpected ')'"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_unterminated_string_rejected() {
        let err = run(".a { content: \"open\n}\n", false).await.unwrap_err();
        assert!(err.message.contains("unterminated string"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_minify() {
        let template = "/* layers */\n@tailwind base;\n\n.btn ,\n.link {\n  @apply px-4  py-2 ;\n  color : red;\n}\n";
        assert_eq!(
            run(template, true).await.unwrap(),
            "@tailwind base;.btn,.link{@apply px-4 py-2;color : red;}"
        );
    }

    #[tokio::test]
    async fn test_minify_keeps_function_arguments() {
        let template = "@media (min-width: 640px) {\n  .a { width: calc(100% - 2rem); }\n}";
        assert_eq!(
            run(template, true).await.unwrap(),
            "@media (min-width: 640px){.a{width: calc(100% - 2rem);}}"
        );
    }

    #[test]
    fn test_base_theme_has_defaults() {
        let theme = CssTransformer::new().base_theme();
        assert_eq!(theme.spacing.unwrap()["4"], "1rem");
        assert!(theme.screens.unwrap().contains_key("md"));
    }
}
