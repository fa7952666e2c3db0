//! How `insp` writes results and errors.
//!
//! Results go to stdout as pretty sections on a terminal, tab-separated text
//! in a pipe, or pretty-printed JSON. Errors go to stderr in the same mode, so
//! `insp ... --json 2>err.json` yields one JSON document on each stream.
//!
//! The mode is picked from `--format`, then `--json`, then the `FORMAT`
//! environment variable, and finally from whether stdout is a terminal.

use clap::ValueEnum;
use inspo_core::error::ErrorCode;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const RULE: &str = "------------------------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and indentation for reading in a terminal.
    Pretty,
    /// Tab-separated rows for `cut`, `awk` and friends.
    Text,
    /// Stable JSON for scripts.
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn pick(format: Option<Self>, json: bool, env: Option<&str>, stdout_is_tty: bool) -> Self {
        format
            .or_else(|| json.then_some(Self::Json))
            .or_else(|| env.and_then(|raw| <Self as ValueEnum>::from_str(raw.trim(), true).ok()))
            .unwrap_or(if stdout_is_tty { Self::Pretty } else { Self::Text })
    }
}

pub fn resolve_output_mode(format: Option<OutputMode>, json: bool) -> OutputMode {
    let env = std::env::var("FORMAT").ok();
    OutputMode::pick(format, json, env.as_deref(), io::stdout().is_terminal())
}

pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{RULE}")
}

/// Heading line with a rule underneath.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// `key:` padded to a fixed column, then the value.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<12} {}", format!("{key}:"), value.as_ref())
}

/// Write `value` to stdout as JSON, or through the text or pretty writer.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    match mode {
        OutputMode::Json => write_json(&mut out, value)?,
        OutputMode::Text => text(value, &mut out)?,
        OutputMode::Pretty => pretty(value, &mut out)?,
    }
    Ok(())
}

/// [`render_mode`] for commands whose text and pretty output are the same.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human: impl Fn(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    render_mode(mode, value, &human, &human)
}

fn write_json<T: Serialize>(out: &mut dyn Write, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

/// A failure reported to the user.
///
/// `error_code` is an `E####` library code, or a snake_case tag for CLI-level
/// refusals such as `missing_title` or `confirmation_required`.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    pub fn with_details(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        error_code: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            error_code: Some(error_code.into()),
        }
    }

    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    }

    fn write_to(&self, mode: OutputMode, out: &mut dyn Write) -> io::Result<()> {
        if mode.is_json() {
            return write_json(out, &serde_json::json!({ "error": self }));
        }
        writeln!(out, "error: {}", self.message)?;
        match &self.suggestion {
            Some(suggestion) => writeln!(out, "  suggestion: {suggestion}"),
            None => Ok(()),
        }
    }
}

/// Print `error` to stderr and return it as an [`anyhow::Error`] so the
/// process exits non-zero: `return Err(fail(output, &err))`.
pub fn fail(mode: OutputMode, error: &CliError) -> anyhow::Error {
    if let Err(err) = error.write_to(mode, &mut io::stderr().lock()) {
        tracing::warn!(error = %err, "could not print error");
    }
    anyhow::anyhow!("{}", error.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_beat_environment() {
        assert_eq!(
            OutputMode::pick(Some(OutputMode::Text), true, Some("pretty"), true),
            OutputMode::Text
        );
        assert_eq!(OutputMode::pick(None, true, Some("text"), true), OutputMode::Json);
    }

    #[test]
    fn environment_is_read_case_insensitively() {
        assert_eq!(OutputMode::pick(None, false, Some(" JSON "), true), OutputMode::Json);
        assert_eq!(OutputMode::pick(None, false, Some("Text"), true), OutputMode::Text);
    }

    #[test]
    fn terminal_decides_when_nothing_else_does() {
        assert_eq!(OutputMode::pick(None, false, Some("yaml"), true), OutputMode::Pretty);
        assert_eq!(OutputMode::pick(None, false, None, false), OutputMode::Text);
    }

    #[test]
    fn human_error_includes_suggestion() {
        let err = CliError::from_code(ErrorCode::NotInitialized, "no board here");
        let mut buf = Vec::new();
        err.write_to(OutputMode::Text, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("error: no board here\n"));
        assert!(text.contains("insp init"));
    }

    #[test]
    fn json_error_is_wrapped_and_skips_empty_fields() {
        let err = CliError {
            message: "boom".to_string(),
            suggestion: None,
            error_code: Some("E9001".to_string()),
        };
        let mut buf = Vec::new();
        err.write_to(OutputMode::Json, &mut buf).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json["error"]["message"], "boom");
        assert_eq!(json["error"]["error_code"], "E9001");
        assert!(json["error"].get("suggestion").is_none());
    }
}
