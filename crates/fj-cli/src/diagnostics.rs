//! Error reporting for the `fj` binary.

use crate::{CliError, Result};
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use std::path::Path;
use thiserror::Error;

/// Installs miette as the global report handler.
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))
}

#[derive(Error, Debug, Diagnostic)]
pub enum FjDiagnostic {
    #[error("invalid IR: {message}")]
    #[diagnostic(
        code(fj::invalid_ir),
        help("the input must be a class serialized as JSON by fj-ir")
    )]
    InvalidIr {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("method {method} was not lowered: {reason}")]
    #[diagnostic(
        code(fj::method_failed),
        severity(Warning),
        help("the method is left out of the class; pass --fail-fast to abort instead")
    )]
    MethodFailed { method: String, reason: String },

    #[error("{path} is not a lowered class artifact: {reason}")]
    #[diagnostic(code(fj::bad_artifact), help("produce one with `fj lower`"))]
    BadArtifact { path: String, reason: String },
}

/// Builds an [`FjDiagnostic::InvalidIr`] pointing at the position serde_json
/// reported.
pub fn invalid_ir(path: &Path, text: &str, error: &serde_json::Error) -> FjDiagnostic {
    let span = (error.line() > 0).then(|| {
        let offset = byte_offset(text, error.line(), error.column());
        SourceSpan::from((offset, 0))
    });
    FjDiagnostic::InvalidIr {
        message: error.to_string(),
        src: NamedSource::new(path.display().to_string(), text.to_string()),
        span,
    }
}

pub fn method_failed(failure: &fj_lower::MethodFailure) -> FjDiagnostic {
    FjDiagnostic::MethodFailed {
        method: failure.method.clone(),
        reason: failure.error.to_string(),
    }
}

/// Converts a 1-based line/column pair into a byte offset in `text`.
fn byte_offset(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

/// Renders a diagnostic without colors, falling back to its message.
pub fn render_diagnostic(diagnostic: &dyn Diagnostic) -> String {
    let mut out = String::new();
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    match handler.render_report(&mut out, diagnostic) {
        Ok(()) => out,
        Err(_) => diagnostic.to_string(),
    }
}

pub fn print_diagnostic(diagnostic: &dyn Diagnostic) {
    eprintln!("{}", render_diagnostic(diagnostic));
}

/// Prints `error` as a diagnostic if it carries one. Returns whether
/// anything was printed.
pub fn render_cli_error(error: &CliError) -> bool {
    match error {
        CliError::Diagnostic(diagnostic) => {
            print_diagnostic(diagnostic);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_lines_and_columns() {
        let text = "{\n  \"a\": 1,\n  \"b\": ?\n}";
        assert_eq!(byte_offset(text, 1, 1), 0);
        assert_eq!(byte_offset(text, 2, 3), 4);
        assert_eq!(&text[byte_offset(text, 3, 8)..byte_offset(text, 3, 9)], "?");
        assert_eq!(byte_offset(text, 9, 9), text.len());
    }

    #[test]
    fn invalid_ir_points_into_the_source() {
        let text = "{\n  \"name\": ?\n}";
        let error = serde_json::from_str::<serde_json::Value>(text).unwrap_err();
        let diagnostic = invalid_ir(Path::new("Main.json"), text, &error);

        match &diagnostic {
            FjDiagnostic::InvalidIr { span, .. } => {
                let span = span.expect("serde_json reports a position");
                assert!(span.offset() > 0 && span.offset() <= text.len());
            }
            other => panic!("unexpected diagnostic {:?}", other),
        }
        let rendered = render_diagnostic(&diagnostic);
        assert!(rendered.contains("fj::invalid_ir"), "{}", rendered);
        assert!(rendered.contains("Main.json"), "{}", rendered);
    }
}
