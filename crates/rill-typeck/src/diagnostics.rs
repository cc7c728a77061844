//! Ariadne-based diagnostic rendering for type errors.
//!
//! Each [`TypeError`] renders as a report with an error code, a terse
//! message, one labeled span, and a help line when a likely fix exists. In
//! JSON mode the same information is emitted as a single-line JSON object.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::TypeError;

/// How diagnostics are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiagnosticOptions {
    /// ANSI colors in human-readable output.
    pub color: bool,
    /// One JSON object per diagnostic instead of a report.
    pub json: bool,
}

impl DiagnosticOptions {
    /// Plain text without colors (deterministic, for tests and pipes).
    pub fn colorless() -> Self {
        DiagnosticOptions {
            color: false,
            json: false,
        }
    }

    pub fn json_mode() -> Self {
        DiagnosticOptions {
            color: false,
            json: true,
        }
    }
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        DiagnosticOptions {
            color: true,
            json: false,
        }
    }
}

// ── Error Codes ────────────────────────────────────────────────────────

pub fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::UnboundVariable { .. } => "E0001",
        TypeError::UnresolvedMethod { .. } => "E0002",
        TypeError::NoBlockGiven { .. } => "E0003",
        TypeError::ArityMismatch { .. } => "E0004",
        TypeError::RecursionLimitExceeded { .. } => "E0005",
    }
}

fn label_text(err: &TypeError) -> String {
    match err {
        TypeError::UnboundVariable { name, .. } => format!("`{}` is not bound here", name),
        TypeError::UnresolvedMethod { name, .. } => format!("no method named `{}`", name),
        TypeError::NoBlockGiven { .. } => "this yield has no block to call".to_string(),
        TypeError::ArityMismatch {
            expected, found, ..
        } => format!(
            "expected {} argument{}, found {}",
            expected,
            if *expected == 1 { "" } else { "s" },
            found
        ),
        TypeError::RecursionLimitExceeded { limit, .. } => {
            format!("nested method inference deeper than {}", limit)
        }
    }
}

// ── Fix Suggestions ────────────────────────────────────────────────────

fn fix_suggestion(err: &TypeError) -> Option<String> {
    match err {
        TypeError::UnboundVariable { name, .. } => {
            Some(format!("assign `{}` before reading it", name))
        }
        TypeError::UnresolvedMethod { name, method, .. } => Some(match method {
            Some(m) => format!(
                "define `{}` with `def`; locals of the caller are not visible inside `{}`",
                name, m
            ),
            None => format!("define `{}` with `def`", name),
        }),
        TypeError::NoBlockGiven { method: Some(m), .. } => {
            Some(format!("pass a block when calling `{}`", m))
        }
        TypeError::NoBlockGiven { method: None, .. } => None,
        TypeError::ArityMismatch { .. } => None,
        TypeError::RecursionLimitExceeded { .. } => {
            Some("raise `max_depth` in the `[typeck]` table of rill.toml".to_string())
        }
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Clamp `span` to `source` and make it at least one byte wide where possible.
fn clamp(span: Range<usize>, source_len: usize) -> Range<usize> {
    let s = span.start.min(source_len);
    let e = span.end.min(source_len).max(s);
    if s == e {
        s..e.saturating_add(1).min(source_len)
    } else {
        s..e
    }
}

/// Render a type error as a report, or as a single JSON line (no trailing
/// newline) when `opts.json` is set.
pub fn render_diagnostic(
    error: &TypeError,
    source: &str,
    filename: &str,
    opts: &DiagnosticOptions,
) -> String {
    let span = clamp(error.span().to_range(), source.len());
    let code = error_code(error);
    let label = label_text(error);
    let fix = fix_suggestion(error);

    if opts.json {
        let json = serde_json::json!({
            "code": code,
            "severity": "error",
            "message": error.to_string(),
            "file": filename,
            "method": error.method(),
            "spans": [{
                "start": span.start,
                "end": span.end,
                "label": label,
            }],
            "fix": fix,
        });
        return json.to_string();
    }

    let config = Config::default().with_color(opts.color);
    let mut builder = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(error.to_string())
        .with_config(config)
        .with_label(Label::new(span).with_message(label).with_color(Color::Red));
    if let Some(method) = error.method() {
        builder = builder.with_note(format!("while inferring the body of `{}`", method));
    }
    if let Some(fix) = fix {
        builder = builder.with_help(fix);
    }

    let mut buf = Vec::new();
    if let Err(err) = builder.finish().write(Source::from(source), &mut buf) {
        return format!("error[{}]: {} ({})\n", code, error, err);
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_widens_empty_spans() {
        assert_eq!(clamp(3..3, 10), 3..4);
        assert_eq!(clamp(8..20, 10), 8..10);
        assert_eq!(clamp(12..15, 10), 10..10);
    }
}
