use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

/// Byte range of a token or construct in the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Clamped into `0..=len`; an EOF token sits one past the last byte.
    fn clamp_to(self, len: usize) -> Range<usize> {
        let end = self.end.min(len);
        self.start.min(end)..end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ParseError,
    RuntimeError,
}

impl ErrorKind {
    fn title(self) -> &'static str {
        match self {
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::RuntimeError => "Runtime Error",
        }
    }

    fn color(self) -> Color {
        match self {
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        }
    }
}

/// A diagnostic produced while turning source text into a result.
///
/// Parse errors are collected by the parser; runtime errors are only lifted
/// into this type at the outer surfaces, since the evaluator itself reports
/// failures as `Object::Error` values.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct YailError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl YailError {
    pub fn syntax(span: Span, message: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ParseError,
            span,
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn runtime(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::RuntimeError,
            span,
            message: message.into(),
            help: None,
        }
    }

    /// Renders the diagnostic to stderr with the offending source labelled.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");
        let color = self.kind.color();
        let range = self.span.clamp_to(source.len());

        let mut report = Report::build(ReportKind::Error, filename, range.start)
            .with_message(format!("{}: {}", self.kind.title().fg(color), self.message))
            .with_label(
                Label::new((filename, range))
                    .with_message(&self.message)
                    .with_color(color),
            );
        if let Some(help) = &self.help {
            report = report.with_note(format!("{}: {}", "help".fg(Color::Cyan), help));
        }

        if let Err(error) = report.finish().eprint((filename, Source::from(source))) {
            tracing::warn!(%error, "failed to render diagnostic");
            eprintln!("{}: {}", self.kind.title(), self.message);
        }
    }
}
