//! Error types and reporting

use crate::align::AlignmentError;
use crate::interp::RuntimeError;
use crate::model::ModelError;
use std::ops::Range;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of a pipeline run
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Malformed persisted program, mapping or input
    #[error("Decode error in {origin}: {source}")]
    Decode {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl Error {
    pub fn decode(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            origin: origin.into(),
            source,
        }
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Byte range of the offending text in `source`, for decode errors
    pub fn span_in(&self, source: &str) -> Option<Range<usize>> {
        let Self::Decode { source: err, .. } = self else {
            return None;
        };
        let line_start: usize = source
            .split_inclusive('\n')
            .take(err.line().saturating_sub(1))
            .map(str::len)
            .sum();
        let start = (line_start + err.column().saturating_sub(1)).min(source.len());
        let end = source
            .get(start..)
            .and_then(|rest| rest.char_indices().nth(1))
            .map_or(source.len(), |(i, _)| start + i);
        Some(start..end)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Alignment(_) => "Alignment",
            Self::Model(_) => "Model",
            Self::Runtime(_) => "Runtime",
            Self::Decode { .. } => "Decode",
            Self::Io { .. } => "IO",
        }
    }
}

/// Print an error report for `filename` whose content is `source`
pub fn report_error(filename: &str, source: &str, error: &Error) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let kind = error.kind();
    match error.span_in(source) {
        Some(span) => Report::build(ReportKind::Error, (filename, span.clone()))
            .with_message(format!("{kind} error"))
            .with_label(
                Label::new((filename, span))
                    .with_message(error.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((filename, Source::from(source))),
        None => Report::build(ReportKind::Error, (filename, 0..0))
            .with_message(format!("{kind} error: {error}"))
            .finish()
            .eprint((filename, Source::from(source))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Program;

    #[test]
    fn test_decode_span_points_at_error() {
        let source = "{\n  \"fncs\": {},\n  \"tokentype\": 7\n}";
        let err = Program::from_json(source).unwrap_err();
        let err = Error::decode("p.json", err);
        let span = err.span_in(source).unwrap();
        let line_start = source.find("  \"tokentype\"").unwrap();
        assert!(span.start >= line_start);
        assert!(span.end <= source.len());
    }

    #[test]
    fn test_non_decode_has_no_span() {
        let err = Error::from(AlignmentError::SameFunctionNotFound);
        assert_eq!(err.span_in("{}"), None);
        assert_eq!(err.to_string(), "Alignment failed, same function not found");
    }

    #[test]
    fn test_runtime_error_wraps() {
        let err = Error::from(RuntimeError::undefined_function("main"));
        assert!(err.to_string().contains("undefined function: main"));
    }
}
