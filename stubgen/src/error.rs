use thiserror::Error;

use crate::syntax::Span;

/// A lexing or parsing failure inside a compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (at byte range {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

/// Failures that are not attributable to a single annotated declaration.
///
/// Per-declaration problems (non-function types, missing defaults, forbidden
/// initializers) are reported as [`crate::diagnostics::Diagnostic`] values instead and
/// never surface through this type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("The compilation unit contains {} syntax error(s)", .0.len())]
    Syntax(Vec<SyntaxError>),

    #[error("Fix-it range {start}..{end} lies outside of the source text ({len} bytes)")]
    FixOutOfRange { start: usize, end: usize, len: usize },

    #[error("Fix-it for '{property}' overlaps a previously applied fix-it at byte {at}")]
    OverlappingFixes { property: String, at: usize },

    #[error("A worker thread panicked while expanding declarations in parallel")]
    WorkerPanicked,
}

pub type Result<T> = std::result::Result<T, Error>;
