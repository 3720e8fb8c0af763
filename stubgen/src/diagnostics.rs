//! Per-declaration diagnostics, their fix-its, and the shared sink collecting them.
use std::fmt;

use parking_lot::Mutex;
use strum::{EnumIs, EnumIter, IntoStaticStr};

use crate::{
    error::{Error, Result},
    syntax::Span,
};

/// Why a declaration could not be expanded. Every kind is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIs, EnumIter, IntoStaticStr)]
pub enum DiagnosticKind {
    /// The declared type is not a (possibly attributed) function type.
    #[strum(serialize = "closure-property")]
    SignatureMismatch,
    /// A value-returning, non-throwing endpoint has no default.
    #[strum(serialize = "missing-default")]
    MissingDefault,
    /// A config-argument endpoint carries its own initializer.
    #[strum(serialize = "conflicting-initializer")]
    ConflictingInitializer,
}

impl DiagnosticKind {
    /// Stable identifier, e.g. `missing-default`.
    pub fn id(self) -> &'static str {
        self.into()
    }
}

/// A mechanical correction: replace `range` of the source with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fix {
    pub description: String,
    pub replacement: String,
    pub range: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Name of the declaration the diagnostic belongs to.
    pub property: String,
    /// The sub-node that caused the diagnostic.
    pub span: Span,
    pub message: String,
    pub fix: Option<Fix>,
}

impl Diagnostic {
    pub fn signature_mismatch(attribute: &str, property: &str, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::SignatureMismatch,
            property: property.to_string(),
            span,
            message: format!("'@{attribute}' must be attached to closure property"),
            fix: None,
        }
    }

    /// Config-argument mode: `rewritten` is the complete attribute with the placeholder
    /// argument added.
    pub fn missing_config_argument(
        label: &str,
        placeholder: &str,
        property: &str,
        attribute_span: Span,
        rewritten: String,
    ) -> Self {
        Self {
            kind: DiagnosticKind::MissingDefault,
            property: property.to_string(),
            span: attribute_span,
            message: format!("Missing argument for parameter '{label}' in call"),
            fix: Some(Fix {
                description: format!("Insert '{label}: {placeholder}'"),
                replacement: rewritten,
                range: attribute_span,
            }),
        }
    }

    /// Initializer mode: `closure` is inserted as the initial value right after the binding.
    pub fn missing_initial_value(property: &str, binding_span: Span, closure: &str) -> Self {
        let insertion_point = binding_span.end;
        Self {
            kind: DiagnosticKind::MissingDefault,
            property: property.to_string(),
            span: binding_span,
            message: format!("Missing initial value for non-throwing '{property}'"),
            fix: Some(Fix {
                description: format!("Insert '= {closure}'"),
                replacement: format!(" = {closure}"),
                range: (insertion_point..insertion_point).into(),
            }),
        }
    }

    /// `removal` covers the initializer together with the whitespace in front of it.
    pub fn conflicting_initializer(
        attribute: &str,
        property: &str,
        initializer_span: Span,
        removal: Span,
    ) -> Self {
        Self {
            kind: DiagnosticKind::ConflictingInitializer,
            property: property.to_string(),
            span: initializer_span,
            message: format!("'@{attribute}' property must not have initial value"),
            fix: Some(Fix {
                description: "Remove initial value".to_string(),
                replacement: String::new(),
                range: removal,
            }),
        }
    }

    pub fn id(&self) -> &'static str {
        self.kind.id()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.id(), self.message)?;
        if let Some(fix) = &self.fix {
            write!(f, " (fix: {})", fix.description)?;
        }
        Ok(())
    }
}

/// Append-only collection point shared by every declaration of a unit.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    records: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.records.lock().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Every diagnostic, ordered by source location.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut records = self.records.into_inner();
        records.sort_by_key(|d| (d.span.start, d.span.end, d.kind));
        records
    }
}

/// Apply the fix-it of every diagnostic to `source`.
///
/// Fixes are applied from the end of the text backwards so earlier ranges stay valid.
/// Overlapping fixes and ranges outside of the text are rejected.
pub fn apply_fixes(source: &str, diagnostics: &[Diagnostic]) -> Result<String> {
    let mut fixes: Vec<(&str, &Fix)> = diagnostics
        .iter()
        .filter_map(|d| d.fix.as_ref().map(|fix| (d.property.as_str(), fix)))
        .collect();
    fixes.sort_by_key(|(_, fix)| std::cmp::Reverse((fix.range.start, fix.range.end)));

    let mut output = source.to_string();
    let mut limit = source.len();
    for (property, fix) in fixes {
        let (start, end) = (fix.range.start, fix.range.end);
        if start > end
            || end > source.len()
            || !source.is_char_boundary(start)
            || !source.is_char_boundary(end)
        {
            return Err(Error::FixOutOfRange {
                start,
                end,
                len: source.len(),
            });
        }
        if end > limit {
            return Err(Error::OverlappingFixes {
                property: property.to_string(),
                at: limit,
            });
        }
        output.replace_range(start..end, &fix.replacement);
        limit = start;
    }
    Ok(output)
}
