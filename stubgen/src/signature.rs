//! Structured view of a declared function type.
use log::debug;

use crate::{
    config::Config,
    syntax::{
        self, Spanned,
        ast::{FunctionTypeExpr, TypeExpr},
        slice_text,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    /// Any spelling of the "no value" type.
    Void,
    /// Verbatim return type text, whitespace-normalized.
    Named(String),
}

impl ReturnType {
    pub fn is_void(&self) -> bool {
        matches!(self, ReturnType::Void)
    }

    /// Text used inside a `<#...#>` editor placeholder.
    pub fn placeholder_name(&self) -> &str {
        match self {
            ReturnType::Void => "Void",
            ReturnType::Named(name) => name,
        }
    }
}

/// The two independent effect qualifiers of a function type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Effects {
    /// `throws`
    pub may_fail: bool,
    /// `async`
    pub may_suspend: bool,
}

impl Effects {
    /// Markers prefixed to a call of a function carrying these effects.
    pub fn call_markers(&self) -> &'static str {
        match (self.may_fail, self.may_suspend) {
            (false, false) => "",
            (true, false) => "try ",
            (false, true) => "await ",
            (true, true) => "try await ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub parameter_count: usize,
    pub return_type: ReturnType,
    pub effects: Effects,
    /// Attribute group wrapping the function type, e.g. `@Sendable`.
    pub wrapper: Option<String>,
    /// The full declared type, wrapper included, as it is reattached to generated code.
    pub rendered: String,
}

impl FunctionSignature {
    /// Parse a standalone type annotation.
    ///
    /// Returns `None` both for text that is not a type and for types that are not
    /// (possibly attributed) function types.
    pub fn from_type_text(text: &str, config: &Config) -> Option<Self> {
        let ty = syntax::parse_type(text).ok()?;
        parse_signature(text, &ty, config)
    }
}

/// Extract a [`FunctionSignature`] from a type annotation.
///
/// A single attribute group is unwrapped once; every other shape (named, optional,
/// tuple, parenthesized function types) is rejected.
pub fn parse_signature(
    source: &str,
    ty: &Spanned<TypeExpr>,
    config: &Config,
) -> Option<FunctionSignature> {
    let (expr, span) = ty;
    let (function, wrapper) = match expr {
        TypeExpr::Function(function) => (function, None),
        TypeExpr::Attributed { attributes, base } => match &base.0 {
            TypeExpr::Function(function) => (function, Some(slice_text(source, *attributes))),
            _ => return None,
        },
        _ => return None,
    };

    let signature = FunctionSignature {
        parameter_count: function.parameters.len(),
        return_type: return_type_of(source, function, config),
        effects: Effects {
            may_fail: function.throws.is_some(),
            may_suspend: function.asyncness.is_some(),
        },
        wrapper,
        rendered: slice_text(source, *span),
    };
    debug!(
        "Parsed signature `{}`: {} parameter(s), returns {:?}, {:?}",
        signature.rendered, signature.parameter_count, signature.return_type, signature.effects
    );
    Some(signature)
}

fn return_type_of(source: &str, function: &FunctionTypeExpr, config: &Config) -> ReturnType {
    let (expr, span) = function.return_type.as_ref();
    match expr {
        TypeExpr::Tuple(elements) if elements.is_empty() => ReturnType::Void,
        TypeExpr::Named { path, arguments } if arguments.is_empty() && config.is_void_name(path) => {
            ReturnType::Void
        }
        _ => ReturnType::Named(slice_text(source, *span)),
    }
}
