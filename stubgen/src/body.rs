//! Fallback implementation bodies.
//!
//! A [`Body`] is the statement list of the closure stored as an endpoint's default value.
//! Statements written by the author are kept as text; statements the pass generates itself
//! are structured so the renderer decides their spelling.
use std::fmt;

use crate::{
    signature::Effects,
    syntax::{ast::ClosureExpr, column_of, slice_text},
};

/// Words that start a statement which is never a bare expression.
const STATEMENT_KEYWORDS: [&str; 14] = [
    "return", "throw", "let", "var", "if", "guard", "for", "while", "repeat", "switch", "do",
    "defer", "func", "break",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Report a test failure for the property.
    ReportFailure { property: String },
    /// Raise the "unimplemented" failure for the property.
    RaiseUnimplemented { property: String },
    /// `return <expression>`
    Return(String),
    /// A bare expression, whose value is the closure result when it is the only statement.
    Expression(String),
    /// Any other author statement, copied as written.
    Verbatim(String),
    /// Call another function with every closure argument.
    Forward(ForwardingCall),
}

/// `return try await callee($0, $1)`, spelled according to the signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForwardingCall {
    pub callee: String,
    pub arity: usize,
    pub effects: Effects,
    /// Whether the callee's result is returned; Void calls discard it.
    pub returns_value: bool,
}

impl ForwardingCall {
    /// Positional argument list `$0, $1, ...`.
    pub fn arguments(&self) -> String {
        (0..self.arity)
            .map(|n| format!("${n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ForwardingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple_callee = self
            .callee
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'));
        if self.returns_value {
            write!(f, "return ")?;
        }
        write!(f, "{}", self.effects.call_markers())?;
        if simple_callee {
            write!(f, "{}({})", self.callee, self.arguments())
        } else {
            write!(f, "({})({})", self.callee, self.arguments())
        }
    }
}

impl Statement {
    /// Classify one author statement.
    pub fn classify(text: impl Into<String>) -> Self {
        let text = text.into();
        let first_word = text
            .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
            .next()
            .unwrap_or_default();
        if STATEMENT_KEYWORDS.contains(&first_word) {
            Statement::Verbatim(text)
        } else {
            Statement::Expression(text)
        }
    }

    pub fn is_bare_expression(&self) -> bool {
        matches!(self, Statement::Expression(_))
    }
}

/// How the default closure names its parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParameterClause {
    /// No clause; the closure takes no parameters or only refers to `$n`.
    Empty,
    /// `_, _ in` with the given number of wildcards.
    Wildcards(usize),
    /// The author's own clause, without the trailing `in`.
    Verbatim(String),
}

impl ParameterClause {
    /// Clause for a synthesized closure ignoring all of its `arity` parameters.
    pub fn ignoring(arity: usize) -> Self {
        if arity == 0 {
            ParameterClause::Empty
        } else {
            ParameterClause::Wildcards(arity)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Body {
    pub parameters: ParameterClause,
    pub statements: Vec<Statement>,
}

impl Body {
    pub fn new(parameters: ParameterClause, statements: Vec<Statement>) -> Self {
        Self {
            parameters,
            statements,
        }
    }

    /// Body of an author-written closure expression.
    pub fn from_closure(source: &str, closure: &ClosureExpr) -> Self {
        let parameters = match closure.signature {
            Some(span) if span.start < span.end => {
                ParameterClause::Verbatim(slice_text(source, span))
            }
            _ => ParameterClause::Empty,
        };
        let statements = closure
            .statements
            .iter()
            .map(|span| {
                let column = column_of(source, span.start);
                Statement::classify(dedent(&source[span.start..span.end], column))
            })
            .collect();
        Self::new(parameters, statements)
    }

    /// Prepend a statement, keeping the parameter clause.
    pub fn prepend(mut self, statement: Statement) -> Self {
        self.statements.insert(0, statement);
        self
    }
}

/// Remove up to `column` leading spaces from every line but the first.
///
/// Multi-line statements keep their indentation relative to the line they start on.
pub fn dedent(text: &str, column: usize) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        out.push('\n');
        out.push_str(&line[indent.min(column)..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_never_bare_expressions() {
        assert!(Statement::classify("true").is_bare_expression());
        assert!(Statement::classify("foo.bar(1)").is_bare_expression());
        assert!(Statement::classify("returnValue").is_bare_expression());
        assert!(!Statement::classify("return true").is_bare_expression());
        assert!(!Statement::classify("throw Failure()").is_bare_expression());
        assert!(!Statement::classify("if flag { 1 } else { 2 }").is_bare_expression());
        assert!(!Statement::classify("let x = 1").is_bare_expression());
    }

    #[test]
    fn dedent_keeps_relative_indentation() {
        let text = "guard ok else {\n      return\n    }";
        assert_eq!(dedent(text, 4), "guard ok else {\n  return\n}");
        assert_eq!(dedent("single", 8), "single");
    }

    #[test]
    fn forwarding_calls_pass_every_argument() {
        let call = ForwardingCall {
            callee: "newValue".into(),
            arity: 3,
            effects: Effects {
                may_fail: true,
                may_suspend: true,
            },
            returns_value: true,
        };
        assert_eq!(call.to_string(), "return try await newValue($0, $1, $2)");

        let call = ForwardingCall {
            callee: "flag ? a : b".into(),
            arity: 0,
            effects: Effects::default(),
            returns_value: false,
        };
        assert_eq!(call.to_string(), "(flag ? a : b)()");
    }

    #[test]
    fn synthesized_clauses() {
        assert_eq!(ParameterClause::ignoring(0), ParameterClause::Empty);
        assert_eq!(ParameterClause::ignoring(3), ParameterClause::Wildcards(3));
    }
}
