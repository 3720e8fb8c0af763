//! Owned syntax tree for compilation units.
//!
//! Only the shapes the endpoint pass cares about are modelled structurally: property
//! declarations (with their attributes, type annotation and initializer) and the containers
//! that hold them. Everything else survives as [`Item::Other`] spans and is copied through
//! untouched. All spans are byte offsets into the unit's source text.
use super::{Span, Spanned};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Container(ContainerDecl),
    Property(PropertyDecl),
    Other(Span),
}

/// `struct`, `class`, `enum`, `actor`, `extension` or `protocol` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDecl {
    pub keyword: Spanned<String>,
    pub name: Spanned<String>,
    pub items: Vec<Item>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: Spanned<String>,
    /// `None` for a bare attribute, `Some(vec![])` for `@Name()`.
    pub arguments: Option<Vec<AttributeArgument>>,
    pub span: Span,
}

impl Attribute {
    /// Find the argument carrying `label`.
    pub fn argument(&self, label: &str) -> Option<&AttributeArgument> {
        self.arguments
            .iter()
            .flatten()
            .find(|arg| arg.label.as_ref().is_some_and(|(l, _)| l == label))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeArgument {
    pub label: Option<Spanned<String>>,
    pub value: Span,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKeyword {
    Var,
    Let,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub attributes: Vec<Attribute>,
    pub modifiers: Vec<Spanned<String>>,
    pub keyword: Spanned<BindingKeyword>,
    pub name: Spanned<String>,
    pub ty: Option<Spanned<TypeExpr>>,
    pub initializer: Option<Initializer>,
    /// From the first attribute (or modifier, or keyword) to the end of the initializer.
    pub span: Span,
}

impl PropertyDecl {
    /// The `name: Type` part of the declaration.
    pub fn binding_span(&self) -> Span {
        let end = self
            .ty
            .as_ref()
            .map(|(_, span)| span.end)
            .unwrap_or(self.name.1.end);
        (self.name.1.start..end).into()
    }
}

/// `= value`; the span covers the equal sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initializer {
    pub value: Spanned<InitValue>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitValue {
    Closure(ClosureExpr),
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureExpr {
    /// Everything between `{` and `in`, when the closure declares its parameters.
    pub signature: Option<Span>,
    /// One span per top-level statement, in source order.
    pub statements: Vec<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `Swift.Result<Int, Error>`; `path` is the dotted name.
    Named {
        path: String,
        arguments: Vec<Spanned<TypeExpr>>,
    },
    /// `()`, `(Int)`, `(a: Int, b: String)`.
    Tuple(Vec<Spanned<TypeExpr>>),
    /// `T?` or `T!`.
    Optional(Box<Spanned<TypeExpr>>),
    /// `[T]` or `[K: V]`.
    Collection {
        key: Option<Box<Spanned<TypeExpr>>>,
        element: Box<Spanned<TypeExpr>>,
    },
    Function(FunctionTypeExpr),
    /// One group of attributes in front of a type, e.g. `@Sendable @MainActor`.
    Attributed {
        attributes: Span,
        base: Box<Spanned<TypeExpr>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTypeExpr {
    pub parameters: Vec<Spanned<TypeExpr>>,
    pub asyncness: Option<Span>,
    pub throws: Option<Span>,
    pub return_type: Box<Spanned<TypeExpr>>,
}
