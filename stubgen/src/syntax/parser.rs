//! Token-level parser for compilation units, built with chumsky combinators.
//!
//! The parser runs over the plain token slice produced by [`super::token::lexer`]; spans
//! reported by chumsky are therefore token indices, which [`Layout::bytes`] converts back to
//! byte offsets into the source.
use chumsky::{input::ValueInput, prelude::*};

use super::{Span, Spanned, ast::*, token::Token};

type Extra<'t> = extra::Err<Rich<'t, Token>>;

/// Declaration modifiers accepted in front of `var`/`let` and container keywords.
const MODIFIERS: &[&str] = &[
    "public",
    "private",
    "fileprivate",
    "internal",
    "package",
    "open",
    "static",
    "final",
    "lazy",
    "weak",
    "unowned",
    "nonisolated",
    "override",
    "mutating",
    "nonmutating",
    "convenience",
    "required",
    "dynamic",
    "indirect",
];

const CONTAINERS: &[&str] = &["struct", "class", "enum", "actor", "extension", "protocol"];

/// Keywords introducing declarations that are kept verbatim.
const DECLARATIONS: &[&str] = &[
    "func",
    "init",
    "deinit",
    "subscript",
    "typealias",
    "associatedtype",
    "case",
    "import",
    "operator",
    "precedencegroup",
];

/// Whether `token` can only begin a new declaration (or a `#` compiler directive).
fn starts_declaration(token: &Token) -> bool {
    match token {
        Token::Attribute { .. } | Token::Var | Token::Let | Token::Semicolon | Token::Op('#') => {
            true
        }
        Token::Ident(word) => {
            CONTAINERS.contains(&word.as_str()) || DECLARATIONS.contains(&word.as_str())
        }
        _ => false,
    }
}

/// Source text plus the byte span of every token, indexed like the token slice.
#[derive(Clone, Copy)]
pub(super) struct Layout<'t> {
    pub source: &'t str,
    pub tokens: &'t [Token],
    pub spans: &'t [Span],
}

impl Layout<'_> {
    /// Convert a token-index span into a byte span.
    pub(super) fn bytes(&self, tokens: SimpleSpan) -> Span {
        let end_of_input = self.source.len();
        match self.spans.get(tokens.start) {
            Some(first) if tokens.end > tokens.start => {
                let last = self.spans.get(tokens.end - 1).unwrap_or(first);
                (first.start..last.end).into()
            }
            Some(first) => (first.start..first.start).into(),
            None => (end_of_input..end_of_input).into(),
        }
    }

    /// Whether the token at `index` extends the expression ending right before it.
    ///
    /// Closing delimiters, `,` and `;` always end it. On the same line anything else
    /// continues it; across a line break only an infix operator on either side does,
    /// and never a token that starts a declaration. A member access (`.init`) always
    /// takes the next token.
    fn continues_expression(&self, index: usize) -> bool {
        let Some(previous) = index.checked_sub(1) else {
            return false;
        };
        let (Some(last), Some(next)) = (self.tokens.get(previous), self.tokens.get(index)) else {
            return false;
        };
        let (Some(last_span), Some(next_span)) = (self.spans.get(previous), self.spans.get(index))
        else {
            return false;
        };

        if matches!(
            next,
            Token::RParen | Token::RBrace | Token::RBracket | Token::Comma | Token::Semicolon
        ) {
            return false;
        }
        if *last == Token::Op('.') {
            return true;
        }
        let line_break = self.source[last_span.end..next_span.start].contains('\n');
        !line_break || (!starts_declaration(next) && (last.is_infix() || next.is_infix()))
    }
}

/// Shape of one balanced token tree, as seen by statement splitting.
#[derive(Clone, Debug)]
enum Tree {
    Group,
    Leaf(Token),
}

impl Tree {
    fn is_infix(&self) -> bool {
        matches!(self, Tree::Leaf(tok) if tok.is_infix())
    }

    /// Whether a tree starting a new line still belongs to the previous statement.
    fn continues_statement(&self) -> bool {
        match self {
            Tree::Leaf(Token::Ident(word)) => word == "else" || word == "catch",
            other => other.is_infix(),
        }
    }
}

fn token_tree<'t, I>() -> impl Parser<'t, I, Tree, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    recursive(|tree| {
        let nested = tree.repeated();
        choice((
            nested
                .clone()
                .delimited_by(just(Token::LParen), just(Token::RParen))
                .to(Tree::Group),
            nested
                .clone()
                .delimited_by(just(Token::LBrace), just(Token::RBrace))
                .to(Tree::Group),
            nested
                .delimited_by(just(Token::LBracket), just(Token::RBracket))
                .to(Tree::Group),
            none_of([
                Token::LParen,
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
            ])
            .map(Tree::Leaf),
        ))
        .labelled("token")
    })
}

fn word<'t, I>(expected: &'static str) -> impl Parser<'t, I, (), Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(name) if name == expected => () }.labelled(expected)
}

fn ident<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, Spanned<String>, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(name) => name }
        .map_with(move |name, e| (name, layout.bytes(e.span())))
        .labelled("identifier")
}

fn modifier<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, Spanned<String>, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(name) if MODIFIERS.contains(&name.as_str()) => name }
        .map_with(move |name, e| (name, layout.bytes(e.span())))
        .labelled("modifier")
}

/// Tokens that can only begin a new declaration.
fn declaration_start<'t, I>() -> impl Parser<'t, I, (), Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    any()
        .filter(|token: &Token| starts_declaration(token))
        .ignored()
}

/// Succeeds without consuming input when the next token still belongs to the current
/// initializer expression.
fn expression_continues<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, (), Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    empty().try_map(move |(), span: SimpleSpan| {
        if layout.continues_expression(span.start) {
            Ok(())
        } else {
            Err(Rich::custom(span, "end of initializer"))
        }
    })
}

fn attribute<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, Attribute, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    let label = ident(layout).then_ignore(just(Token::Colon));
    let value = token_tree()
        .and_is(just(Token::Comma).not())
        .repeated()
        .at_least(1)
        .map_with(move |_, e| layout.bytes(e.span()));
    let argument = label
        .or_not()
        .then(value)
        .map_with(move |(label, value), e| AttributeArgument {
            label,
            value,
            span: layout.bytes(e.span()),
        });
    let arguments = argument
        .separated_by(just(Token::Comma))
        .allow_trailing()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    let call = select! { Token::Attribute { name, call: true } => name }
        .map_with(move |name, e| (name, layout.bytes(e.span())))
        .then(arguments.map(Some));
    let bare = select! { Token::Attribute { name, call: false } => name }
        .map_with(move |name, e| ((name, layout.bytes(e.span())), None));

    choice((call, bare))
        .map_with(move |(name, arguments), e| Attribute {
            name,
            arguments,
            span: layout.bytes(e.span()),
        })
        .labelled("attribute")
}

pub(super) fn type_expr<'t, I>(
    layout: Layout<'t>,
) -> impl Parser<'t, I, Spanned<TypeExpr>, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    recursive(|ty| {
        // Tuple elements and function parameters: `_ name: inout T...`
        let label = ident(layout)
            .then(ident(layout).or_not())
            .then_ignore(just(Token::Colon));
        let element = label
            .or_not()
            .ignore_then(word("inout").or_not())
            .ignore_then(ty.clone())
            .then_ignore(just(Token::Op('.')).repeated().exactly(3).or_not());
        let elements = element
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen));

        let asyncness = word("async")
            .map_with(move |_, e| layout.bytes(e.span()))
            .or_not();
        let throws = word("throws")
            .then(
                token_tree()
                    .repeated()
                    .delimited_by(just(Token::LParen), just(Token::RParen))
                    .or_not(),
            )
            .map_with(move |_, e| layout.bytes(e.span()))
            .or_not();
        let function_tail = asyncness
            .then(throws)
            .then_ignore(just(Token::Arrow))
            .then(ty.clone());

        let parenthesized =
            elements
                .then(function_tail.or_not())
                .map(|(elements, tail)| match tail {
                    Some(((asyncness, throws), return_type)) => {
                        TypeExpr::Function(FunctionTypeExpr {
                            parameters: elements,
                            asyncness,
                            throws,
                            return_type: Box::new(return_type),
                        })
                    }
                    None => TypeExpr::Tuple(elements),
                });

        let collection = ty
            .clone()
            .then(just(Token::Colon).ignore_then(ty.clone()).or_not())
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(|(first, second)| match second {
                Some(element) => TypeExpr::Collection {
                    key: Some(Box::new(first)),
                    element: Box::new(element),
                },
                None => TypeExpr::Collection {
                    key: None,
                    element: Box::new(first),
                },
            });

        let generic_arguments = ty
            .clone()
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::Op('<')), just(Token::Op('>')));
        let named = word("any")
            .or(word("some"))
            .or_not()
            .ignore_then(
                select! { Token::Ident(name) => name }
                    .separated_by(just(Token::Op('.')))
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then(generic_arguments.or_not())
            .map(|(path, arguments)| TypeExpr::Named {
                path: path.join("."),
                arguments: arguments.unwrap_or_default(),
            });

        let base = choice((parenthesized, collection, named))
            .map_with(move |ty, e| (ty, layout.bytes(e.span())));
        let optional_mark = choice((just(Token::Op('?')), just(Token::Op('!'))))
            .map_with(move |_, e| layout.bytes(e.span()).end);
        let plain = base
            .then(optional_mark.repeated().collect::<Vec<_>>())
            .map(|(inner, marks)| {
                marks.into_iter().fold(inner, |inner, end| {
                    let span: Span = (inner.1.start..end).into();
                    (TypeExpr::Optional(Box::new(inner)), span)
                })
            });

        let type_attribute = choice((
            select! { Token::Attribute { call: true, .. } => () }
                .then(
                    token_tree()
                        .repeated()
                        .delimited_by(just(Token::LParen), just(Token::RParen)),
                )
                .ignored(),
            select! { Token::Attribute { call: false, .. } => () },
        ));
        let attributed = type_attribute
            .repeated()
            .at_least(1)
            .map_with(move |_, e| layout.bytes(e.span()))
            .then(plain.clone())
            .map_with(move |(attributes, base), e| {
                (
                    TypeExpr::Attributed {
                        attributes,
                        base: Box::new(base),
                    },
                    layout.bytes(e.span()),
                )
            });

        choice((attributed, plain)).labelled("type")
    })
}

/// Group closure body trees into statements.
///
/// A statement ends at `;`, or at a line break unless the break sits next to an infix
/// operator or precedes `else`/`catch`.
fn split_statements(source: &str, elements: Vec<(Option<Tree>, Span)>) -> Vec<Span> {
    let mut statements: Vec<Span> = Vec::new();
    let mut current: Option<(usize, usize, Tree)> = None;

    for (tree, span) in elements {
        let Some(tree) = tree else {
            if let Some((start, end, _)) = current.take() {
                statements.push((start..end).into());
            }
            continue;
        };

        current = match current.take() {
            Some((start, end, last)) => {
                let line_break = source[end..span.start].contains('\n');
                if line_break && !last.is_infix() && !tree.continues_statement() {
                    statements.push((start..end).into());
                    Some((span.start, span.end, tree))
                } else {
                    Some((start, span.end, tree))
                }
            }
            None => Some((span.start, span.end, tree)),
        };
    }

    if let Some((start, end, _)) = current {
        statements.push((start..end).into());
    }
    statements
}

fn closure<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, ClosureExpr, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    let capture_list = token_tree()
        .repeated()
        .delimited_by(just(Token::LBracket), just(Token::RBracket));
    let shorthand = ident(layout)
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .ignored();
    let explicit = token_tree()
        .repeated()
        .delimited_by(just(Token::LParen), just(Token::RParen))
        .then(word("async").or_not())
        .then(word("throws").or_not())
        .then(just(Token::Arrow).ignore_then(type_expr(layout)).or_not())
        .ignored();
    let signature = capture_list
        .or_not()
        .then(choice((explicit, shorthand)).or_not())
        .map_with(move |_, e| layout.bytes(e.span()))
        .then_ignore(just(Token::In));

    let element = choice((just(Token::Semicolon).to(None), token_tree().map(Some)))
        .map_with(move |tree, e| (tree, layout.bytes(e.span())));

    just(Token::LBrace)
        .ignore_then(signature.or_not())
        .then(element.repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::RBrace))
        .map(move |(signature, elements)| ClosureExpr {
            signature,
            statements: split_statements(layout.source, elements),
        })
        .labelled("closure")
}

fn property<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, PropertyDecl, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    // `class var` is a modifier here but a container keyword elsewhere
    let property_modifier = choice((
        modifier(layout),
        select! { Token::Ident(name) if name == "class" => name }
            .map_with(move |name, e| (name, layout.bytes(e.span()))),
    ));
    let keyword = choice((
        just(Token::Var).to(BindingKeyword::Var),
        just(Token::Let).to(BindingKeyword::Let),
    ))
    .map_with(move |keyword, e| (keyword, layout.bytes(e.span())));

    // `{ ... }` is a closure value unless it is called or chained, as in `{ ... }()`
    let value = choice((
        closure(layout)
            .then_ignore(expression_continues(layout).not())
            .map(InitValue::Closure),
        token_tree()
            .and_is(declaration_start().not())
            .then(
                expression_continues(layout)
                    .ignore_then(token_tree())
                    .repeated(),
            )
            .to(InitValue::Expression),
    ))
    .map_with(move |value, e| (value, layout.bytes(e.span())));
    let initializer = just(Token::Equal)
        .ignore_then(value)
        .map_with(move |value, e| Initializer {
            value,
            span: layout.bytes(e.span()),
        });

    attribute(layout)
        .repeated()
        .collect::<Vec<_>>()
        .then(property_modifier.repeated().collect::<Vec<_>>())
        .then(keyword)
        .then(ident(layout))
        .then(just(Token::Colon).ignore_then(type_expr(layout)).or_not())
        .then(initializer.or_not())
        .map_with(
            move |(((((attributes, modifiers), keyword), name), ty), initializer), e| {
                PropertyDecl {
                    attributes,
                    modifiers,
                    keyword,
                    name,
                    ty,
                    initializer,
                    span: layout.bytes(e.span()),
                }
            },
        )
        .then_ignore(just(Token::Semicolon).or_not())
        .labelled("property declaration")
}

fn items<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, Vec<Item>, Extra<'t>> + Clone
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    recursive(|items| {
        let container = attribute(layout)
            .repeated()
            .ignore_then(modifier(layout).repeated())
            .ignore_then(
                select! { Token::Ident(keyword) if CONTAINERS.contains(&keyword.as_str()) => keyword }
                    .map_with(move |keyword, e| (keyword, layout.bytes(e.span()))),
            )
            // `class func` is a method, not a container
            .then(declaration_start().not().ignore_then(ident(layout)))
            // generic parameters, conformances and where clauses
            .then_ignore(none_of([Token::LBrace, Token::RBrace]).repeated())
            .then(items.delimited_by(just(Token::LBrace), just(Token::RBrace)))
            .map_with(move |((keyword, name), items), e| {
                Item::Container(ContainerDecl {
                    keyword,
                    name,
                    items,
                    span: layout.bytes(e.span()),
                })
            })
            .labelled("container declaration");

        // any other declaration or statement, up to the next declaration keyword
        let other = attribute(layout)
            .repeated()
            .ignore_then(modifier(layout).repeated())
            .ignore_then(word("class").or_not())
            .ignore_then(token_tree().and_is(just(Token::Semicolon).not()))
            .ignore_then(
                token_tree()
                    .and_is(declaration_start().not())
                    .repeated(),
            )
            .map_with(move |_, e| Item::Other(layout.bytes(e.span())));
        let separator =
            just(Token::Semicolon).map_with(move |_, e| Item::Other(layout.bytes(e.span())));

        choice((
            container,
            property(layout).map(Item::Property),
            other,
            separator,
        ))
        .repeated()
        .collect::<Vec<_>>()
    })
}

pub(super) fn unit_parser<'t, I>(layout: Layout<'t>) -> impl Parser<'t, I, Unit, Extra<'t>>
where
    I: ValueInput<'t, Token = Token, Span = SimpleSpan>,
{
    items(layout)
        .then_ignore(end())
        .map(|items| Unit { items })
}
