//! Lexing and parsing of compilation units.
//!
//! Parsing happens in two stages, mirroring how the rest of the crate consumes source text:
//! a character-level [`token::lexer`] followed by a token-level [`parser`] that only
//! understands the declarations the pass rewrites. Every node of the resulting [`ast::Unit`]
//! carries byte spans into the original text, so generated code and diagnostics can point
//! back at exactly what the author wrote.
pub mod ast;
mod parser;
pub mod token;

use chumsky::{Parser, span::SimpleSpan};

use crate::error::{Error, Result, SyntaxError};
use ast::{TypeExpr, Unit};
use parser::Layout;
use token::Token;

/// Byte range into the source text of a unit.
pub type Span = SimpleSpan;
pub type Spanned<T> = (T, Span);

/// Parse a whole compilation unit.
///
/// Lexing errors stop processing immediately; otherwise every parse error chumsky
/// recovers is reported at once.
pub fn parse_unit(source: &str) -> Result<Unit> {
    let (tokens, lex_errors) = token::lexer().parse(source).into_output_errors();
    let lex_errors: Vec<SyntaxError> = lex_errors
        .into_iter()
        .map(|e| SyntaxError {
            message: format!("lexing error: {}", e.reason()),
            span: *e.span(),
        })
        .collect();

    let tokens = match tokens {
        Some(tokens) if lex_errors.is_empty() => tokens,
        _ => return Err(Error::Syntax(lex_errors)),
    };

    let (kinds, spans): (Vec<Token>, Vec<Span>) = tokens.into_iter().unzip();
    let layout = Layout {
        source,
        tokens: &kinds,
        spans: &spans,
    };

    let (unit, parse_errors) = parser::unit_parser(layout)
        .parse(kinds.as_slice())
        .into_output_errors();
    let errors: Vec<SyntaxError> = parse_errors
        .into_iter()
        .map(|e| SyntaxError {
            message: format!("parse error: {}", e.reason()),
            span: layout.bytes(*e.span()),
        })
        .collect();

    match unit {
        Some(unit) if errors.is_empty() => Ok(unit),
        _ => Err(Error::Syntax(errors)),
    }
}

/// Parse a standalone type annotation such as `@Sendable (Int) async -> Bool`.
pub fn parse_type(source: &str) -> Result<Spanned<TypeExpr>> {
    let tokens = token::lexer().parse(source).into_result().map_err(|errors| {
        Error::Syntax(
            errors
                .into_iter()
                .map(|e| SyntaxError {
                    message: format!("lexing error: {}", e.reason()),
                    span: *e.span(),
                })
                .collect(),
        )
    })?;

    let (kinds, spans): (Vec<Token>, Vec<Span>) = tokens.into_iter().unzip();
    let layout = Layout {
        source,
        tokens: &kinds,
        spans: &spans,
    };

    parser::type_expr(layout)
        .then_ignore(chumsky::prelude::end())
        .parse(kinds.as_slice())
        .into_result()
        .map_err(|errors| {
            Error::Syntax(
                errors
                    .into_iter()
                    .map(|e| SyntaxError {
                        message: format!("parse error: {}", e.reason()),
                        span: layout.bytes(*e.span()),
                    })
                    .collect(),
            )
        })
}

/// Source text of `span` with every whitespace run collapsed to a single space.
pub fn slice_text(source: &str, span: Span) -> String {
    source[span.start..span.end]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Column (in bytes) at which `offset` sits on its line.
pub fn column_of(source: &str, offset: usize) -> usize {
    let line_start = source[..offset].rfind('\n').map_or(0, |at| at + 1);
    offset - line_start
}

/// Leading whitespace of the line containing `offset`.
pub fn indentation_at(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map_or(0, |at| at + 1);
    let line = &source[line_start..];
    let width = line.len() - line.trim_start_matches([' ', '\t']).len();
    &line[..width]
}

#[cfg(test)]
mod tests {
    use super::ast::*;
    use super::*;

    fn properties(unit: &Unit) -> Vec<&PropertyDecl> {
        fn walk<'a>(items: &'a [Item], out: &mut Vec<&'a PropertyDecl>) {
            for item in items {
                match item {
                    Item::Property(decl) => out.push(decl),
                    Item::Container(container) => walk(&container.items, out),
                    Item::Other(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        walk(&unit.items, &mut out);
        out
    }

    #[test]
    fn parses_annotated_properties_inside_containers() {
        let src = "import Foundation\n\nstruct Client {\n  @DependencyEndpoint\n  var fetch: (Int) async throws -> String\n  func helper() {}\n}\n";
        let unit = parse_unit(src).unwrap();
        let decls = properties(&unit);
        assert_eq!(decls.len(), 1);

        let decl = decls[0];
        assert_eq!(decl.name.0, "fetch");
        assert_eq!(decl.attributes[0].name.0, "DependencyEndpoint");
        assert!(decl.attributes[0].arguments.is_none());
        assert!(decl.initializer.is_none());

        let (ty, span) = decl.ty.as_ref().unwrap();
        assert_eq!(&src[span.start..span.end], "(Int) async throws -> String");
        let TypeExpr::Function(function) = ty else {
            panic!("expected a function type, got {ty:?}");
        };
        assert_eq!(function.parameters.len(), 1);
        assert!(function.asyncness.is_some());
        assert!(function.throws.is_some());
    }

    #[test]
    fn attribute_arguments_keep_labels_and_values() {
        let src = "@Unimplemented(default: [1, 2].isEmpty) var check: () -> Bool";
        let unit = parse_unit(src).unwrap();
        let decl = properties(&unit)[0];
        let argument = decl.attributes[0].argument("default").unwrap();
        assert_eq!(
            &src[argument.value.start..argument.value.end],
            "[1, 2].isEmpty"
        );
    }

    #[test]
    fn closure_initializers_are_split_into_statements() {
        let src = "@DependencyEndpoint\nvar f: (Int, Int) -> Int = { a, b in\n  let sum = a +\n    b\n  print(sum); return sum\n}\nvar next = 1\n";
        let unit = parse_unit(src).unwrap();
        let decl = properties(&unit)[0];
        let initializer = decl.initializer.as_ref().unwrap();
        let InitValue::Closure(closure) = &initializer.value.0 else {
            panic!("expected a closure initializer");
        };

        let signature = closure.signature.unwrap();
        assert_eq!(&src[signature.start..signature.end], "a, b");
        let statements: Vec<&str> = closure
            .statements
            .iter()
            .map(|span| &src[span.start..span.end])
            .collect();
        assert_eq!(
            statements,
            vec!["let sum = a +\n    b", "print(sum)", "return sum"]
        );
        assert_eq!(properties(&unit)[1].name.0, "next");
    }

    #[test]
    fn initializers_end_with_their_declaration() {
        let src = "enum Mode { case open }\nstruct S {\n  var a: () -> Int = { 1 }\n  func f() {}\n  var b = Factory.init(x)\n  private func g() {}\n  var c: () -> Int = { 2 }()\n  class func h() {}\n}";
        let unit = parse_unit(src).unwrap();
        let decls = properties(&unit);
        let initializers: Vec<(&str, bool)> = decls
            .iter()
            .map(|decl| {
                let (value, span) = &decl.initializer.as_ref().unwrap().value;
                (
                    &src[span.start..span.end],
                    matches!(value, InitValue::Closure(_)),
                )
            })
            .collect();
        assert_eq!(
            initializers,
            vec![
                ("{ 1 }", true),
                ("Factory.init(x)", false),
                ("{ 2 }()", false),
            ]
        );

        let Item::Container(s) = &unit.items[1] else {
            panic!("expected a container");
        };
        let others: Vec<&str> = s
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Other(span) => Some(&src[span.start..span.end]),
                _ => None,
            })
            .collect();
        assert_eq!(
            others,
            vec!["func f() {}", "private func g() {}", "class func h() {}"]
        );
    }

    #[test]
    fn attributed_and_optional_types() {
        let (ty, _) = parse_type("@Sendable @MainActor (String?) -> [Int: Bool]").unwrap();
        let TypeExpr::Attributed { base, .. } = ty else {
            panic!("expected an attributed type");
        };
        let TypeExpr::Function(function) = &base.0 else {
            panic!("expected a function type");
        };
        assert!(matches!(function.parameters[0].0, TypeExpr::Optional(_)));
        assert!(matches!(
            function.return_type.0,
            TypeExpr::Collection { key: Some(_), .. }
        ));
    }

    #[test]
    fn syntax_errors_point_into_the_source() {
        let Err(Error::Syntax(errors)) = parse_unit("struct S {\n  var x: (Int -> Void\n}") else {
            panic!("expected a syntax error");
        };
        assert!(!errors.is_empty());
        assert!(errors[0].span.end <= "struct S {\n  var x: (Int -> Void\n}".len());
    }

    #[test]
    fn nested_containers_and_class_properties() {
        let src = "public final class Outer<T>: Base where T: Equatable {\n  class var shared: () -> Void\n  enum Inner { case a; static var b = 1 }\n}";
        let unit = parse_unit(src).unwrap();
        let Item::Container(outer) = &unit.items[0] else {
            panic!("expected a container");
        };
        assert_eq!(outer.keyword.0, "class");
        assert_eq!(outer.name.0, "Outer");

        let decls = properties(&unit);
        let names: Vec<&str> = decls.iter().map(|d| d.name.0.as_str()).collect();
        assert_eq!(names, vec!["shared", "b"]);
        assert_eq!(decls[0].modifiers[0].0, "class");
        assert!(matches!(
            decls[1].initializer.as_ref().unwrap().value.0,
            InitValue::Expression
        ));
    }

    #[test]
    fn text_helpers() {
        let src = "struct S {\n    var x:  (Int)\n      -> Void\n}";
        let start = src.find("(Int)").unwrap();
        let end = src.find("Void").unwrap() + 4;
        assert_eq!(slice_text(src, (start..end).into()), "(Int) -> Void");
        assert_eq!(column_of(src, src.find("var").unwrap()), 4);
        assert_eq!(indentation_at(src, start), "    ");
    }
}
