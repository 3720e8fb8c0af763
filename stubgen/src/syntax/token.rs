//! Tokens and the character-level lexer.
use chumsky::prelude::*;

use super::{Span, Spanned};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    // Words & literals
    Ident(String),
    Number(String),
    Str(String),
    /// Editor placeholder such as `<#Bool#>`, kept verbatim.
    Placeholder(String),
    /// `@name`; `call` is set when an argument list immediately follows the name.
    Attribute {
        name: String,
        call: bool,
    },

    // Keywords
    Var,
    Let,
    In,

    // Delimiters & punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Equal,
    Arrow,

    /// Any other operator or punctuation character.
    Op(char),
}

impl Token {
    /// Tokens that glue a line break to the surrounding expression instead of ending a
    /// statement.
    pub fn is_infix(&self) -> bool {
        match self {
            Token::Equal | Token::Arrow | Token::Colon => true,
            Token::Op(c) => matches!(
                c,
                '.' | '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '?' | '='
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{name}"),
            Token::Number(text) | Token::Str(text) | Token::Placeholder(text) => {
                write!(f, "{text}")
            }
            Token::Attribute { name, .. } => write!(f, "@{name}"),
            Token::Var => write!(f, "var"),
            Token::Let => write!(f, "let"),
            Token::In => write!(f, "in"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::Equal => write!(f, "="),
            Token::Arrow => write!(f, "->"),
            Token::Op(c) => write!(f, "{c}"),
        }
    }
}

fn word<'src>() -> impl Parser<'src, &'src str, &'src str, extra::Err<Rich<'src, char>>> + Clone {
    any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_' || *c == '$')
        .then(
            any()
                .filter(|c: &char| c.is_alphanumeric() || *c == '_' || *c == '$')
                .repeated(),
        )
        .to_slice()
}

pub fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<Spanned<Token>>, extra::Err<Rich<'src, char>>> {
    let keyword_or_ident = word().map(|s: &str| match s {
        "var" => Token::Var,
        "let" => Token::Let,
        "in" => Token::In,
        _ => Token::Ident(s.to_string()),
    });

    // `@Sendable (URL) -> Data` and `@convention(c)` differ only by the space before `(`
    let attribute = just('@')
        .ignore_then(word())
        .then(just('(').rewind().or_not())
        .map(|(name, paren)| Token::Attribute {
            name: name.to_string(),
            call: paren.is_some(),
        })
        .labelled("attribute");

    let number = text::digits(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| Token::Number(s.to_string()))
        .labelled("number");

    let multiline_string = just("\"\"\"")
        .then(any().and_is(just("\"\"\"").not()).repeated())
        .then(just("\"\"\""))
        .to_slice();
    let string = just('"')
        .then(
            choice((
                just('\\').then(any()).ignored(),
                none_of("\\\"\n").ignored(),
            ))
            .repeated(),
        )
        .then(just('"'))
        .to_slice();
    let string = multiline_string
        .or(string)
        .map(|s: &str| Token::Str(s.to_string()))
        .labelled("string literal");

    let placeholder = just("<#")
        .then(any().and_is(just("#>").not()).repeated())
        .then(just("#>"))
        .to_slice()
        .map(|s: &str| Token::Placeholder(s.to_string()))
        .labelled("placeholder");

    let punct = choice((
        just("->").to(Token::Arrow),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just(',').to(Token::Comma),
        just(':').to(Token::Colon),
        just(';').to(Token::Semicolon),
        just('=').to(Token::Equal),
        any()
            .filter(|c: &char| !c.is_whitespace() && !c.is_alphanumeric())
            .map(Token::Op),
    ));

    let token = choice((
        placeholder,
        string,
        number,
        attribute,
        keyword_or_ident,
        punct,
    ));

    let line_comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();
    let comment = line_comment.or(block_comment).padded();

    token
        .map_with(|tok, e| -> Spanned<Token> {
            let span: Span = e.span();
            (tok, span)
        })
        .padded_by(comment.repeated())
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}
