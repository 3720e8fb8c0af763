//! Fallback implementations: reading the author's and synthesizing our own.
use log::debug;

use crate::{
    body::{Body, ForwardingCall, ParameterClause, Statement, dedent},
    normalize::normalize,
    signature::{FunctionSignature, ReturnType},
    syntax::{
        ast::{AttributeArgument, InitValue, Initializer},
        column_of, slice_text,
    },
};

/// Default written as the value of the attribute's configuration argument.
///
/// The value is the closure's return value, so the body ignores every parameter.
pub fn from_config_argument(
    source: &str,
    argument: &AttributeArgument,
    signature: &FunctionSignature,
) -> Body {
    let span = argument.value;
    let text = dedent(&source[span.start..span.end], column_of(source, span.start));
    Body::new(
        ParameterClause::ignoring(signature.parameter_count),
        vec![Statement::Expression(text)],
    )
}

/// Default written as the property's own initializer.
///
/// Closures contribute their statements; any other expression is called with every
/// argument of the endpoint.
pub fn from_initializer(
    source: &str,
    initializer: &Initializer,
    signature: &FunctionSignature,
) -> Body {
    let (value, span) = &initializer.value;
    match value {
        InitValue::Closure(closure) => Body::from_closure(source, closure),
        InitValue::Expression => {
            let call = ForwardingCall {
                callee: slice_text(source, *span),
                arity: signature.parameter_count,
                effects: signature.effects,
                returns_value: !signature.return_type.is_void(),
            };
            Body::new(ParameterClause::Empty, vec![Statement::Forward(call)])
        }
    }
}

/// Pick the default body for an endpoint.
///
/// | author default | return type | throws | outcome                         |
/// |----------------|-------------|--------|---------------------------------|
/// | present        | any         | any    | author body, normalized         |
/// | absent         | Void        | any    | empty body                      |
/// | absent         | named       | yes    | raise the unimplemented failure |
/// | absent         | named       | no     | `None`: a default is required   |
///
/// The returned body does not yet contain the failure report.
pub fn synthesize_default(
    property: &str,
    signature: &FunctionSignature,
    author: Option<Body>,
) -> Option<Body> {
    let arity = signature.parameter_count;
    match (author, &signature.return_type, signature.effects.may_fail) {
        (Some(body), return_type, _) => {
            debug!("'{property}': using the author-supplied default");
            Some(normalize(body, return_type))
        }
        (None, ReturnType::Void, _) => {
            debug!("'{property}': synthesizing an empty default");
            Some(Body::new(ParameterClause::ignoring(arity), Vec::new()))
        }
        (None, ReturnType::Named(_), true) => {
            debug!("'{property}': synthesizing a throwing default");
            Some(Body::new(
                ParameterClause::ignoring(arity),
                vec![Statement::RaiseUnimplemented {
                    property: property.to_string(),
                }],
            ))
        }
        (None, ReturnType::Named(name), false) => {
            debug!("'{property}': no default available for non-throwing `{name}`");
            None
        }
    }
}
