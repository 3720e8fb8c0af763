//! Single-expression bodies rewritten into explicit `return` form.
use crate::{
    body::{Body, Statement},
    signature::ReturnType,
};

/// Turn a lone bare expression into `return <expression>` when a value is expected.
///
/// Once the failure report is prepended, the closure no longer has a single expression
/// and would stop returning the author's value implicitly.
pub fn normalize(body: Body, return_type: &ReturnType) -> Body {
    if return_type.is_void() {
        return body;
    }

    match body.statements.as_slice() {
        [Statement::Expression(expression)] => {
            let statement = Statement::Return(expression.clone());
            Body::new(body.parameters, vec![statement])
        }
        _ => body,
    }
}
