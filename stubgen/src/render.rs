//! RcDoc-based rendering of generated artifacts to source text.
//!
//! Output is deterministic: the same artifact and options always produce byte-identical
//! text, which is what makes expansion idempotent.
use pretty::RcDoc;

use crate::{
    body::{Body, ParameterClause, Statement},
    config::Config,
    emit::{AccessorBlock, GeneratedArtifact, PeerDeclaration, TrackedForwarder},
};

type Doc = RcDoc<'static, ()>;

/// Multi-line text, one hard line break per source line.
fn lines(text: &str) -> Doc {
    RcDoc::intersperse(
        text.lines().map(|line| RcDoc::text(line.to_string())),
        RcDoc::hardline(),
    )
}

pub struct Renderer<'c> {
    config: &'c Config,
}

impl<'c> Renderer<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self { config }
    }

    /// `{ header` + nested body + `}`.
    fn block(&self, header: Doc, body: Doc) -> Doc {
        header
            .append(RcDoc::text(" {"))
            .append(RcDoc::hardline().append(body).nest(self.config.render.indent as isize))
            .append(RcDoc::hardline())
            .append(RcDoc::text("}"))
    }

    fn statement(&self, statement: &Statement) -> Doc {
        let runtime = &self.config.runtime;
        match statement {
            Statement::ReportFailure { property } => RcDoc::text(format!(
                "{}(\"Unimplemented: '{property}'\")",
                runtime.report_failure
            )),
            Statement::RaiseUnimplemented { property } => RcDoc::text(format!(
                "throw {}(\"{property}\")",
                runtime.unimplemented
            )),
            Statement::Return(expression) => RcDoc::text("return ").append(lines(expression)),
            Statement::Expression(text) | Statement::Verbatim(text) => lines(text),
            Statement::Forward(call) => RcDoc::text(call.to_string()),
        }
    }

    fn statements(&self, statements: &[Statement]) -> Doc {
        RcDoc::intersperse(
            statements.iter().map(|s| self.statement(s)),
            RcDoc::hardline(),
        )
    }

    fn parameter_clause(clause: &ParameterClause) -> Option<String> {
        match clause {
            ParameterClause::Empty => None,
            ParameterClause::Wildcards(count) => Some(vec!["_"; *count].join(", ")),
            ParameterClause::Verbatim(text) => Some(text.clone()),
        }
    }

    /// A closure spread over several lines, as stored in peer declarations.
    pub fn closure_doc(&self, body: &Body) -> Doc {
        let open = match Self::parameter_clause(&body.parameters) {
            Some(clause) => format!("{{ {clause} in"),
            None => "{".to_string(),
        };
        RcDoc::text(open)
            .append(
                RcDoc::hardline()
                    .append(self.statements(&body.statements))
                    .nest(self.config.render.indent as isize),
            )
            .append(RcDoc::hardline())
            .append(RcDoc::text("}"))
    }

    /// A closure on a single line, e.g. `{ _ in <#Bool#> }`.
    pub fn inline_closure(&self, body: &Body) -> String {
        let statements = body
            .statements
            .iter()
            .map(|s| self.statement(s).pretty(usize::MAX).to_string())
            .collect::<Vec<_>>()
            .join("; ");
        match Self::parameter_clause(&body.parameters) {
            Some(clause) => format!("{{ {clause} in {statements} }}"),
            None => format!("{{ {statements} }}"),
        }
    }

    fn tracked_assignment(&self, storage: &str, forwarder: &TrackedForwarder) -> Doc {
        let handle = RcDoc::text(format!(
            "let implemented = {}(\"{}\")",
            self.config.runtime.tracking_handle, forwarder.property
        ));
        let closure = RcDoc::text("implemented.fulfill()")
            .append(RcDoc::hardline())
            .append(RcDoc::text(forwarder.call.to_string()));
        handle
            .append(RcDoc::hardline())
            .append(self.block(RcDoc::text(format!("{storage} =")), closure))
    }

    fn accessors(&self, accessors: &AccessorBlock) -> Doc {
        let init = RcDoc::text(format!(
            "@storageRestrictions(initializes: {})",
            accessors.init.storage
        ))
        .append(RcDoc::hardline())
        .append(self.block(
            RcDoc::text("init(initialValue)"),
            self.tracked_assignment(&accessors.init.storage, &accessors.init.forwarder),
        ));
        let getter = self.block(
            RcDoc::text("get"),
            RcDoc::text(accessors.getter.storage.clone()),
        );
        let setter = self.block(
            RcDoc::text("set"),
            self.tracked_assignment(&accessors.setter.storage, &accessors.setter.forwarder),
        );
        RcDoc::intersperse([init, getter, setter], RcDoc::hardline())
    }

    fn peer(&self, peer: &PeerDeclaration) -> Doc {
        let mut header: Vec<&str> = peer.modifiers.iter().map(String::as_str).collect();
        header.push("var");
        RcDoc::text(format!("{} {}: {} = ", header.join(" "), peer.name, peer.ty))
            .append(self.closure_doc(&peer.default))
    }

    pub fn artifact_doc(&self, artifact: &GeneratedArtifact) -> Doc {
        let mut header: Vec<&str> = artifact.retained.iter().map(String::as_str).collect();
        header.push("var");
        let property = self.block(
            RcDoc::text(format!(
                "{} {}: {}",
                header.join(" "),
                artifact.property,
                artifact.signature.rendered
            )),
            self.accessors(&artifact.accessors),
        );
        property
            .append(RcDoc::hardline())
            .append(RcDoc::hardline())
            .append(self.peer(&artifact.peer))
    }

    /// Render the property with its accessors followed by the peer storage.
    pub fn render(&self, artifact: &GeneratedArtifact) -> String {
        let text = self
            .artifact_doc(artifact)
            .pretty(self.config.render.width)
            .to_string();
        text.lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_closures() {
        let config = Config::default();
        let renderer = Renderer::new(&config);
        let one = Body::new(
            ParameterClause::Wildcards(1),
            vec![Statement::Verbatim("<#Bool#>".into())],
        );
        assert_eq!(renderer.inline_closure(&one), "{ _ in <#Bool#> }");

        let none = Body::new(
            ParameterClause::Empty,
            vec![Statement::Verbatim("<#Int#>".into())],
        );
        assert_eq!(renderer.inline_closure(&none), "{ <#Int#> }");
    }

    #[test]
    fn multi_line_statements_are_nested() {
        let config = Config::default();
        let renderer = Renderer::new(&config);
        let body = Body::new(
            ParameterClause::Verbatim("value".into()),
            vec![
                Statement::ReportFailure {
                    property: "f".into(),
                },
                Statement::Verbatim("if value {\n  print(1)\n}".into()),
            ],
        );
        assert_eq!(
            renderer.closure_doc(&body).pretty(80).to_string(),
            "{ value in\n  XCTestDynamicOverlay.XCTFail(\"Unimplemented: 'f'\")\n  if value {\n    print(1)\n  }\n}"
        );
    }
}
