//! The per-declaration transformation: validate, pick a default, emit.
use log::{debug, warn};
use strum::{EnumIs, IntoStaticStr};

use crate::{
    body::{Body, ParameterClause, Statement},
    config::Config,
    diagnostics::{Diagnostic, DiagnosticSink},
    emit::{GeneratedArtifact, emit},
    render::Renderer,
    signature::{FunctionSignature, parse_signature},
    synth::{from_config_argument, from_initializer, synthesize_default},
    syntax::{
        Span,
        ast::{Attribute, BindingKeyword, PropertyDecl},
        slice_text,
    },
};

/// Where the default implementation of an endpoint comes from; fixed per attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs, IntoStaticStr)]
pub enum DefaultSupplyMode {
    /// A labelled argument on the attribute; the property must not be initialized.
    ConfigArgument,
    /// The property's own initializer, relocated into the peer storage.
    Initializer,
}

/// The attribute that selected a declaration for expansion.
#[derive(Debug, Clone, Copy)]
pub struct Annotation<'d> {
    /// Position of the attribute in the declaration's attribute list.
    pub index: usize,
    pub attribute: &'d Attribute,
    pub mode: DefaultSupplyMode,
}

/// Find the mode attribute of a declaration. When several are present the first one wins.
pub fn annotation<'d>(config: &Config, decl: &'d PropertyDecl) -> Option<Annotation<'d>> {
    let mut found = decl
        .attributes
        .iter()
        .enumerate()
        .filter_map(|(index, attribute)| {
            config
                .attributes
                .mode_of(&attribute.name.0)
                .map(|mode| Annotation {
                    index,
                    attribute,
                    mode,
                })
        });

    let first = found.next()?;
    if let Some(ignored) = found.next() {
        warn!(
            "'{}' carries both '@{}' and '@{}'; only the first is expanded",
            decl.name.0, first.attribute.name.0, ignored.attribute.name.0
        );
    }
    Some(first)
}

/// Everything one declaration needs: configuration, unit source, and the shared sink.
pub struct PassContext<'a> {
    pub config: &'a Config,
    pub source: &'a str,
    pub sink: &'a DiagnosticSink,
}

impl<'a> PassContext<'a> {
    pub fn new(config: &'a Config, source: &'a str, sink: &'a DiagnosticSink) -> Self {
        Self {
            config,
            source,
            sink,
        }
    }

    /// Expand one declaration, reporting a failure to the sink.
    ///
    /// Returns `None` for declarations without a mode attribute and for failed ones.
    pub fn run(&self, decl: &PropertyDecl) -> Option<GeneratedArtifact> {
        let annotation = annotation(self.config, decl)?;
        match transform(self.config, self.source, decl, &annotation) {
            Ok(artifact) => Some(artifact),
            Err(diagnostic) => {
                debug!("'{}': {}", decl.name.0, diagnostic);
                self.sink.push(diagnostic);
                None
            }
        }
    }
}

/// Transform an annotated declaration.
///
/// Checks run in a fixed order: the declared type must be a function type, then the
/// mode must accept the declaration's initializer, then a default must be available.
/// The first failing check produces the only diagnostic.
pub fn transform(
    config: &Config,
    source: &str,
    decl: &PropertyDecl,
    annotation: &Annotation<'_>,
) -> Result<GeneratedArtifact, Diagnostic> {
    let property = decl.name.0.as_str();
    let attribute = annotation.attribute;
    let attribute_name = attribute.name.0.as_str();
    debug!(
        "'{property}': expanding in {} mode",
        <&str>::from(annotation.mode)
    );

    let signature = match (&decl.keyword.0, &decl.ty) {
        (BindingKeyword::Var, Some(ty)) => parse_signature(source, ty, config),
        _ => None,
    }
    .ok_or_else(|| Diagnostic::signature_mismatch(attribute_name, property, attribute.span))?;

    let default_argument = attribute.argument(&config.attributes.default_label);
    let author = match annotation.mode {
        DefaultSupplyMode::ConfigArgument => {
            if let Some(initializer) = &decl.initializer {
                let removal: Span = (decl.binding_span().end..initializer.span.end).into();
                return Err(Diagnostic::conflicting_initializer(
                    attribute_name,
                    property,
                    initializer.span,
                    removal,
                ));
            }
            default_argument.map(|argument| from_config_argument(source, argument, &signature))
        }
        DefaultSupplyMode::Initializer => {
            if default_argument.is_some() {
                warn!(
                    "'{property}': ignoring '{}:' argument of '@{attribute_name}'; the default comes from the initializer",
                    config.attributes.default_label
                );
            }
            decl.initializer
                .as_ref()
                .map(|initializer| from_initializer(source, initializer, &signature))
        }
    };

    let Some(default) = synthesize_default(property, &signature, author) else {
        return Err(missing_default(config, source, decl, annotation, &signature));
    };

    let retained = decl
        .attributes
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != annotation.index)
        .map(|(_, attribute)| slice_text(source, attribute.span))
        .chain(decl.modifiers.iter().map(|(word, _)| word.clone()))
        .collect();

    Ok(emit(property, annotation.mode, signature, default, retained))
}

fn missing_default(
    config: &Config,
    source: &str,
    decl: &PropertyDecl,
    annotation: &Annotation<'_>,
    signature: &FunctionSignature,
) -> Diagnostic {
    let property = decl.name.0.as_str();
    let placeholder = format!("<#{}#>", signature.return_type.placeholder_name());

    match annotation.mode {
        DefaultSupplyMode::ConfigArgument => {
            let attribute = annotation.attribute;
            let label = &config.attributes.default_label;
            let mut arguments: Vec<String> = attribute
                .arguments
                .iter()
                .flatten()
                .map(|argument| slice_text(source, argument.span))
                .collect();
            arguments.push(format!("{label}: {placeholder}"));
            let rewritten = format!("@{}({})", attribute.name.0, arguments.join(", "));
            Diagnostic::missing_config_argument(
                label,
                &placeholder,
                property,
                attribute.span,
                rewritten,
            )
        }
        DefaultSupplyMode::Initializer => {
            let closure = Renderer::new(config).inline_closure(&Body::new(
                ParameterClause::ignoring(signature.parameter_count),
                vec![Statement::Verbatim(placeholder)],
            ));
            Diagnostic::missing_initial_value(property, decl.binding_span(), &closure)
        }
    }
}
