//! Typed description of the code generated for one endpoint.
//!
//! Nothing here produces text; [`crate::render::Renderer`] turns a [`GeneratedArtifact`]
//! into source code. Keeping the two apart lets tests compare what is generated by
//! structural equality.
pub use crate::body::ForwardingCall;
use crate::{
    body::{Body, Statement},
    pass::DefaultSupplyMode,
    signature::FunctionSignature,
};

/// Modifiers copied from the property onto its peer storage.
const STORAGE_MODIFIERS: [&str; 3] = ["static", "class", "nonisolated"];

/// A closure marking the property's tracking handle fulfilled before forwarding every
/// argument to `value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackedForwarder {
    pub property: String,
    pub call: ForwardingCall,
}

impl TrackedForwarder {
    pub fn new(property: &str, value: &str, signature: &FunctionSignature) -> Self {
        Self {
            property: property.to_string(),
            call: ForwardingCall {
                callee: value.to_string(),
                arity: signature.parameter_count,
                effects: signature.effects,
                returns_value: !signature.return_type.is_void(),
            },
        }
    }
}

/// `init(initialValue)`, so memberwise initializers install tracked implementations too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InitAccessor {
    pub storage: String,
    pub forwarder: TrackedForwarder,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Getter {
    pub storage: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Setter {
    pub storage: String,
    pub forwarder: TrackedForwarder,
}

/// Accessors replacing the stored property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccessorBlock {
    pub init: InitAccessor,
    pub getter: Getter,
    pub setter: Setter,
}

/// Storage declared next to the property, initialized with the default implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerDeclaration {
    pub modifiers: Vec<String>,
    pub name: String,
    /// Declared type, attribute wrapper included.
    pub ty: String,
    pub default: Body,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratedArtifact {
    pub property: String,
    pub mode: DefaultSupplyMode,
    pub signature: FunctionSignature,
    /// Attributes and modifiers of the original declaration, minus the mode attribute.
    pub retained: Vec<String>,
    pub accessors: AccessorBlock,
    pub peer: PeerDeclaration,
}

/// Name of the storage backing `property` in the given mode.
pub fn storage_name(property: &str, mode: DefaultSupplyMode) -> String {
    match mode {
        DefaultSupplyMode::ConfigArgument => format!("_{property}"),
        DefaultSupplyMode::Initializer => format!("${property}"),
    }
}

/// Assemble the artifact of a successfully validated endpoint.
///
/// The failure report is always the first statement of the stored default.
pub fn emit(
    property: &str,
    mode: DefaultSupplyMode,
    signature: FunctionSignature,
    default: Body,
    retained: Vec<String>,
) -> GeneratedArtifact {
    let storage = storage_name(property, mode);
    let default = default.prepend(Statement::ReportFailure {
        property: property.to_string(),
    });

    let mut modifiers: Vec<String> = match mode {
        DefaultSupplyMode::ConfigArgument => vec!["private".to_string()],
        DefaultSupplyMode::Initializer => Vec::new(),
    };
    modifiers.extend(
        retained
            .iter()
            .filter(|word| STORAGE_MODIFIERS.contains(&word.as_str()))
            .cloned(),
    );

    let accessors = AccessorBlock {
        init: InitAccessor {
            storage: storage.clone(),
            forwarder: TrackedForwarder::new(property, "initialValue", &signature),
        },
        getter: Getter {
            storage: storage.clone(),
        },
        setter: Setter {
            storage: storage.clone(),
            forwarder: TrackedForwarder::new(property, "newValue", &signature),
        },
    };
    let peer = PeerDeclaration {
        modifiers,
        name: storage,
        ty: signature.rendered.clone(),
        default,
    };

    GeneratedArtifact {
        property: property.to_string(),
        mode,
        signature,
        retained,
        accessors,
        peer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{body::ParameterClause, config::Config};

    #[test]
    fn storage_follows_the_mode() {
        assert_eq!(
            storage_name("fetch", DefaultSupplyMode::ConfigArgument),
            "_fetch"
        );
        assert_eq!(storage_name("fetch", DefaultSupplyMode::Initializer), "$fetch");
    }

    #[test]
    fn peer_keeps_static_modifiers_and_reports_first() {
        let signature =
            FunctionSignature::from_type_text("(Int, Int) -> Void", &Config::default()).unwrap();
        let artifact = emit(
            "log",
            DefaultSupplyMode::ConfigArgument,
            signature,
            Body::new(ParameterClause::Wildcards(2), Vec::new()),
            vec!["public".into(), "static".into()],
        );

        assert_eq!(artifact.peer.modifiers, vec!["private", "static"]);
        assert_eq!(
            artifact.peer.default.statements,
            vec![Statement::ReportFailure {
                property: "log".into()
            }]
        );
        assert_eq!(artifact.accessors.setter.forwarder.call.arity, 2);
        assert!(!artifact.accessors.setter.forwarder.call.returns_value);
        assert_eq!(artifact.accessors.init.forwarder.call.callee, "initialValue");
    }
}
