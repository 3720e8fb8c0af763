//! Pass configuration.
//!
//! Every field has a default matching the stock `XCTestDynamicOverlay` runtime, so an empty
//! TOML document is a valid configuration:
//!
//! ```toml
//! parallel = true
//! void_synonyms = ["Unit"]
//!
//! [attributes]
//! unimplemented = "Unimplemented"
//! endpoint = "DependencyEndpoint"
//! default_label = "default"
//!
//! [runtime]
//! report_failure = "XCTestDynamicOverlay.XCTFail"
//! unimplemented = "XCTestDynamicOverlay.Unimplemented"
//! tracking_handle = "_$Implemented"
//!
//! [render]
//! indent = 2
//! width = 100
//! ```
use std::path::Path;

use serde::Deserialize;

use crate::{error::Result, pass::DefaultSupplyMode};

/// Spellings of the "no value" return type that are always recognized.
pub const BUILTIN_VOID_SYNONYMS: [&str; 3] = ["Void", "()", "Swift.Void"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttributeNames {
    /// Attribute selecting the config-argument mode.
    pub unimplemented: String,
    /// Attribute selecting the initializer mode.
    pub endpoint: String,
    /// Argument label carrying the default return value in config-argument mode.
    pub default_label: String,
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self {
            unimplemented: "Unimplemented".to_string(),
            endpoint: "DependencyEndpoint".to_string(),
            default_label: "default".to_string(),
        }
    }
}

impl AttributeNames {
    /// Resolve the default-supply mode selected by an attribute name, if any.
    pub fn mode_of(&self, attribute: &str) -> Option<DefaultSupplyMode> {
        if attribute == self.unimplemented {
            Some(DefaultSupplyMode::ConfigArgument)
        } else if attribute == self.endpoint {
            Some(DefaultSupplyMode::Initializer)
        } else {
            None
        }
    }
}

/// Names of the runtime capabilities referenced by generated code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeNames {
    pub report_failure: String,
    pub unimplemented: String,
    pub tracking_handle: String,
}

impl Default for RuntimeNames {
    fn default() -> Self {
        Self {
            report_failure: "XCTestDynamicOverlay.XCTFail".to_string(),
            unimplemented: "XCTestDynamicOverlay.Unimplemented".to_string(),
            tracking_handle: "_$Implemented".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub indent: usize,
    pub width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            width: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub attributes: AttributeNames,
    pub runtime: RuntimeNames,
    /// Additional spellings of the "no value" type, on top of [`BUILTIN_VOID_SYNONYMS`].
    pub void_synonyms: Vec<String>,
    pub render: RenderOptions,
    /// Expand independent declarations on worker threads.
    pub parallel: bool,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Whether `name` spells the "no value" return type.
    pub fn is_void_name(&self, name: &str) -> bool {
        BUILTIN_VOID_SYNONYMS.contains(&name) || self.void_synonyms.iter().any(|s| s == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.indent, 2);
        assert!(!config.parallel);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = Config::from_toml_str(
            r#"
            void_synonyms = ["Unit"]

            [runtime]
            report_failure = "reportIssue"
            "#,
        )
        .unwrap();

        assert_eq!(config.runtime.report_failure, "reportIssue");
        assert_eq!(config.runtime.tracking_handle, "_$Implemented");
        assert!(config.is_void_name("Unit"));
        assert!(config.is_void_name("Swift.Void"));
        assert!(!config.is_void_name("Bool"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("paralel = true").unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn attribute_names_select_modes() {
        let names = AttributeNames::default();
        assert_eq!(
            names.mode_of("Unimplemented"),
            Some(DefaultSupplyMode::ConfigArgument)
        );
        assert_eq!(
            names.mode_of("DependencyEndpoint"),
            Some(DefaultSupplyMode::Initializer)
        );
        assert_eq!(names.mode_of("MainActor"), None);
    }
}
