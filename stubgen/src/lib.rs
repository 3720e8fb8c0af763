//! Expansion of function-valued properties into self-reporting endpoint stubs.
//!
//! An annotated property such as
//!
//! ```text
//! @Unimplemented
//! var fetch: (Int) async throws -> String
//! ```
//!
//! is rewritten into accessors over a peer storage declaration whose default closure
//! reports a test failure when called. Installing a real implementation wraps it in a
//! closure that marks a tracking handle fulfilled on first use.
//!
//! The pipeline per declaration is [`signature`] → [`synth`] (with [`normalize`]) →
//! [`emit`], with [`diagnostics`] short-circuiting on failure; [`expand::Expander`] runs it
//! over a whole unit and [`render`] produces the text.
pub mod body;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod expand;
pub mod normalize;
pub mod pass;
pub mod render;
pub mod signature;
pub mod synth;
pub mod syntax;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind, Fix, apply_fixes};
pub use error::{Error, Result};
pub use expand::{Expander, Expansion};
