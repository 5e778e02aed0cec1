pub mod config;
pub mod logging;
pub mod recorder;
pub mod registry;
pub mod rewrite;
pub mod runtime;
pub mod session;
pub mod source;
pub mod value;
use miette::Diagnostic;
use std::path::PathBuf;

pub use config::MockConfig;
pub use recorder::{CallKey, CallRecorder};
pub use registry::{MockRecord, MockRegistry, Replacement};
pub use rewrite::{CapturedName, CapturedVariable, FunctionRewriter, FunctionSource};
pub use runtime::{
    CallableDescriptor, ClassTable, HostRuntime, LocatorTable, MethodDescriptor, MethodRebinder,
    MethodReflector, Modifiers, SourceLocator, TargetId,
};
pub use session::{MockSession, StaticMock};
pub use source::{ParameterList, SourceExtractor, SourceSpan};
pub use value::Value;

/// Result type alias for the mocking engine
pub type Result<T> = std::result::Result<T, MockError>;

/// Error types for the mocking engine
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum MockError {
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(static_double::configuration),
        help("Check that the target class and method exist and that the replacement is a user-defined callable with source on disk.")
    )]
    Configuration(String),

    #[error("Could not read source file {path:?}: {reason}")]
    #[diagnostic(
        code(static_double::source_read),
        help("The file that declares the replacement must still be readable when the mock is activated.")
    )]
    SourceRead { path: PathBuf, reason: String },

    #[error("Could not find function start of {name} between lines {start_line} and {end_line} of {path:?}. Source: {source_text}")]
    #[diagnostic(
        code(static_double::source_parse),
        help("The replacement must be a `function (...) {{ ... }}` declared within the reported lines. Stale line information can cause this.")
    )]
    SourceParse {
        name: String,
        path: PathBuf,
        start_line: u32,
        end_line: u32,
        source_text: String,
    },

    #[error("{target}({parameters}) has a mock with more required parameters ({replacement_required} > {target_required}) than the method itself. Original declaration in {location}")]
    #[diagnostic(
        code(static_double::arity),
        help("Give the extra replacement parameters default values, or drop them.")
    )]
    Arity {
        target: String,
        parameters: String,
        replacement_required: usize,
        target_required: usize,
        location: String,
    },

    #[error("{target}: {operation} failed: {reason}")]
    #[diagnostic(
        code(static_double::rebind),
        help("The method table may now be inconsistent for this class. Call `deactivate_all` and recreate the class fixture.")
    )]
    Rebind {
        target: String,
        operation: &'static str,
        reason: String,
    },

    #[error("Cannot encode value as a literal: {0}")]
    #[diagnostic(
        code(static_double::serialization),
        help("Objects captured by a replacement must declare state restoration (`__set_state`). Closures and resources cannot be captured.")
    )]
    Serialization(String),

    #[error("Config file error: {0}")]
    #[diagnostic(
        code(static_double::config_file),
        help("Check that .static-double.toml is valid TOML and readable.")
    )]
    ConfigFile(String),
}
