// phoenix-core - Template macro and deployment rotation engines
//
// Pure document transforms over `serde_json::Value`. External systems are
// reached only through the traits in `source`, so the engines run the same
// way inside the Lambda handler, the CLI and the tests.

pub mod document;
pub mod error;
pub mod macro_engine;
pub mod reference;
pub mod rotation;
pub mod source;
pub mod substitution;
pub mod validation;

pub use error::{MacroError, RotationError, SourceError};
pub use macro_engine::{MacroEngine, MacroSettings, Outcome, Transformed};
pub use rotation::{blank_template, deployment_stack_name, rotate, rotate_deployed, StageSpec};
pub use source::{
    DeployedTemplates, ParameterKind, ParameterPage, ParameterSource, Parameters,
    StoredParameter, TemplateStore,
};
pub use substitution::SubstitutionMap;
