//! Tool system: the tool contract, argument handling, and the per-process catalog.

pub mod arguments;
pub mod builtin;
pub mod catalog;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use catalog::{ToolCatalog, Toolkit};
pub use tool::{AgentTool, Tool, ToolExecutionContext};
pub use types::{AgentToolParameters, AuthorizationRequired, HumanAction, ToolDefinition};
