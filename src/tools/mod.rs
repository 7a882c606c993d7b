//! Plugin tools - metadata, runnable implementations and the registry

mod definition;
mod echo;
mod registry;

pub use definition::{McpTool, ToolMetadata};
pub use echo::EchoTool;
pub use registry::{McpRegistry, builtin_tools};
