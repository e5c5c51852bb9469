//! Built-in tools and the registry that dispatches them

mod bash_tool;
mod edit_tool;
mod glob_tool;
mod grep_tool;
mod read_tool;
mod registry;
mod tool;
mod write_tool;

pub use bash_tool::BashTool;
pub use edit_tool::EditTool;
pub use glob_tool::GlobTool;
pub use grep_tool::GrepTool;
pub use read_tool::ReadTool;
pub use registry::{RegistryError, ToolRegistry};
pub use tool::{ParamKind, ParamSpec, Tool, ToolDeclaration, ToolResult};
pub use write_tool::WriteTool;

use std::path::Path;
use std::sync::Arc;

/// Build a registry with the standard tool set rooted at a directory
pub fn default_registry(root: impl AsRef<Path>) -> Result<ToolRegistry, RegistryError> {
    let root = root.as_ref();
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadTool::with_base_dir(root)))?;
    registry.register(Arc::new(WriteTool::with_project_root(root)))?;
    registry.register(Arc::new(EditTool::with_base_dir(root)))?;
    registry.register(Arc::new(GlobTool::with_base_dir(root)))?;
    registry.register(Arc::new(GrepTool::with_base_dir(root)))?;
    registry.register(Arc::new(BashTool::with_working_dir(root)))?;
    Ok(registry)
}
