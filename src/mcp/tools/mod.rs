//! Tool handlers exposed over the protocol

mod base;
mod content;
mod events;
mod metadata;
mod validation;
mod workflow;

pub use base::{
    ToolArguments, ToolContext, ToolHandler, display_name, file_path_property, object_schema,
    parse_args,
};
pub use content::ContentTools;
pub use events::{EDITOR_SOURCE, EventTools};
pub use metadata::MetadataTools;
pub use validation::ValidationTools;
pub use workflow::WorkflowTools;
