//! Tools the agent can call, their registry, and provenance tracking.
//!
//! A tool advertises a [`ToolSpec`] and executes against structured JSON
//! arguments. Tools that are backed by course material also report the
//! [`Source`]s behind their result; the registry hands those back to the
//! caller instead of keeping them on the tool.

mod registry;
mod search;

pub use registry::{Dispatch, ToolDispatcher, ToolRegistry, ToolSession};
pub use search::{CourseSearchTool, SEARCH_TOOL_NAME};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Advertisement of a tool to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments.
    pub parameters: serde_json::Value,
}

/// Provenance of one passage that backed a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Human-readable label, e.g. "Course X - Lesson 2".
    pub label: String,
    pub url: Option<String>,
}

/// Output of a successful tool execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    /// `None` for tools that do not track provenance.
    pub sources: Option<Vec<Source>>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }

    pub fn with_sources(text: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            text: text.into(),
            sources: Some(sources),
        }
    }
}

/// A capability the model can invoke by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and argument schema. Must be stable for the tool's lifetime.
    fn spec(&self) -> ToolSpec;

    /// Execute with the arguments chosen by the model.
    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput>;
}
