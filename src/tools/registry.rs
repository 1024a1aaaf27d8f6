//! Tool registry and per-query dispatch.

use super::{Source, Tool, ToolSpec};
use crate::error::{CoursemateError, Result};
use crate::llm::{ToolCallRequest, ToolResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

struct Entry {
    spec: ToolSpec,
    tool: Arc<dyn Tool>,
}

/// Registered tools, kept in registration order.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
}

/// Outcome of dispatching one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    /// Result text, or readable error text when `is_error` is set.
    pub content: String,
    pub is_error: bool,
    /// Provenance reported by the tool, if it tracks any.
    pub sources: Option<Vec<Source>>,
}

impl Dispatch {
    fn failed(error: CoursemateError) -> Self {
        Self {
            content: error.to_string(),
            is_error: true,
            sources: None,
        }
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let spec = tool.spec();
        if self.by_name.contains_key(&spec.name) {
            return Err(CoursemateError::DuplicateTool(spec.name));
        }
        self.by_name.insert(spec.name.clone(), self.entries.len());
        self.entries.push(Entry { spec, tool });
        Ok(())
    }

    /// Tool advertisements in registration order.
    pub fn list_specs(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Execute a tool by name.
    ///
    /// Never fails: an unknown name or a failing tool produces error text the
    /// model can read and react to.
    pub async fn dispatch(&self, name: &str, arguments: serde_json::Value) -> Dispatch {
        self.dispatch_indexed(name, arguments).await.1
    }

    async fn dispatch_indexed(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> (Option<usize>, Dispatch) {
        let Some(&index) = self.by_name.get(name) else {
            warn!("Model requested unknown tool: {}", name);
            return (
                None,
                Dispatch::failed(CoursemateError::ToolNotFound(name.to_string())),
            );
        };

        info!("Calling tool: {} with args: {}", name, arguments);

        let dispatch = match self.entries[index].tool.execute(arguments).await {
            Ok(output) => Dispatch {
                content: output.text,
                is_error: false,
                sources: output.sources,
            },
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                let message = match e {
                    CoursemateError::ToolExecution(message) => message,
                    other => other.to_string(),
                };
                Dispatch::failed(CoursemateError::ToolExecution(message))
            }
        };

        (Some(index), dispatch)
    }

    /// Start a per-query session with an empty provenance buffer.
    pub fn session(&self) -> ToolSession<'_> {
        ToolSession {
            registry: self,
            latest: vec![None; self.entries.len()],
        }
    }
}

/// Executes tool calls on behalf of the agent loop.
#[async_trait]
pub trait ToolDispatcher: Send {
    /// Run one call; the result always carries the request's `call_id`.
    async fn dispatch(&mut self, call: &ToolCallRequest) -> ToolResult;
}

/// Dispatch scoped to one query, holding the provenance gathered so far.
///
/// Each tool's entry is replaced by its most recent invocation; sources are
/// never accumulated across calls of the same tool.
pub struct ToolSession<'a> {
    registry: &'a ToolRegistry,
    latest: Vec<Option<Vec<Source>>>,
}

impl ToolSession<'_> {
    /// All current sources, in registration order then per-tool match order.
    pub fn collect_sources(&self) -> Vec<Source> {
        self.latest.iter().flatten().flatten().cloned().collect()
    }

    /// Clear provenance for every tool.
    pub fn reset_sources(&mut self) {
        self.latest.iter_mut().for_each(|s| *s = None);
    }

    /// Collect then clear.
    pub fn take_sources(&mut self) -> Vec<Source> {
        let sources = self.collect_sources();
        self.reset_sources();
        sources
    }
}

#[async_trait]
impl<'a> ToolDispatcher for ToolSession<'a> {
    async fn dispatch(&mut self, call: &ToolCallRequest) -> ToolResult {
        let (index, dispatch) = self
            .registry
            .dispatch_indexed(&call.tool_name, call.arguments.clone())
            .await;

        if let (Some(index), Some(sources)) = (index, dispatch.sources) {
            self.latest[index] = Some(sources);
        }

        ToolResult {
            call_id: call.call_id.clone(),
            content: dispatch.content,
            is_error: dispatch.is_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EchoTool, FailingTool, SourcingTool};

    fn call(id: &str, name: &str) -> ToolCallRequest {
        ToolCallRequest {
            call_id: id.to_string(),
            tool_name: name.to_string(),
            arguments: serde_json::json!({"query": "q"}),
        }
    }

    #[test]
    fn test_register_rejects_duplicate_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();
        let err = registry.register(Arc::new(EchoTool::named("echo"))).unwrap_err();
        assert!(matches!(err, CoursemateError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_list_specs_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("zeta"))).unwrap();
        registry.register(Arc::new(EchoTool::named("alpha"))).unwrap();

        let names: Vec<_> = registry.list_specs().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool_returns_error_text() {
        let registry = ToolRegistry::new();
        let dispatch = registry
            .dispatch("nonexistent_tool", serde_json::json!({}))
            .await;

        assert!(dispatch.is_error);
        assert!(dispatch.content.to_lowercase().contains("not found"));
        assert!(dispatch.content.contains("nonexistent_tool"));
    }

    #[tokio::test]
    async fn test_dispatch_failure_becomes_text() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FailingTool::new("DB unavailable")))
            .unwrap();

        let dispatch = registry.dispatch("failing", serde_json::json!({})).await;
        assert!(dispatch.is_error);
        assert_eq!(dispatch.content, "Tool execution failed: DB unavailable");
    }

    #[tokio::test]
    async fn test_dispatch_delegates_to_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();

        let dispatch = registry
            .dispatch("echo", serde_json::json!({"query": "lesson text"}))
            .await;
        assert!(!dispatch.is_error);
        assert!(dispatch.content.contains("lesson text"));
        assert_eq!(dispatch.sources, None);
    }

    #[tokio::test]
    async fn test_session_result_keeps_call_id() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();
        let mut session = registry.session();

        let found = session.dispatch(&call("t99", "echo")).await;
        let missing = session.dispatch(&call("t100", "missing")).await;

        assert_eq!(found.call_id, "t99");
        assert!(!found.is_error);
        assert_eq!(missing.call_id, "t100");
        assert!(missing.is_error);
    }

    #[tokio::test]
    async fn test_collect_sources_in_registration_order() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(SourcingTool::new("first", &["A - Lesson 1"])))
            .unwrap();
        registry
            .register(Arc::new(SourcingTool::new("second", &["B - Lesson 1", "B - Lesson 2"])))
            .unwrap();
        let mut session = registry.session();

        // Dispatch in reverse order; collection still follows registration.
        session.dispatch(&call("1", "second")).await;
        session.dispatch(&call("2", "first")).await;

        let labels: Vec<_> = session
            .collect_sources()
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["A - Lesson 1", "B - Lesson 1", "B - Lesson 2"]);
    }

    #[tokio::test]
    async fn test_reset_sources_is_idempotent() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(SourcingTool::new("first", &["A"])))
            .unwrap();
        let mut session = registry.session();
        session.dispatch(&call("1", "first")).await;
        assert_eq!(session.collect_sources().len(), 1);

        session.reset_sources();
        assert!(session.collect_sources().is_empty());
        session.reset_sources();
        assert!(session.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_take_sources_clears_buffer() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(SourcingTool::new("first", &["A", "B"])))
            .unwrap();
        let mut session = registry.session();
        session.dispatch(&call("1", "first")).await;

        assert_eq!(session.take_sources().len(), 2);
        assert!(session.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_sources() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(SourcingTool::new("first", &["A"])))
            .unwrap();

        let mut one = registry.session();
        let two = registry.session();
        one.dispatch(&call("1", "first")).await;

        assert_eq!(one.collect_sources().len(), 1);
        assert!(two.collect_sources().is_empty());
    }
}
