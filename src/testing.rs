//! In-memory fakes shared by unit tests.

use crate::error::{CoursemateError, Result};
use crate::index::{CourseIndex, SearchMatch, SearchQuery};
use crate::llm::{
    ContentBlock, ModelRequest, ModelResponse, ModelService, StopReason, ToolCallRequest,
    ToolResult, Turn,
};
use crate::tools::{Source, Tool, ToolDispatcher, ToolOutput, ToolSpec, SEARCH_TOOL_NAME};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

/// A tool-use response with one search call per `(call_id, query)`.
pub fn tool_use(calls: &[(&str, &str)]) -> ModelResponse {
    ModelResponse {
        stop_reason: StopReason::ToolUse,
        blocks: calls
            .iter()
            .map(|(id, query)| {
                ContentBlock::ToolCall(ToolCallRequest {
                    call_id: id.to_string(),
                    tool_name: SEARCH_TOOL_NAME.to_string(),
                    arguments: serde_json::json!({ "query": query }),
                })
            })
            .collect(),
    }
}

/// What the model saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: String,
    pub transcript: Vec<Turn>,
    pub advertised_tools: bool,
}

/// Model that replays canned responses in order.
pub struct ScriptedModel {
    responses: Mutex<VecDeque<ModelResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            system: request.system.to_string(),
            transcript: request.transcript.to_vec(),
            advertised_tools: request.tools.is_some_and(|t| !t.is_empty()),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CoursemateError::Model("script exhausted".to_string()))
    }
}

/// Dispatcher that records calls and answers each with fixed text.
pub struct RecordingDispatcher {
    pub calls: Vec<ToolCallRequest>,
    reply: String,
    is_error: bool,
}

impl RecordingDispatcher {
    pub fn replying(reply: &str) -> Self {
        Self {
            calls: Vec::new(),
            reply: reply.to_string(),
            is_error: false,
        }
    }

    pub fn failing(reply: &str) -> Self {
        Self {
            is_error: true,
            ..Self::replying(reply)
        }
    }
}

#[async_trait]
impl ToolDispatcher for RecordingDispatcher {
    async fn dispatch(&mut self, call: &ToolCallRequest) -> ToolResult {
        self.calls.push(call.clone());
        ToolResult {
            call_id: call.call_id.clone(),
            content: self.reply.clone(),
            is_error: self.is_error,
        }
    }
}

fn spec_named(name: &str) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: format!("{} tool", name),
        parameters: serde_json::json!({"type": "object"}),
    }
}

/// Echoes its arguments back, without provenance.
pub struct EchoTool {
    name: String,
}

impl EchoTool {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn spec(&self) -> ToolSpec {
        spec_named(&self.name)
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput> {
        Ok(ToolOutput::text(arguments.to_string()))
    }
}

/// Always fails with the given message.
pub struct FailingTool {
    message: String,
}

impl FailingTool {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn spec(&self) -> ToolSpec {
        spec_named("failing")
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput> {
        Err(CoursemateError::Index(self.message.clone()))
    }
}

/// Reports a fixed set of sources on every call.
pub struct SourcingTool {
    name: String,
    labels: Vec<String>,
}

impl SourcingTool {
    pub fn new(name: &str, labels: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

#[async_trait]
impl Tool for SourcingTool {
    fn spec(&self) -> ToolSpec {
        spec_named(&self.name)
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolOutput> {
        let sources = self
            .labels
            .iter()
            .map(|label| Source {
                label: label.clone(),
                url: None,
            })
            .collect();
        Ok(ToolOutput::with_sources(self.labels.join("\n"), sources))
    }
}

type RecordedQuery = (String, Option<String>, Option<u32>);

/// Index returning preset matches and recording every query.
pub struct StaticIndex {
    matches: Mutex<Vec<SearchMatch>>,
    links: HashMap<(String, u32), String>,
    failure: Mutex<Option<String>>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl StaticIndex {
    pub fn with_matches(matches: Vec<SearchMatch>) -> Self {
        Self {
            matches: Mutex::new(matches),
            links: HashMap::new(),
            failure: Mutex::new(None),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_matches(Vec::new())
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Mutex::new(Some(message.to_string())),
            ..Self::empty()
        }
    }

    pub fn with_link(mut self, course: &str, lesson: u32, url: &str) -> Self {
        self.links
            .insert((course.to_string(), lesson), url.to_string());
        self
    }

    pub fn set_matches(&self, matches: Vec<SearchMatch>) {
        *self.matches.lock().unwrap() = matches;
    }

    /// Make later searches fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap() = message.map(str::to_string);
    }

    pub fn queries(&self) -> Vec<RecordedQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseIndex for StaticIndex {
    async fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<SearchMatch>> {
        self.queries.lock().unwrap().push((
            query.query.to_string(),
            query.course_name.map(str::to_string),
            query.lesson_number,
        ));
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(CoursemateError::Index(message));
        }
        Ok(self.matches.lock().unwrap().clone())
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .links
            .get(&(course_title.to_string(), lesson_number))
            .cloned())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let mut titles: Vec<String> = self
            .matches
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.course_title.clone())
            .collect();
        let mut seen = HashSet::new();
        titles.retain(|t| seen.insert(t.clone()));
        Ok(titles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(course: &str) -> SearchMatch {
        SearchMatch {
            text: "text".to_string(),
            course_title: course.to_string(),
            lesson_number: Some(1),
        }
    }

    #[tokio::test]
    async fn test_course_titles_drops_non_adjacent_duplicates() {
        let index = StaticIndex::with_matches(vec![passage("A"), passage("B"), passage("A")]);
        assert_eq!(index.course_titles().await.unwrap(), vec!["A", "B"]);
    }
}
