//! Language model service abstraction.
//!
//! The agent only depends on [`ModelService`]: given a transcript, a system
//! context and optionally a set of advertised tools, return either a final
//! text answer or a request to invoke tools.

mod openai;

pub use openai::OpenAiModel;

use crate::error::Result;
use crate::tools::ToolSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request from the model to invoke one tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Model-assigned id, unique within one model turn.
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// The outcome of one tool call, matched to its request by `call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

/// One block of a model turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolCall(ToolCallRequest),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }
}

/// A turn in the agent's working transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    /// Text from the user.
    User(String),
    /// A model turn, possibly carrying tool calls.
    Assistant(Vec<ContentBlock>),
    /// Results for every tool call of the preceding assistant turn.
    ToolResults(Vec<ToolResult>),
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
}

/// How the model may pick among advertised tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    Auto,
}

/// A single model-service call.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub transcript: &'a [Turn],
    pub tools: Option<&'a [ToolSpec]>,
    pub tool_choice: Option<ToolChoice>,
}

impl<'a> ModelRequest<'a> {
    /// A request that advertises no tools.
    pub fn new(system: &'a str, transcript: &'a [Turn]) -> Self {
        Self {
            system,
            transcript,
            tools: None,
            tool_choice: None,
        }
    }

    /// Advertise tools with automatic tool choice.
    pub fn with_tools(mut self, tools: &'a [ToolSpec]) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some(ToolChoice::Auto);
        self
    }
}

/// The model's reply to a [`ModelRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub stop_reason: StopReason,
    pub blocks: Vec<ContentBlock>,
}

impl ModelResponse {
    /// A plain text answer.
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            blocks: vec![ContentBlock::text(text)],
        }
    }

    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// The first text block, or an empty string when there is none.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .find_map(|b| match b {
                ContentBlock::Text { text } => Some(text.clone()),
                ContentBlock::ToolCall(_) => None,
            })
            .unwrap_or_default()
    }

    /// Tool calls in the order the model emitted them.
    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolCall(call) => Some(call),
                ContentBlock::Text { .. } => None,
            })
            .collect()
    }
}

/// A chat model that can optionally request tool calls.
#[async_trait]
pub trait ModelService: Send + Sync {
    /// Run one model call. Transport and protocol failures are returned as errors.
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse>;
}
