//! OpenAI chat completions backend for [`ModelService`].

use super::{
    ContentBlock, ModelRequest, ModelResponse, ModelService, StopReason, ToolCallRequest,
    ToolChoice, Turn,
};
use crate::config::ModelSettings;
use crate::error::{CoursemateError, Result};
use crate::openai::create_client_with_timeout;
use crate::tools::ToolSpec;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FinishReason, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Chat model served by the OpenAI API.
pub struct OpenAiModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiModel {
    /// Create a model client from settings.
    pub fn with_settings(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_secs))?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ModelService for OpenAiModel {
    #[instrument(skip(self, request), fields(model = %self.model, turns = request.transcript.len()))]
    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse> {
        let messages = to_messages(request.system, request.transcript)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_tokens);

        if let Some(tools) = request.tools {
            args.tools(tools.iter().map(to_tool_definition).collect::<Vec<_>>());
            if let Some(ToolChoice::Auto) = request.tool_choice {
                args.tool_choice(ChatCompletionToolChoiceOption::Auto);
            }
        }

        let chat_request = args.build().map_err(model_error)?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| CoursemateError::Model(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CoursemateError::Model("No response from model".to_string()))?;

        debug!("Model finished with {:?}", choice.finish_reason);

        Ok(from_choice(
            choice.message.content,
            choice.message.tool_calls,
            choice.finish_reason,
        ))
    }
}

fn model_error(e: impl std::fmt::Display) -> CoursemateError {
    CoursemateError::Model(e.to_string())
}

/// Convert the system context and transcript into chat messages.
///
/// A tool-results turn becomes one `tool` message per result, each carrying
/// the id of the call it answers.
fn to_messages(system: &str, transcript: &[Turn]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(model_error)?
            .into(),
    ];

    for turn in transcript {
        match turn {
            Turn::User(text) => messages.push(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(text.as_str())
                    .build()
                    .map_err(model_error)?
                    .into(),
            ),
            Turn::Assistant(blocks) => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                let text = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        ContentBlock::ToolCall(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                if !text.is_empty() {
                    builder.content(text);
                }

                let tool_calls: Vec<ChatCompletionMessageToolCall> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolCall(call) => Some(to_message_tool_call(call)),
                        ContentBlock::Text { .. } => None,
                    })
                    .collect();
                if !tool_calls.is_empty() {
                    builder.tool_calls(tool_calls);
                }

                messages.push(builder.build().map_err(model_error)?.into());
            }
            Turn::ToolResults(results) => {
                for result in results {
                    messages.push(
                        ChatCompletionRequestToolMessageArgs::default()
                            .tool_call_id(result.call_id.as_str())
                            .content(result.content.as_str())
                            .build()
                            .map_err(model_error)?
                            .into(),
                    );
                }
            }
        }
    }

    Ok(messages)
}

fn to_message_tool_call(call: &ToolCallRequest) -> ChatCompletionMessageToolCall {
    let arguments = match &call.arguments {
        serde_json::Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };

    ChatCompletionMessageToolCall {
        id: call.call_id.clone(),
        r#type: ChatCompletionToolType::Function,
        function: FunctionCall {
            name: call.tool_name.clone(),
            arguments,
        },
    }
}

fn to_tool_definition(spec: &ToolSpec) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: spec.name.clone(),
            description: Some(spec.description.clone()),
            parameters: Some(spec.parameters.clone()),
            strict: None,
        },
    }
}

/// Build a [`ModelResponse`] from the first choice of a completion.
///
/// Arguments that are not valid JSON are kept as a raw string value, so the
/// tool rejects them and the model sees the failure as a tool result.
fn from_choice(
    content: Option<String>,
    tool_calls: Option<Vec<ChatCompletionMessageToolCall>>,
    finish_reason: Option<FinishReason>,
) -> ModelResponse {
    let mut blocks = Vec::new();

    if let Some(text) = content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text { text });
    }

    let tool_calls = tool_calls.unwrap_or_default();
    let has_tool_calls = !tool_calls.is_empty();

    for tool_call in tool_calls {
        let arguments = serde_json::from_str(&tool_call.function.arguments)
            .unwrap_or(serde_json::Value::String(tool_call.function.arguments));
        blocks.push(ContentBlock::ToolCall(ToolCallRequest {
            call_id: tool_call.id,
            tool_name: tool_call.function.name,
            arguments,
        }));
    }

    let stop_reason = match finish_reason {
        _ if has_tool_calls => StopReason::ToolUse,
        Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => StopReason::ToolUse,
        Some(FinishReason::Length) => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    };

    ModelResponse {
        stop_reason,
        blocks,
    }
}
