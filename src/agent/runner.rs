//! Agent runner with a bounded tool calling loop.

use crate::error::Result;
use crate::llm::{ModelRequest, ModelResponse, ModelService, Turn};
use crate::tools::{ToolDispatcher, ToolSpec};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of tool execution rounds per question.
pub const MAX_TOOL_ROUNDS: usize = 2;

/// Answers questions, searching through tools when the model asks to.
pub struct Agent {
    model: Arc<dyn ModelService>,
    system_prompt: String,
}

impl Agent {
    /// Create a new agent over a model service and base system prompt.
    pub fn new(model: Arc<dyn ModelService>, system_prompt: impl Into<String>) -> Self {
        Self {
            model,
            system_prompt: system_prompt.into(),
        }
    }

    /// Fixed instructions, followed by prior conversation when there is any.
    fn system_context(&self, history: Option<&str>) -> String {
        match history.filter(|h| !h.is_empty()) {
            Some(h) => format!("{}\n\nPrevious conversation:\n{}", self.system_prompt, h),
            None => self.system_prompt.clone(),
        }
    }

    /// Generate an answer for `query`.
    ///
    /// Tools stay advertised for up to [`MAX_TOOL_ROUNDS`] rounds. If the model
    /// still wants tools after the last round, one more call is made without
    /// tools so it has to answer from the results gathered so far. Tool
    /// failures reach the model as result text; only model-service errors are
    /// returned.
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tool_specs: Option<&[ToolSpec]>,
        mut tools: Option<&mut (dyn ToolDispatcher + '_)>,
    ) -> Result<String> {
        let system = self.system_context(history);
        let advertised = tool_specs.filter(|specs| !specs.is_empty());
        let mut transcript = vec![Turn::User(query.to_string())];
        let mut rounds = 0;

        while rounds < MAX_TOOL_ROUNDS {
            debug!("Agent round {}", rounds + 1);

            let response = self.call(&system, &transcript, advertised).await?;

            let dispatcher = match tools.as_deref_mut() {
                Some(dispatcher) if response.requests_tools() => dispatcher,
                _ => return Ok(response.text()),
            };

            let calls: Vec<_> = response.tool_calls().into_iter().cloned().collect();
            if calls.is_empty() {
                // Defensive: tool use signalled with nothing to run.
                warn!("Model signalled tool use without any tool calls");
                return Ok(response.text());
            }

            transcript.push(Turn::Assistant(response.blocks));

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                info!("Agent calling tool: {} ({})", call.tool_name, call.call_id);
                results.push(dispatcher.dispatch(call).await);
            }
            transcript.push(Turn::ToolResults(results));

            rounds += 1;
        }

        info!("Tool rounds exhausted after {}, synthesizing answer", rounds);
        let response = self.call(&system, &transcript, None).await?;
        Ok(response.text())
    }

    async fn call(
        &self,
        system: &str,
        transcript: &[Turn],
        tools: Option<&[ToolSpec]>,
    ) -> Result<ModelResponse> {
        let request = ModelRequest::new(system, transcript);
        let request = match tools {
            Some(specs) => request.with_tools(specs),
            None => request,
        };
        self.model.complete(&request).await
    }
}
