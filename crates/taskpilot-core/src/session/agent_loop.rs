//! Agent Loop - tool-calling conversation runs
//!
//! A run alternates between asking the provider for the next assistant
//! turn and executing the tools that turn requests:
//! - every requested call is answered by exactly one `tool` message,
//!   appended in request order, before the next completion request
//! - tool failures become `Error: ...` text and never abort the run
//! - provider failures abort the run
//! - the number of completion requests is bounded

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::types::{
    AgentConfig, FinishReason, LoopState, RunOutcome, FALLBACK_RESPONSE, ITERATION_LIMIT_RESPONSE,
};
use crate::error::{Error, Result};
use crate::provider::{CompletionProvider, Message, ToolCallRequest};
use crate::tools::{ToolDefinition, ToolRegistry};

/// Tag pairs some models leak into their final text
const STRAY_TAGS: [&str; 2] = ["<tool_call>", "</tool_call>"];

/// The conversation loop service
pub struct AgentLoop {
    provider: Arc<dyn CompletionProvider>,
    registry: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    pub fn provider(&self) -> &Arc<dyn CompletionProvider> {
        &self.provider
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run one conversation for `user_text` and return the final answer
    pub async fn run(&self, user_text: &str) -> Result<RunOutcome> {
        if user_text.trim().is_empty() {
            return Err(Error::Agent("Message must not be empty".to_string()));
        }

        let run_id = Uuid::new_v4();
        let span = info_span!("agent_run", %run_id, model = %self.provider.model());
        let run = self.run_inner(user_text).instrument(span);

        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                warn!(%run_id, secs = limit.as_secs(), "Agent run timed out");
                Error::Timeout(limit.as_secs())
            })?,
            None => run.await,
        }
    }

    async fn run_inner(&self, user_text: &str) -> Result<RunOutcome> {
        // The descriptor list is fixed for the whole run.
        let tools = self.registry.list_descriptors();
        let max_iterations = self.config.max_iterations.max(1);

        let mut messages = vec![
            Message::system(self.config.system_prompt.clone()),
            Message::user(user_text),
        ];
        let mut iterations = 0;
        let mut tool_calls = 0;
        let mut state = LoopState::AwaitingCompletion;

        info!(tools = tools.len(), "Agent run starting");

        loop {
            state = match state {
                LoopState::AwaitingCompletion if iterations >= max_iterations => {
                    warn!(iterations, "Iteration limit reached");
                    LoopState::Done(
                        ITERATION_LIMIT_RESPONSE.to_string(),
                        FinishReason::IterationLimit,
                    )
                }
                LoopState::AwaitingCompletion => {
                    iterations += 1;
                    self.await_completion(&mut messages, &tools, iterations).await?
                }
                LoopState::ExecutingTools(requests) => {
                    tool_calls += requests.len();
                    self.execute_tools(&mut messages, requests).await;
                    LoopState::AwaitingCompletion
                }
                LoopState::Done(response, finish_reason) => {
                    info!(iterations, tool_calls, ?finish_reason, "Agent run finished");
                    return Ok(RunOutcome {
                        response,
                        messages,
                        iterations,
                        tool_calls,
                        finish_reason,
                    });
                }
            };
        }
    }

    async fn await_completion(
        &self,
        messages: &mut Vec<Message>,
        tools: &[ToolDefinition],
        iteration: usize,
    ) -> Result<LoopState> {
        debug!(iteration, history = messages.len(), "Requesting completion");
        let result = self.provider.complete(messages.as_slice(), tools).await?;

        if result.has_tool_calls() {
            debug!(
                iteration,
                requested = result.tool_calls.len(),
                "Model requested tools"
            );
            let requests = result.tool_calls.clone();
            messages.push(
                Message::assistant_with_tool_calls(result.content, result.tool_calls)
                    .with_reasoning_details(result.reasoning_details),
            );
            return Ok(LoopState::ExecutingTools(requests));
        }

        let response = clean_response(result.content.as_deref().unwrap_or_default());
        messages.push(Message::assistant(response.clone()));
        Ok(LoopState::Done(response, FinishReason::Completed))
    }

    /// Answer every request, appending results in request order
    async fn execute_tools(&self, messages: &mut Vec<Message>, requests: Vec<ToolCallRequest>) {
        let all_read_only = requests
            .iter()
            .all(|req| self.registry.is_read_only(&req.name));

        let results: Vec<String> = if all_read_only && requests.len() > 1 {
            debug!(count = requests.len(), "Running read-only tools concurrently");
            join_all(
                requests
                    .iter()
                    .map(|req| self.registry.invoke_encoded(&req.name, &req.arguments)),
            )
            .await
        } else {
            let mut results = Vec::with_capacity(requests.len());
            for req in &requests {
                results.push(self.registry.invoke_encoded(&req.name, &req.arguments).await);
            }
            results
        };

        for (req, text) in requests.into_iter().zip(results) {
            debug!(tool = %req.name, call_id = %req.id, "Tool result recorded");
            messages.push(Message::tool_result(req.id, req.name, text));
        }
    }
}

/// Strip stray tool-call tags and fall back when nothing is left
fn clean_response(content: &str) -> String {
    let mut text = content.to_string();
    for tag in STRAY_TAGS {
        text = text.replace(tag, "");
    }
    let text = text.trim();
    if text.is_empty() {
        FALLBACK_RESPONSE.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_response() {
        assert_eq!(clean_response("  Added milk.  "), "Added milk.");
        assert_eq!(clean_response("<tool_call>Done</tool_call>"), "Done");
        assert_eq!(clean_response(""), FALLBACK_RESPONSE);
        assert_eq!(clean_response("<tool_call></tool_call>\n"), FALLBACK_RESPONSE);
    }
}
