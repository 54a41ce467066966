//! Scripted completion provider
//!
//! Replays a fixed sequence of replies and records every request it
//! receives. Used by tests and by offline runs that must not reach a
//! hosted model.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CompletionProvider, CompletionResult, Message, ToolCallRequest};
use crate::error::{Error, Result};
use crate::tools::ToolDefinition;

/// One scripted step
enum Step {
    Reply(CompletionResult),
    Fail(String),
}

/// A request as the provider saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Provider that answers from a queue of canned results
pub struct ScriptedProvider {
    model: String,
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
    /// Reply used once the queue runs dry; an error is returned otherwise
    fallback: Option<CompletionResult>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
            fallback: None,
        }
    }

    /// Queue a final text reply
    pub fn reply_text(self, content: impl Into<String>) -> Self {
        self.reply(CompletionResult::text(content))
    }

    /// Queue a reply requesting the given `(id, name, arguments)` tool calls
    pub fn reply_tool_calls<I, S>(self, calls: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S)>,
        S: Into<String>,
    {
        let calls = calls
            .into_iter()
            .map(|(id, name, args)| ToolCallRequest::new(id, name, args))
            .collect();
        self.reply(CompletionResult::tool_calls(calls))
    }

    /// Queue an arbitrary reply
    pub fn reply(self, result: CompletionResult) -> Self {
        self.steps.lock().push_back(Step::Reply(result));
        self
    }

    /// Queue a provider failure
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.steps.lock().push_back(Step::Fail(message.into()));
        self
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer with `result` whenever the queue is empty
    pub fn with_fallback(mut self, result: CompletionResult) -> Self {
        self.fallback = Some(result);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<CompletionResult> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self.steps.lock().pop_front();
        match step {
            Some(Step::Reply(result)) => Ok(result),
            Some(Step::Fail(message)) => Err(Error::Provider(message)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| Error::Provider("Scripted provider has no replies left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let provider = ScriptedProvider::new()
            .reply_tool_calls([("c1", "list_tasks", "{}")])
            .reply_text("All done");

        let first = provider.complete(&[Message::user("hi")], &[]).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "list_tasks");
        let second = provider.complete(&[], &[]).await.unwrap();
        assert_eq!(second.content.as_deref(), Some("All done"));

        assert_eq!(provider.request_count(), 2);
        assert_eq!(provider.requests()[0].messages[0].content, "hi");
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_and_failures() {
        let provider = ScriptedProvider::new().fail("boom");
        assert!(matches!(provider.complete(&[], &[]).await, Err(Error::Provider(m)) if m == "boom"));
        assert!(provider.complete(&[], &[]).await.is_err());

        let provider = ScriptedProvider::new().with_fallback(CompletionResult::text("ok"));
        assert_eq!(provider.complete(&[], &[]).await.unwrap().content.as_deref(), Some("ok"));
    }
}
