//! In-memory chat session: the append-only message list plus the
//! single-request-in-flight rule.

use crate::relay_client::{ClientError, RelayApi};
use crate::state::{ChatRole, Message, MessageId};

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    next_id: u64,
    loading: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Start a submission. Returns the prompt to send, or `None` when the
    /// input is blank or a request is already in flight.
    ///
    /// On `Some`, the trimmed user message has been appended and the session
    /// is loading until [`ChatSession::complete`] is called.
    pub fn begin_submit(&mut self, input: &str) -> Option<String> {
        let prompt = input.trim();
        if prompt.is_empty() || self.loading {
            return None;
        }

        self.push(prompt.to_string(), ChatRole::User);
        self.loading = true;
        Some(prompt.to_string())
    }

    /// Finish the in-flight submission with the relay's answer or error.
    /// Always appends exactly one assistant message and clears loading.
    pub fn complete(&mut self, result: Result<String, ClientError>) -> MessageId {
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                e.user_message()
            }
        };
        self.loading = false;
        self.push(text, ChatRole::Assistant)
    }

    /// Submit and wait for the reply in one step. Returns `false` when the
    /// input was ignored.
    pub async fn submit(&mut self, input: &str, relay: &dyn RelayApi) -> bool {
        let Some(prompt) = self.begin_submit(input) else {
            return false;
        };
        let result = relay.ask(&prompt).await;
        self.complete(result);
        true
    }

    fn push(&mut self, text: String, role: ChatRole) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message::new(id, text, role));
        id
    }
}
