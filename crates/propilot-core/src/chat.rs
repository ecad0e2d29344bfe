//! Conversation state for one terminal session.

use std::sync::Arc;

use propilot_types::{CompletionService, Conversation, Message, MessageId, Role};

use crate::reveal::RenderMode;

/// Shown in place of an answer when the completion service fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Holds the conversation and asks the completion service for answers.
pub struct ChatSession {
    completion: Arc<dyn CompletionService>,
    conversation: Conversation,
    latest_assistant: Option<MessageId>,
}

impl ChatSession {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self {
            completion,
            conversation: Conversation::new(),
            latest_assistant: None,
        }
    }

    /// Send `input` and append the answer.
    ///
    /// Blank input is ignored and returns `None`. Otherwise one request is
    /// made; on failure the apology takes the answer's place. Returns the id
    /// of the new assistant message, which becomes the latest one.
    ///
    /// The exchange is recorded only once the request settles, so dropping
    /// the future mid-request leaves the conversation untouched.
    pub async fn submit(&mut self, input: &str) -> Option<MessageId> {
        let prompt = input.trim();
        if prompt.is_empty() {
            return None;
        }

        let user = Message::user(prompt);
        let result = self.completion.complete(prompt).await;
        self.conversation.push(user);

        let content = match result {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("{} completion failed: {e}", self.completion.name());
                APOLOGY.to_string()
            }
        };

        let id = self.conversation.push(Message::assistant(content));
        self.latest_assistant = Some(id);
        Some(id)
    }

    /// Animated for the latest assistant message, static for everything else.
    pub fn render_mode(&self, message: &Message) -> RenderMode {
        let is_latest =
            message.role == Role::Assistant && self.latest_assistant == Some(message.id);
        RenderMode::for_message(is_latest)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn latest_assistant_id(&self) -> Option<MessageId> {
        self.latest_assistant
    }

    pub fn latest_assistant(&self) -> Option<&Message> {
        self.latest_assistant.and_then(|id| self.conversation.get(id))
    }

    pub fn backend_name(&self) -> &str {
        self.completion.name()
    }

    /// Forget the conversation.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.latest_assistant = None;
    }
}
