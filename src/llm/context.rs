use super::client::{Message, Role};

/// Append-only conversation log, opened by the system prompt.
///
/// The only removal is [`Conversation::pop_unanswered_user`], used to roll back
/// a turn whose request failed before anything else was appended.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.push(Message::assistant(content));
    }

    /// All messages in order, system prompt first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Remove the last message if it is a user message nobody answered
    pub fn pop_unanswered_user(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(message) if message.role == Role::User => self.messages.pop(),
            _ => None,
        }
    }

    /// Number of messages, including the system prompt
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when only the system prompt is present
    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    /// Get context summary for debugging
    pub fn summary(&self) -> String {
        let count = |role: Role| self.messages.iter().filter(|m| m.role == role).count();
        format!(
            "Context: {} messages ({} user, {} assistant, {} tool)",
            self.len(),
            count(Role::User),
            count(Role::Assistant),
            count(Role::Tool)
        )
    }
}
