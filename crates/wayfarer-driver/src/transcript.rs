use wayfarer_abstraction::ChatMessage;

/// Append-only message history of one conversation.
///
/// Owned by a single driver invocation and dropped when it returns.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_abstraction::Role;

    #[test]
    fn test_transcript_appends_in_order() {
        let mut transcript = Transcript::new();
        assert!(transcript.is_empty());
        transcript.push(ChatMessage::system("sys"));
        transcript.push(ChatMessage::user("intent"));
        transcript.push(ChatMessage::assistant("node"));

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.messages()[1].text(), "intent");
        assert_eq!(transcript.messages()[2].role, Role::Assistant);
    }
}
