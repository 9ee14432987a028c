//! Bounded diagnostic message log.
//!
//! Every component reports free-text notifications here; the presentation
//! layer renders the log newest-first. The log is ephemeral and never
//! persisted.

use crate::relay::data::Message;

/// How many messages to retain before evicting the oldest.
pub const MESSAGES_TO_KEEP: usize = 30;

/// Fixed-capacity, newest-first message ring.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, evicting the oldest entry past capacity.
    ///
    /// When the newest entry already carries the same text, only its
    /// timestamp is refreshed so a flapping board cannot flood the log.
    pub fn add(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::debug!("{}", text);

        let message = Message::new(text);
        if let Some(last) = self.messages.first() {
            if last.text == message.text {
                self.messages[0] = message;
                return;
            }
        }

        self.messages.insert(0, message);
        self.messages.truncate(MESSAGES_TO_KEEP);
    }

    /// Newest-first view of the log.
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = MessageLog::new();
        log.add("first");
        log.add("second");
        assert_eq!(log.all()[0].text, "second");
        assert_eq!(log.all()[1].text, "first");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = MessageLog::new();
        for i in 0..(MESSAGES_TO_KEEP + 5) {
            log.add(format!("message {}", i));
        }
        assert_eq!(log.all().len(), MESSAGES_TO_KEEP);
        assert_eq!(log.all()[0].text, format!("message {}", MESSAGES_TO_KEEP + 4));
        assert!(!log.all().iter().any(|m| m.text == "message 0"));
    }

    #[test]
    fn test_consecutive_duplicates_collapse() {
        let mut log = MessageLog::new();
        log.add("board 192.168.10.12 missed a check");
        log.add("board 192.168.10.12 missed a check");
        log.add("board 192.168.10.12 missed a check");
        assert_eq!(log.all().len(), 1);

        // a different message in between breaks the run
        log.add("other");
        log.add("board 192.168.10.12 missed a check");
        assert_eq!(log.all().len(), 3);
    }

    #[test]
    fn test_clear() {
        let mut log = MessageLog::new();
        log.add("something");
        log.clear();
        assert!(log.all().is_empty());
    }
}
