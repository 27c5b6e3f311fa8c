//! Conversational fallback backed by the completion service
//!
//! Each call makes at most one remote attempt. A failed attempt leaves the
//! pending user turn in memory and returns the error to the caller; the
//! session stays usable.

mod memory;

pub use memory::{SessionMemory, DEFAULT_WINDOW};

use crate::llm::{LlmError, LlmRequest, LlmService};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// System prompt for a support assistant of `brand`
pub fn system_prompt(brand: &str) -> String {
    format!(
        "You are a helpful, polite and precise support assistant for {brand}, a retail \
         delivery company. Users reach you when their question was not in the FAQ or \
         when they most likely mistyped an order number; help them accordingly."
    )
}

/// Sampling and deadline settings for completion calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionSettings {
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            timeout: DEFAULT_TIMEOUT,
            max_tokens: None,
        }
    }
}

pub struct ConversationalSession {
    llm: Arc<dyn LlmService>,
    memory: SessionMemory,
    settings: CompletionSettings,
}

impl ConversationalSession {
    pub fn new(
        llm: Arc<dyn LlmService>,
        memory: SessionMemory,
        settings: CompletionSettings,
    ) -> Self {
        Self {
            llm,
            memory,
            settings,
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn memory(&self) -> &SessionMemory {
        &self.memory
    }

    /// Send `text` with the retained transcript and return the trimmed reply.
    pub async fn respond(&mut self, text: &str) -> Result<String, LlmError> {
        self.memory.push_user(text);

        tracing::debug!(turns = self.memory.len(), "Sending transcript");
        let request = LlmRequest {
            messages: self.memory.transcript(),
            temperature: Some(self.settings.temperature),
            max_tokens: self.settings.max_tokens,
        };

        let response = match timeout(self.settings.timeout, self.llm.complete(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(LlmError::timeout(format!(
                    "Request timed out after {}s",
                    self.settings.timeout.as_secs()
                )));
            }
        };

        let reply = response.text.trim();
        if reply.is_empty() {
            return Err(LlmError::malformed("Empty completion in response"));
        }

        self.memory.push_assistant(reply);
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ConversationTurn, LlmErrorKind, LlmResponse, MessageRole};
    use crate::testing::{DelayedMockLlmClient, MockLlmClient};

    fn session(mock: Arc<MockLlmClient>, window: usize) -> ConversationalSession {
        ConversationalSession::new(
            mock,
            SessionMemory::new("sys", window),
            CompletionSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_success_appends_trimmed_reply() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("  Sure, happy to help.\n"));
        let mut session = session(mock.clone(), 8);

        let reply = session.respond("hello").await.unwrap();
        assert_eq!(reply, "Sure, happy to help.");
        assert_eq!(
            session.memory().transcript(),
            vec![
                ConversationTurn::system("sys"),
                ConversationTurn::user("hello"),
                ConversationTurn::assistant("Sure, happy to help."),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_carries_transcript_and_settings() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("one"));
        mock.queue_response(LlmResponse::text("two"));
        let mut session = ConversationalSession::new(
            mock.clone(),
            SessionMemory::new("sys", 8),
            CompletionSettings {
                temperature: 0.3,
                ..CompletionSettings::default()
            },
        );

        session.respond("first").await.unwrap();
        session.respond("second").await.unwrap();

        let requests = mock.recorded_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].temperature, Some(0.3));
        let roles: Vec<_> = requests[1].messages.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            [
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_pending_user_turn_only() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_error(LlmError::server_error("Server error: overloaded"));
        mock.queue_response(LlmResponse::text("back online"));
        let mut session = session(mock.clone(), 8);

        let err = session.respond("are you there?").await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::ServerError);
        assert_eq!(session.memory().len(), 2);
        assert_eq!(
            session.memory().last(),
            &ConversationTurn::user("are you there?")
        );

        // The next call sends both user turns and adds exactly one reply.
        let reply = session.respond("hello?").await.unwrap();
        assert_eq!(reply, "back online");
        assert_eq!(mock.recorded_requests()[1].messages.len(), 3);
        assert_eq!(
            session.memory().transcript(),
            vec![
                ConversationTurn::system("sys"),
                ConversationTurn::user("are you there?"),
                ConversationTurn::user("hello?"),
                ConversationTurn::assistant("back online"),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_completion_is_malformed() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("   "));
        let mut session = session(mock, 8);

        let err = session.respond("hi").await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::MalformedResponse);
        assert_eq!(session.memory().last().role, MessageRole::User);
    }

    #[tokio::test]
    async fn test_window_bounds_memory_across_calls() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        for i in 0..5 {
            mock.queue_response(LlmResponse::text(format!("a{i}")));
        }
        let mut session = session(mock, 2);
        for i in 0..5 {
            session.respond(&format!("u{i}")).await.unwrap();
        }

        assert_eq!(
            session.memory().transcript(),
            vec![
                ConversationTurn::system("sys"),
                ConversationTurn::user("u3"),
                ConversationTurn::assistant("a3"),
                ConversationTurn::user("u4"),
                ConversationTurn::assistant("a4"),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_window_still_sends_question() {
        let mock = Arc::new(MockLlmClient::new("mock"));
        mock.queue_response(LlmResponse::text("It is on its way."));
        let mut session = session(mock.clone(), 0);

        session.respond("where is my parcel").await.unwrap();
        assert_eq!(
            mock.recorded_requests()[0].messages,
            vec![
                ConversationTurn::system("sys"),
                ConversationTurn::user("where is my parcel"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let mock = Arc::new(DelayedMockLlmClient::new("slow", Duration::from_secs(60)));
        mock.queue_response(LlmResponse::text("too late"));
        let mut session = ConversationalSession::new(
            mock.clone(),
            SessionMemory::new("sys", 8),
            CompletionSettings::default(),
        );

        let err = session.respond("hi").await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Timeout);
        assert!(err.is_retryable());
        assert_eq!(mock.recorded_requests().len(), 1);
        assert_eq!(session.memory().len(), 2);
    }

    #[test]
    fn test_system_prompt_names_brand() {
        assert!(system_prompt("Shoply").contains("Shoply"));
    }
}
