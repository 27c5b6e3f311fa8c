//! Intent routing for a single turn of user input
//!
//! Priority: exit token, `/order` command, FAQ match, conversational
//! fallback. The first handler that claims the input produces the reply.

use crate::knowledge::KnowledgeBase;
use crate::llm::LlmError;
use crate::session::ConversationalSession;

pub const ORDER_COMMAND: &str = "/order";
pub const DEFAULT_EXIT_TOKENS: &[&str] = &["exit", "quit", "выход"];

/// How an input line is classified, before any handler runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent<'a> {
    /// Whitespace only; not routed at all
    Empty,
    Exit,
    /// `/order` with its first argument, if any
    Order(Option<&'a str>),
    FreeText(&'a str),
}

/// Which handler produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Order,
    Faq,
    Conversation,
}

impl ReplySource {
    pub fn as_str(self) -> &'static str {
        match self {
            ReplySource::Order => "order",
            ReplySource::Faq => "faq",
            ReplySource::Conversation => "conversation",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    /// Input was blank; re-prompt without side effects
    Ignored,
    /// Clean end of session
    Exit,
    Answer { text: String, source: ReplySource },
    /// The conversational fallback failed; the session continues
    Failed(LlmError),
}

pub fn order_not_found(order_id: &str) -> String {
    format!("Sorry, order with ID {order_id} was not found.")
}

pub fn order_id_missing() -> String {
    format!("Sorry, no order was found without an ID. Usage: {ORDER_COMMAND} <id>")
}

pub struct IntentRouter {
    knowledge: KnowledgeBase,
    session: ConversationalSession,
    exit_tokens: Vec<String>,
}

impl IntentRouter {
    pub fn new(knowledge: KnowledgeBase, session: ConversationalSession) -> Self {
        Self::with_exit_tokens(knowledge, session, DEFAULT_EXIT_TOKENS.iter().copied())
    }

    pub fn with_exit_tokens<I, S>(
        knowledge: KnowledgeBase,
        session: ConversationalSession,
        exit_tokens: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            knowledge,
            session,
            exit_tokens: exit_tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    #[allow(dead_code)] // Used in tests
    pub fn session(&self) -> &ConversationalSession {
        &self.session
    }

    pub fn classify<'a>(&self, input: &'a str) -> Intent<'a> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Intent::Empty;
        }

        let folded = trimmed.to_lowercase();
        if self.exit_tokens.iter().any(|t| *t == folded) {
            return Intent::Exit;
        }

        if folded.starts_with(ORDER_COMMAND) {
            return Intent::Order(trimmed.split_whitespace().nth(1));
        }

        Intent::FreeText(trimmed)
    }

    /// Route one input line to its handler and produce the reply
    pub async fn route(&mut self, input: &str) -> Reply {
        match self.classify(input) {
            Intent::Empty => Reply::Ignored,
            Intent::Exit => Reply::Exit,
            Intent::Order(order_id) => {
                let text = match order_id {
                    Some(id) => self
                        .knowledge
                        .orders
                        .format(id)
                        .unwrap_or_else(|| order_not_found(id)),
                    None => {
                        tracing::debug!(input, "Order command without an id");
                        order_id_missing()
                    }
                };
                Reply::Answer {
                    text,
                    source: ReplySource::Order,
                }
            }
            Intent::FreeText(text) => {
                if let Some(answer) = self.knowledge.faq.find_answer(text) {
                    return Reply::Answer {
                        text: answer.to_string(),
                        source: ReplySource::Faq,
                    };
                }
                match self.session.respond(text).await {
                    Ok(text) => Reply::Answer {
                        text,
                        source: ReplySource::Conversation,
                    },
                    Err(e) => Reply::Failed(e),
                }
            }
        }
    }
}
