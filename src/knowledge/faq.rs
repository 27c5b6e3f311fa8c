//! FAQ entries and first-match lookup

use serde::Deserialize;

/// A stored question and its canned answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FaqEntry {
    #[serde(rename = "q", alias = "question")]
    pub question: String,
    #[serde(rename = "a", alias = "answer")]
    pub answer: String,
}

impl FaqEntry {
    #[allow(dead_code)] // Used in tests
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Ordered FAQ list.
///
/// Questions are case-folded once at construction; list order is match
/// priority.
#[derive(Debug, Clone, Default)]
pub struct FaqMatcher {
    entries: Vec<FaqEntry>,
    folded: Vec<String>,
}

impl FaqMatcher {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        let folded = entries.iter().map(|e| e.question.to_lowercase()).collect();
        Self { entries, folded }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Answer of the first entry whose question contains the input or is
    /// contained in it, ignoring case.
    ///
    /// Both directions count, so a very short stored question (or a very
    /// short input) matches broadly.
    pub fn find_answer(&self, text: &str) -> Option<&str> {
        let needle = text.to_lowercase();
        self.folded
            .iter()
            .position(|q| needle.contains(q.as_str()) || q.contains(needle.as_str()))
            .map(|i| self.entries[i].answer.as_str())
    }
}
