//! Static knowledge base: FAQ answers and order records
//!
//! Loaded once at startup and read-only afterwards. Any unreadable or
//! malformed file is fatal.

mod faq;
mod orders;

pub use faq::{FaqEntry, FaqMatcher};
pub use orders::{InvalidOrder, OrderBook, OrderRecord, OrderStatus, RawOrder};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid record in {path}: {source}")]
    InvalidOrder { path: PathBuf, source: InvalidOrder },
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

/// FAQ list plus order book
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub faq: FaqMatcher,
    pub orders: OrderBook,
}

impl KnowledgeBase {
    pub fn new(faq: FaqMatcher, orders: OrderBook) -> Self {
        Self { faq, orders }
    }

    /// Load both files, validating every order record
    pub fn load(faq_path: &Path, orders_path: &Path) -> KnowledgeResult<Self> {
        let entries: Vec<FaqEntry> = read_json(faq_path)?;
        let raw_orders: HashMap<String, RawOrder> = read_json(orders_path)?;
        let orders =
            OrderBook::from_raw(raw_orders).map_err(|source| KnowledgeError::InvalidOrder {
                path: orders_path.to_path_buf(),
                source,
            })?;

        let faq = FaqMatcher::new(entries);

        tracing::info!(
            faq_entries = faq.len(),
            orders = orders.len(),
            "Knowledge base loaded"
        );
        if faq.is_empty() || orders.is_empty() {
            tracing::warn!("Knowledge base has an empty FAQ list or order book");
        }

        Ok(Self::new(faq, orders))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> KnowledgeResult<T> {
    let text = std::fs::read_to_string(path).map_err(|source| KnowledgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| KnowledgeError::Json {
        path: path.to_path_buf(),
        source,
    })
}
