//! Order records and status rendering

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const UNKNOWN: &str = "unknown";

/// Validated order status with its per-status payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    InTransit { eta_days: u32, carrier: String },
    Delivered { delivered_at: Option<String> },
    Processing { note: Option<String> },
    /// Any other status string, echoed back verbatim
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub id: String,
    pub status: OrderStatus,
}

impl OrderRecord {
    /// Human-readable status line for this order
    pub fn describe(&self) -> String {
        let id = &self.id;
        match &self.status {
            OrderStatus::InTransit { eta_days, carrier } => format!(
                "Status of order {id}: in transit, delivery expected in {eta_days} days via {carrier}."
            ),
            OrderStatus::Delivered { delivered_at } => format!(
                "Status of order {id}: Delivered {}.",
                delivered_at.as_deref().unwrap_or(UNKNOWN)
            ),
            OrderStatus::Processing { note } => format!(
                "Status of order {id}: Processing. {}",
                note.as_deref().unwrap_or_default()
            )
            .trim()
            .to_string(),
            OrderStatus::Other(raw) => format!("Status of order {id}: {raw}."),
        }
    }
}

/// Why a raw order record could not be validated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("order {id}: {reason}")]
pub struct InvalidOrder {
    pub id: String,
    pub reason: String,
}

/// Order record as it appears on disk, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOrder {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub eta_days: Option<u32>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub delivered_at: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RawOrder {
    /// Validate into a typed record.
    ///
    /// `in_transit` needs both `eta_days` and `carrier`; every other field is
    /// optional and defaulted at render time.
    pub fn validate(self, id: &str) -> Result<OrderRecord, InvalidOrder> {
        let invalid = |reason: &str| InvalidOrder {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        let status = match self.status.as_deref() {
            Some("in_transit") => OrderStatus::InTransit {
                eta_days: self
                    .eta_days
                    .ok_or_else(|| invalid("in_transit order is missing eta_days"))?,
                carrier: self
                    .carrier
                    .ok_or_else(|| invalid("in_transit order is missing carrier"))?,
            },
            Some("delivered") => OrderStatus::Delivered {
                delivered_at: self.delivered_at,
            },
            Some("processing") => OrderStatus::Processing { note: self.note },
            Some(other) => OrderStatus::Other(other.to_string()),
            None => OrderStatus::Other(UNKNOWN.to_string()),
        };

        Ok(OrderRecord {
            id: id.to_string(),
            status,
        })
    }
}

/// Orders keyed by exact, case-sensitive id
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: HashMap<String, OrderRecord>,
}

impl OrderBook {
    pub fn new(records: impl IntoIterator<Item = OrderRecord>) -> Self {
        Self {
            orders: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Validate every raw record, failing on the first invalid one
    pub fn from_raw(raw: HashMap<String, RawOrder>) -> Result<Self, InvalidOrder> {
        let records = raw
            .into_iter()
            .map(|(id, order)| order.validate(&id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn get(&self, order_id: &str) -> Option<&OrderRecord> {
        self.orders.get(order_id)
    }

    /// Status line for `order_id`, or `None` when the id is unknown
    pub fn format(&self, order_id: &str) -> Option<String> {
        self.get(order_id).map(OrderRecord::describe)
    }
}
