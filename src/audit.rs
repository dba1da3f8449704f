//! Audit sink contract
//!
//! Deny events can be handed to an external sink for persistence. Delivery is
//! best-effort from a spawned task: a failing sink is logged and never turns
//! the decision itself into an error.

use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One persisted decision record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Policy the decision ran against
    pub policy_name: String,
    /// Selected identity component, including its prefix
    pub identity: String,
    /// Whether the request was admitted
    pub allowed: bool,
    /// The policy's permit limit
    pub limit: u32,
    /// Capacity remaining after the decision
    pub remaining: f64,
    /// Retry-after in milliseconds
    pub retry_after_ms: i64,
    /// Endpoint the request targeted, when known
    pub endpoint: Option<String>,
    /// When the decision was made
    pub timestamp: DateTime<Utc>,
}

/// Destination for deny events
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persist one entry
    async fn insert(&self, entry: AuditEntry) -> Result<()>;
}

/// Bounded in-memory audit sink
///
/// Oldest entries are evicted once capacity is reached.
pub struct MemoryAuditSink {
    capacity: usize,
    entries: Mutex<VecDeque<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Create a sink retaining at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Snapshot of the retained entries, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn insert(&self, entry: AuditEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(policy: &str) -> AuditEntry {
        AuditEntry {
            policy_name: policy.to_string(),
            identity: "api:k1".to_string(),
            allowed: false,
            limit: 10,
            remaining: 0.0,
            retry_after_ms: 250,
            endpoint: Some("/v1/things".to_string()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_enforces_capacity() {
        let sink = MemoryAuditSink::new(3);

        for i in 0..5 {
            sink.insert(entry(&format!("p{}", i))).await.unwrap();
        }

        let entries = sink.entries().await;
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.first().unwrap().policy_name, "p2");
        assert_eq!(entries.last().unwrap().policy_name, "p4");
    }
}
