//! Policy repository contract
//!
//! The durable source of policy definitions lives outside this crate; the
//! cache only depends on the refresh contract below. The in-memory
//! implementation backs tests and single-process deployments.

use crate::core::policy::Policy;
use crate::utils::error::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Durable source of policy definitions
#[async_trait]
pub trait PolicyRepository: Send + Sync {
    /// Fetch every persisted policy
    async fn get_policies(&self) -> Result<Vec<Policy>>;

    /// Insert or replace a policy by name
    async fn upsert_policy(&self, policy: Policy) -> Result<()>;
}

/// In-memory policy repository
#[derive(Default)]
pub struct MemoryPolicyRepository {
    policies: RwLock<HashMap<String, Policy>>,
}

impl MemoryPolicyRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-seeded with policies
    pub fn with_policies(policies: impl IntoIterator<Item = Policy>) -> Self {
        let repository = Self::new();
        {
            let mut map = repository.policies.write();
            for policy in policies {
                map.insert(policy.name.to_ascii_lowercase(), policy);
            }
        }
        repository
    }
}

#[async_trait]
impl PolicyRepository for MemoryPolicyRepository {
    async fn get_policies(&self) -> Result<Vec<Policy>> {
        Ok(self.policies.read().values().cloned().collect())
    }

    async fn upsert_policy(&self, policy: Policy) -> Result<()> {
        self.policies
            .write()
            .insert(policy.name.to_ascii_lowercase(), policy);
        Ok(())
    }
}
