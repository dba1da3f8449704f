//! Caller identity and storage-key composition
//!
//! A storage key binds a caller to a bucket. Composition is a total,
//! deterministic, case-sensitive function of the policy name and the single
//! most-specific identity component; identity bytes pass through unmodified,
//! so callers sanitise untrusted input before it reaches this layer.

use serde::{Deserialize, Serialize};

/// Component string used when no identity component is present
pub const ANONYMOUS: &str = "anon";

/// Caller identity extracted by the enclosing middleware
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// API key credential
    #[serde(default)]
    pub api_key: Option<String>,
    /// Authenticated user id
    #[serde(default)]
    pub user_id: Option<String>,
    /// Remote address
    #[serde(default)]
    pub ip_address: Option<String>,
    /// Caller-supplied discriminator overriding all other components
    #[serde(default)]
    pub custom_discriminator: Option<String>,
}

impl Identity {
    /// Identity keyed by API key
    pub fn from_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Identity keyed by user id
    pub fn from_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    /// Identity keyed by remote address
    pub fn from_ip(ip_address: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            ..Default::default()
        }
    }

    /// Identity keyed by a custom discriminator
    pub fn from_custom(discriminator: impl Into<String>) -> Self {
        Self {
            custom_discriminator: Some(discriminator.into()),
            ..Default::default()
        }
    }

    /// Select the most-specific component and its key prefix
    ///
    /// Precedence: custom discriminator, API key, user id, IP address, then
    /// the anonymous fallback.
    pub fn component(&self) -> (&'static str, &str) {
        if let Some(custom) = &self.custom_discriminator {
            ("", custom)
        } else if let Some(api_key) = &self.api_key {
            ("api:", api_key)
        } else if let Some(user_id) = &self.user_id {
            ("user:", user_id)
        } else if let Some(ip) = &self.ip_address {
            ("ip:", ip)
        } else {
            ("", ANONYMOUS)
        }
    }

    /// The selected component without its prefix, as recorded in audit entries
    pub fn component_string(&self) -> String {
        let (prefix, component) = self.component();
        format!("{}{}", prefix, component)
    }

    /// Compose the storage key for this identity under the given policy
    pub fn storage_key(&self, policy_name: &str) -> String {
        let (prefix, component) = self.component();
        format!("{}:{}{}", policy_name, prefix, component)
    }
}
