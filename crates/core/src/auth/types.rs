use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

use crate::hooks::Accountability;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub claims: HashMap<String, serde_json::Value>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
            admin: true,
            claims: HashMap::new(),
        }
    }

    pub fn admin(user_id: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            method: method.into(),
            admin: true,
            claims: HashMap::new(),
        }
    }

    /// Accountability recorded for writes made by this identity.
    pub fn accountability(&self) -> Accountability {
        Accountability {
            user: Some(self.user_id.clone()),
            admin: self.admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_identity() {
        let identity = Identity::anonymous();
        assert_eq!(identity.user_id, "anonymous");
        assert_eq!(identity.method, "none");
        assert!(identity.claims.is_empty());
    }

    #[test]
    fn test_accountability_carries_user() {
        let accountability = Identity::admin("admin", "admin_token").accountability();
        assert_eq!(accountability.user.as_deref(), Some("admin"));
        assert!(accountability.admin);
    }

    #[test]
    fn test_identity_deserializes_without_optional_fields() {
        let identity: Identity =
            serde_json::from_str(r#"{"user_id":"admin","method":"admin_token"}"#).unwrap();
        assert_eq!(identity.user_id, "admin");
        assert!(!identity.admin);
        assert!(identity.claims.is_empty());
    }
}
