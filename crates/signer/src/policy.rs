use std::collections::{HashMap, HashSet};

use crate::config::ServerConfig;

/// Decides whether an authenticated client may sign with a key.
pub trait AccessPolicy: Send + Sync {
    fn allowed(&self, client: &str, key_name: &str) -> bool;
}

/// Grants access when the client and the key share at least one role.
///
/// Clients or keys that are not configured are always denied.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    client_roles: HashMap<String, HashSet<String>>,
    key_roles: HashMap<String, HashSet<String>>,
}

impl RolePolicy {
    pub fn from_config(config: &ServerConfig) -> Self {
        let client_roles = config
            .clients
            .iter()
            .map(|(name, client)| (name.clone(), client.roles.iter().cloned().collect()))
            .collect();
        let key_roles = config
            .keys
            .iter()
            .map(|(name, key)| (name.clone(), key.roles.iter().cloned().collect()))
            .collect();
        Self {
            client_roles,
            key_roles,
        }
    }
}

impl AccessPolicy for RolePolicy {
    fn allowed(&self, client: &str, key_name: &str) -> bool {
        let (Some(client_roles), Some(key_roles)) =
            (self.client_roles.get(client), self.key_roles.get(key_name))
        else {
            return false;
        };
        !client_roles.is_disjoint(key_roles)
    }
}
