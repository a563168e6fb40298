use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::security::types::{FirewallSet, Resource, ResourceType};

/// The slice of a resource the reports need once it is attached to a set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub interface_id: String,
    pub private_address: String,
}

impl From<&Resource> for ResourceDescriptor {
    fn from(resource: &Resource) -> Self {
        ResourceDescriptor {
            resource_id: resource.id.clone(),
            resource_type: resource.resource_type,
            resource_name: resource.name.clone(),
            interface_id: resource.interface_id.clone(),
            private_address: resource.private_address.clone(),
        }
    }
}

/// Firewall set id -> resources attaching it.
///
/// A set missing from the index, or mapped to an empty list, is unused.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    attachments: HashMap<String, Vec<ResourceDescriptor>>,
}

impl UsageIndex {
    /// Build the index from every collected resource
    pub fn build(resources: &[Resource]) -> Self {
        let mut attachments: HashMap<String, Vec<ResourceDescriptor>> = HashMap::new();

        for resource in resources {
            let mut seen: Vec<&str> = Vec::new();
            for set_id in &resource.security_group_ids {
                let set_id = set_id.trim();
                if set_id.is_empty() || seen.contains(&set_id) {
                    continue;
                }
                seen.push(set_id);
                attachments
                    .entry(set_id.to_string())
                    .or_insert_with(Vec::new)
                    .push(ResourceDescriptor::from(resource));
            }
        }

        UsageIndex { attachments }
    }

    pub fn attached(&self, set_id: &str) -> &[ResourceDescriptor] {
        self.attachments
            .get(set_id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_used(&self, set_id: &str) -> bool {
        !self.attached(set_id).is_empty()
    }

    /// Sets from the given list that nothing attaches
    pub fn unused_sets<'a>(&self, sets: &'a [FirewallSet]) -> Vec<&'a FirewallSet> {
        sets.iter().filter(|set| !self.is_used(&set.id)).collect()
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}
