use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::security::templates;
use crate::security::types::{FirewallSet, Partner, PartnerKind};

// Optional "<account>/" prefix marks a reference owned by another account
static SET_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{12}/)?sg-[0-9A-Za-z]+$").expect("set id pattern is valid")
});

/// Returns true when the partner string names another firewall set
pub fn is_set_reference(raw: &str) -> bool {
    SET_ID_PATTERN.is_match(raw.trim())
}

/// Resolves rule partners against the firewall sets known to one scan.
pub struct PeerResolver {
    names: HashMap<String, String>,
}

impl PeerResolver {
    pub fn new(sets: &[FirewallSet]) -> Self {
        let names = sets
            .iter()
            .map(|set| (set.id.clone(), set.display_name().to_string()))
            .collect();
        PeerResolver { names }
    }

    /// Classify a raw partner string and render its display name.
    ///
    /// Network ranges keep the literal string so `0.0.0.0/0` survives for the
    /// analyzer. Set references unknown to this scan (cross-account, deleted)
    /// fall back to the id.
    pub fn resolve(&self, raw: &str) -> Partner {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Partner {
                raw: String::new(),
                kind: PartnerKind::NetworkRange,
                display_name: templates::PLACEHOLDER.to_string(),
            };
        }

        if is_set_reference(trimmed) {
            let display_name = self
                .names
                .get(trimmed)
                .cloned()
                .unwrap_or_else(|| trimmed.to_string());
            Partner {
                raw: trimmed.to_string(),
                kind: PartnerKind::SetReference,
                display_name,
            }
        } else {
            Partner {
                raw: trimmed.to_string(),
                kind: PartnerKind::NetworkRange,
                display_name: trimmed.to_string(),
            }
        }
    }

    pub fn name_of(&self, set_id: &str) -> Option<&str> {
        self.names.get(set_id).map(|name| name.as_str())
    }
}
