use log::debug;
use serde::{Deserialize, Serialize};

use crate::security::peer::PeerResolver;
use crate::security::rules::RuleExpander;
use crate::security::types::{Direction, FirewallSet, Partner, Resource, Rule};
use crate::security::usage::{ResourceDescriptor, UsageIndex};

/// Metadata of the firewall set owning a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vpc_id: String,
    pub region: String,
}

impl From<&FirewallSet> for SetMetadata {
    fn from(set: &FirewallSet) -> Self {
        SetMetadata {
            id: set.id.clone(),
            name: set.display_name().to_string(),
            description: set.description.clone(),
            vpc_id: set.vpc_id.clone(),
            region: set.region.clone(),
        }
    }
}

/// One rule paired with one attached resource, or with nothing when the set
/// is unattached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRow {
    pub set: SetMetadata,
    pub rule: Rule,
    pub resource: Option<ResourceDescriptor>,
    pub usage: bool,
}

impl JoinedRow {
    /// The partner on the source side; only inbound rules have one
    pub fn source(&self) -> Option<&Partner> {
        match self.rule.direction {
            Direction::Inbound => Some(&self.rule.partner),
            Direction::Outbound => None,
        }
    }

    /// The partner on the destination side; only outbound rules have one
    pub fn destination(&self) -> Option<&Partner> {
        match self.rule.direction {
            Direction::Outbound => Some(&self.rule.partner),
            Direction::Inbound => None,
        }
    }
}

/// Pairs each rule with the resources attaching its set.
pub struct RuleResourceJoiner<'a> {
    usage: &'a UsageIndex,
}

impl<'a> RuleResourceJoiner<'a> {
    pub fn new(usage: &'a UsageIndex) -> Self {
        RuleResourceJoiner { usage }
    }

    /// Join the rules of one set. Rules owned by another set are skipped.
    pub fn join(&self, set: &FirewallSet, rules: &[Rule]) -> Vec<JoinedRow> {
        let metadata = SetMetadata::from(set);
        let attached = self.usage.attached(&set.id);
        let mut rows = Vec::with_capacity(rules.len() * attached.len().max(1));

        for rule in rules.iter().filter(|rule| rule.set_id == set.id) {
            if attached.is_empty() {
                rows.push(JoinedRow {
                    set: metadata.clone(),
                    rule: rule.clone(),
                    resource: None,
                    usage: false,
                });
                continue;
            }

            for resource in attached {
                rows.push(JoinedRow {
                    set: metadata.clone(),
                    rule: rule.clone(),
                    resource: Some(resource.clone()),
                    usage: true,
                });
            }
        }

        rows
    }
}

/// The joined rule/resource relation of one scan. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    rows: Vec<JoinedRow>,
}

impl Relation {
    /// Run resolver, expander, usage mapper and joiner over one snapshot
    pub fn build(sets: &[FirewallSet], resources: &[Resource]) -> Self {
        let resolver = PeerResolver::new(sets);
        let usage = UsageIndex::build(resources);
        Self::build_with(sets, &resolver, &usage)
    }

    pub fn build_with(sets: &[FirewallSet], resolver: &PeerResolver, usage: &UsageIndex) -> Self {
        let expander = RuleExpander::new(resolver);
        let joiner = RuleResourceJoiner::new(usage);

        let mut rows = Vec::new();
        for set in sets {
            let rules = expander.expand(set);
            rows.extend(joiner.join(set, &rules));
        }

        debug!(
            "Joined {} firewall sets into {} rows ({} sets attached)",
            sets.len(),
            rows.len(),
            usage.len()
        );

        Relation { rows }
    }

    pub fn from_rows(rows: Vec<JoinedRow>) -> Self {
        Relation { rows }
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
