use log::debug;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::security::join::{JoinedRow, Relation};
use crate::security::templates;
use crate::security::types::{Direction, Protocol};

/// A joined row together with the risk flags raised against it
#[derive(Debug, Clone, Serialize)]
pub struct Finding<'a> {
    pub row: &'a JoinedRow,
    pub flags: Vec<String>,
}

impl<'a> Finding<'a> {
    /// Flags joined into the single Findings value; empty when nothing matched
    pub fn text(&self) -> String {
        self.flags.join(templates::FINDING_SEPARATOR)
    }

    pub fn is_clean(&self) -> bool {
        self.flags.is_empty()
    }
}

/// owning set id -> direction -> raw partner strings of that set's rows
struct RelationIndex<'a> {
    partners: HashMap<&'a str, HashMap<Direction, HashSet<&'a str>>>,
}

impl<'a> RelationIndex<'a> {
    fn build(relation: &'a Relation) -> Self {
        let mut partners: HashMap<&'a str, HashMap<Direction, HashSet<&'a str>>> = HashMap::new();
        for row in relation.rows() {
            partners
                .entry(row.set.id.as_str())
                .or_insert_with(HashMap::new)
                .entry(row.rule.direction)
                .or_insert_with(HashSet::new)
                .insert(row.rule.partner.raw.as_str());
        }
        RelationIndex { partners }
    }

    fn has_partner(&self, set_id: &str, direction: Direction, partner: &str) -> bool {
        self.partners
            .get(set_id)
            .and_then(|by_direction| by_direction.get(&direction))
            .map(|raws| raws.contains(partner))
            .unwrap_or(false)
    }
}

/// Applies the fixed battery of risk heuristics to a joined relation.
pub struct ComplianceAnalyzer;

impl Default for ComplianceAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplianceAnalyzer {
    pub fn new() -> Self {
        ComplianceAnalyzer
    }

    /// Evaluate every row of the relation. Returns one finding per row, in
    /// relation order, including rows with no flags.
    pub fn analyze<'a>(&self, relation: &'a Relation) -> Vec<Finding<'a>> {
        let index = RelationIndex::build(relation);

        let findings: Vec<Finding<'a>> = relation
            .rows()
            .iter()
            .map(|row| Finding {
                row,
                flags: self.evaluate(row, &index),
            })
            .collect();

        debug!(
            "Analyzed {} rows, {} flagged",
            findings.len(),
            findings.iter().filter(|f| !f.is_clean()).count()
        );

        findings
    }

    fn evaluate(&self, row: &JoinedRow, index: &RelationIndex<'_>) -> Vec<String> {
        let mut flags = Vec::new();

        if self.is_open_ingress(row) {
            flags.push(templates::FINDING_OPEN_INGRESS.to_string());
        }
        if self.is_open_egress(row) {
            flags.push(templates::FINDING_OPEN_EGRESS.to_string());
        }
        if !row.usage {
            flags.push(templates::FINDING_UNUSED_SET.to_string());
        }
        if let Some(flag) = self.check_outbound_reference(row, index) {
            flags.push(flag);
        }
        if let Some(flag) = self.check_inbound_reference(row, index) {
            flags.push(flag);
        }

        flags
    }

    // SSH or every protocol reachable from anywhere. "22:" does not match.
    fn is_open_ingress(&self, row: &JoinedRow) -> bool {
        let Some(source) = row.source() else {
            return false;
        };
        if source.raw != templates::OPEN_WORLD_CIDR {
            return false;
        }
        let ports = row.rule.ports.as_str();
        ports == templates::SSH_PORT
            || ports.starts_with(templates::SSH_RANGE_PREFIX)
            || row.rule.protocol == Protocol::All
    }

    fn is_open_egress(&self, row: &JoinedRow) -> bool {
        match row.destination() {
            Some(destination) => {
                destination.raw == templates::OPEN_WORLD_CIDR && row.rule.protocol == Protocol::All
            }
            None => false,
        }
    }

    /// An outbound reference to set B expects B to accept inbound from this set
    fn check_outbound_reference(&self, row: &JoinedRow, index: &RelationIndex<'_>) -> Option<String> {
        let destination = row.destination().filter(|p| p.is_set_reference())?;

        if index.has_partner(&destination.raw, Direction::Inbound, &row.set.id) {
            return None;
        }

        let finding = templates::outbound_without_inbound(&destination.display_name);
        if index.has_partner(&destination.raw, Direction::Inbound, templates::OPEN_WORLD_CIDR) {
            Some(templates::with_open_world_note(finding, &destination.display_name))
        } else {
            Some(finding)
        }
    }

    /// An inbound reference from set A expects A to allow outbound to this set
    fn check_inbound_reference(&self, row: &JoinedRow, index: &RelationIndex<'_>) -> Option<String> {
        let source = row.source().filter(|p| p.is_set_reference())?;

        if index.has_partner(&source.raw, Direction::Outbound, &row.set.id) {
            return None;
        }

        let finding = templates::inbound_without_outbound(&source.display_name);
        if index.has_partner(&source.raw, Direction::Outbound, templates::OPEN_WORLD_CIDR) {
            Some(templates::with_open_world_note(finding, &source.display_name))
        } else {
            Some(finding)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::types::{FirewallSet, PermissionEntry, Resource, ResourceType};

    fn entry(egress: bool, protocol: &str, ports: Option<(i32, i32)>, partner: &str) -> PermissionEntry {
        PermissionEntry {
            egress,
            protocol: protocol.to_string(),
            from_port: ports.map(|p| p.0),
            to_port: ports.map(|p| p.1),
            partners: vec![partner.to_string()],
        }
    }

    fn set(id: &str, name: &str, permissions: Vec<PermissionEntry>) -> FirewallSet {
        FirewallSet {
            id: id.to_string(),
            name: name.to_string(),
            permissions,
            ..Default::default()
        }
    }

    fn attach_all(sets: &[FirewallSet]) -> Vec<Resource> {
        vec![Resource {
            id: "i-1".to_string(),
            resource_type: ResourceType::Ec2Instance,
            security_group_ids: sets.iter().map(|s| s.id.clone()).collect(),
            ..Default::default()
        }]
    }

    fn texts(relation: &Relation) -> Vec<String> {
        ComplianceAnalyzer::new()
            .analyze(relation)
            .iter()
            .map(|f| f.text())
            .collect()
    }

    #[test]
    fn test_open_ssh_ingress() {
        let sets = vec![set("sg-1", "web", vec![
            entry(false, "tcp", Some((22, 22)), "0.0.0.0/0"),
            entry(false, "tcp", Some((22, 80)), "0.0.0.0/0"),
            entry(false, "tcp", Some((2222, 2222)), "0.0.0.0/0"),
            entry(false, "tcp", Some((22, 22)), "10.0.0.0/8"),
        ])];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(
            texts(&relation),
            vec!["Inbound 0.0.0.0/0 open (22/ALL)", "Inbound 0.0.0.0/0 open (22/ALL)", "", ""]
        );
    }

    #[test]
    fn test_open_all_ingress_and_egress() {
        let sets = vec![set("sg-1", "web", vec![
            entry(false, "-1", None, "0.0.0.0/0"),
            entry(true, "-1", None, "0.0.0.0/0"),
            entry(true, "tcp", Some((443, 443)), "0.0.0.0/0"),
        ])];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(
            texts(&relation),
            vec!["Inbound 0.0.0.0/0 open (22/ALL)", "Outbound 0.0.0.0/0 open (ALL)", ""]
        );
    }

    #[test]
    fn test_unused_set_flag() {
        let sets = vec![set("sg-1", "idle", vec![entry(false, "tcp", Some((80, 80)), "10.0.0.0/8")])];
        let relation = Relation::build(&sets, &[]);

        assert_eq!(texts(&relation), vec!["Unused SG"]);
    }

    #[test]
    fn test_symmetric_references_are_clean() {
        let sets = vec![
            set("sg-a", "app", vec![entry(true, "tcp", Some((5432, 5432)), "sg-b")]),
            set("sg-b", "db", vec![entry(false, "tcp", Some((5432, 5432)), "sg-a")]),
        ];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(texts(&relation), vec!["", ""]);
    }

    #[test]
    fn test_outbound_without_inbound() {
        let sets = vec![
            set("sg-a", "app", vec![entry(true, "tcp", Some((5432, 5432)), "sg-b")]),
            set("sg-b", "db", vec![entry(false, "tcp", Some((5432, 5432)), "10.0.0.0/8")]),
        ];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(texts(&relation)[0], "Outbound references db but no matching inbound");
    }

    #[test]
    fn test_inbound_without_outbound_notes_open_egress() {
        let sets = vec![
            set("sg-a", "app", vec![entry(true, "tcp", Some((443, 443)), "0.0.0.0/0")]),
            set("sg-b", "db", vec![entry(false, "tcp", Some((5432, 5432)), "sg-a")]),
        ];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(
            texts(&relation)[1],
            "Inbound references app but no matching outbound (note: app open to 0.0.0.0/0)"
        );
    }

    #[test]
    fn test_reference_to_unknown_set() {
        let sets = vec![set("sg-a", "app", vec![entry(false, "tcp", Some((80, 80)), "sg-zzz")])];
        let relation = Relation::build(&sets, &attach_all(&sets));

        assert_eq!(texts(&relation), vec!["Inbound references sg-zzz but no matching outbound"]);
    }

    #[test]
    fn test_flags_accumulate_in_order() {
        let sets = vec![
            set("sg-a", "app", vec![entry(true, "-1", None, "sg-b")]),
            set("sg-b", "db", vec![entry(false, "-1", None, "0.0.0.0/0")]),
        ];
        let relation = Relation::build(&sets, &[]);

        assert_eq!(
            texts(&relation),
            vec![
                "Unused SG, Outbound references db but no matching inbound (note: db open to 0.0.0.0/0)",
                "Inbound 0.0.0.0/0 open (22/ALL), Unused SG",
            ]
        );
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let sets = vec![
            set("sg-a", "app", vec![entry(true, "-1", None, "sg-b")]),
            set("sg-b", "db", vec![entry(false, "tcp", Some((22, 22)), "0.0.0.0/0")]),
        ];
        let relation = Relation::build(&sets, &[]);

        assert_eq!(texts(&relation), texts(&relation));
    }
}
