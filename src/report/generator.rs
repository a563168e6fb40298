use log::info;
use serde_json::Value;
use std::collections::HashMap;

use crate::ingestion::{CollectionOutcome, InventorySnapshot};
use crate::security::templates::*;
use crate::security::{
    ComplianceAnalyzer, Direction, JoinedRow, Partner, PeerResolver, Relation, Resource, ResourceType,
    Rule, RuleExpander, UsageIndex,
};
use crate::security::helpers::or_placeholder;
use crate::report::dataset::{Dataset, Workbook};

const RELATION_COLUMNS: &[&str] = &[
    COL_SET_ID,
    COL_SET_NAME,
    COL_SET_DESCRIPTION,
    COL_VPC_ID,
    COL_REGION,
    COL_DIRECTION,
    COL_PROTOCOL,
    COL_PORT_RANGE,
    COL_SRC_ORIGIN,
    COL_SRC_PARSED,
    COL_DES_ORIGIN,
    COL_DES_PARSED,
    COL_RESOURCE_NAME,
    COL_RESOURCE_ID,
    COL_RESOURCE_TYPE,
    COL_ENI_ID,
    COL_PRIVATE_IP,
    COL_USAGE,
];

const SUMMARY_COLUMNS: &[&str] = &[
    COL_SET_ID,
    COL_SET_NAME,
    COL_SET_DESCRIPTION,
    COL_VPC_ID,
    COL_REGION,
    COL_RESOURCE_NAME,
    COL_RESOURCE_ID,
    COL_RESOURCE_TYPE,
    COL_ENI_ID,
    COL_PRIVATE_IP,
    COL_USAGE,
];

const RESOURCE_RULE_COLUMNS: &[&str] = &[
    COL_RESOURCE_NAME,
    COL_RESOURCE_ID,
    COL_RESOURCE_TYPE,
    COL_ENI_ID,
    COL_PRIVATE_IP,
    COL_SET_ID,
    COL_SET_NAME,
    COL_DIRECTION,
    COL_PROTOCOL,
    COL_PORT_RANGE,
    COL_SRC_PARSED,
    COL_DES_PARSED,
];

const RULE_COLUMNS: &[&str] = &[
    COL_SET_ID,
    COL_SET_NAME,
    COL_SET_DESCRIPTION,
    COL_VPC_ID,
    COL_REGION,
    COL_DIRECTION,
    COL_PROTOCOL,
    COL_PORT_RANGE,
    COL_SRC_ORIGIN,
    COL_SRC_PARSED,
    COL_DES_ORIGIN,
    COL_DES_PARSED,
];

const RESOURCE_COLUMNS: &[&str] = &[
    COL_RESOURCE_ID,
    COL_RESOURCE_TYPE,
    COL_RESOURCE_NAME,
    COL_ENI_ID,
    COL_PRIVATE_IP,
    COL_SECURITY_GROUPS,
];

fn text(value: &str) -> Value {
    Value::String(value.to_string())
}

// Partner cells for one side: (origin, parsed), empty when the rule points the other way
fn partner_cells(partner: Option<&Partner>) -> (Value, Value) {
    match partner {
        Some(p) => (text(&p.raw), text(&p.display_name)),
        None => (text(""), text("")),
    }
}

fn rule_cells(rule: &Rule) -> Vec<Value> {
    let (src_origin, src_parsed) = if rule.direction == Direction::Inbound {
        partner_cells(Some(&rule.partner))
    } else {
        partner_cells(None)
    };
    let (des_origin, des_parsed) = if rule.direction == Direction::Outbound {
        partner_cells(Some(&rule.partner))
    } else {
        partner_cells(None)
    };

    vec![
        text(rule.direction.as_str()),
        text(rule.protocol.as_str()),
        text(&rule.ports),
        src_origin,
        src_parsed,
        des_origin,
        des_parsed,
    ]
}

fn joined_row_cells(row: &JoinedRow) -> Vec<Value> {
    let mut cells = vec![
        text(&row.set.id),
        text(&row.set.name),
        text(&row.set.description),
        text(or_placeholder(&row.set.vpc_id)),
        text(or_placeholder(&row.set.region)),
    ];
    cells.extend(rule_cells(&row.rule));

    match &row.resource {
        Some(resource) => cells.extend(vec![
            text(&resource.resource_name),
            text(&resource.resource_id),
            text(resource.resource_type.label()),
            text(&resource.interface_id),
            text(&resource.private_address),
        ]),
        None => cells.extend((0..5).map(|_| text(""))),
    }

    cells.push(Value::Bool(row.usage));
    cells
}

/// The joined relation as a flat table, one row per (rule, resource)
pub fn relation_dataset(relation: &Relation) -> Dataset {
    let mut data = Dataset::new(RELATION_COLUMNS);
    for row in relation.rows() {
        data.push_row(joined_row_cells(row));
    }
    data
}

/// Analyze the relation and project the flagged rows into the findings report.
///
/// Clean rows are dropped, identifying columns removed, identical rows
/// collapsed and the Findings column moved first.
pub fn findings_dataset(relation: &Relation) -> Dataset {
    let findings = ComplianceAnalyzer::new().analyze(relation);

    let mut data = relation_dataset(relation);
    data.append_column(
        COL_FINDINGS,
        findings.iter().map(|f| Value::String(f.text())).collect(),
    );

    let findings_index = data.columns.len() - 1;
    data.retain_rows(|row| {
        row.get(findings_index)
            .and_then(|v| v.as_str())
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    });
    data.drop_columns(FINDINGS_DROPPED_COLUMNS);
    data.dedup();
    data.move_column_to_front(COL_FINDINGS);
    data
}

/// Builds every report dataset of one inventory snapshot.
pub struct ReportGenerator<'a> {
    snapshot: &'a InventorySnapshot,
    resolver: PeerResolver,
    usage: UsageIndex,
    relation: Relation,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(snapshot: &'a InventorySnapshot) -> Self {
        let resolver = PeerResolver::new(&snapshot.security_groups);
        let usage = UsageIndex::build(&snapshot.resources);
        let relation = Relation::build_with(&snapshot.security_groups, &resolver, &usage);

        ReportGenerator {
            snapshot,
            resolver,
            usage,
            relation,
        }
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// The compliance findings report
    pub fn findings_report(&self) -> Dataset {
        let data = findings_dataset(&self.relation);
        info!(
            "Profile {}: {} findings from {} joined rows",
            self.snapshot.profile,
            data.len(),
            self.relation.len()
        );
        data
    }

    pub fn findings_workbook(&self) -> Workbook {
        let mut workbook = Workbook::new(&self.snapshot.profile);
        workbook.add_sheet(SHEET_FINDINGS, self.findings_report());
        workbook
    }

    /// The three detail sheets: set/resource summary, rule relation, and the
    /// resource-centric view
    pub fn detail_workbook(&self) -> Workbook {
        let mut workbook = Workbook::new(&self.snapshot.profile);
        workbook.add_sheet(SHEET_SET_SUMMARY, self.set_summary_dataset());
        workbook.add_sheet(SHEET_SET_RULES, relation_dataset(&self.relation));
        workbook.add_sheet(SHEET_RESOURCE_RULES, self.resource_rules_dataset());
        workbook
    }

    /// The whole inventory: expanded security group rules plus one sheet per
    /// collected resource kind. Failed and empty collections get no sheet.
    pub fn overall_workbook(&self) -> Workbook {
        let mut workbook = Workbook::new(&self.snapshot.profile);

        let rules = self.rules_dataset();
        if !rules.is_empty() {
            workbook.add_sheet(SECURITY_GROUPS_KIND, rules);
        }

        let mut seen: Vec<ResourceType> = Vec::new();
        for outcome in &self.snapshot.collection.outcomes {
            let CollectionOutcome::Loaded { kind, count } = outcome else {
                continue;
            };
            if kind == SECURITY_GROUPS_KIND || *count == 0 {
                continue;
            }
            // Unrecognized kinds are not addressable by type
            let Some(resource_type) = ResourceType::from_kind(kind) else {
                continue;
            };
            if seen.contains(&resource_type) {
                continue;
            }
            seen.push(resource_type);

            let data = self.resources_dataset(resource_type);
            if !data.is_empty() {
                workbook.add_sheet(kind, data);
            }
        }

        info!(
            "Profile {}: overall workbook with {} sheets",
            self.snapshot.profile,
            workbook.sheets.len()
        );
        workbook
    }

    /// One row per (set, attached resource), or one unattached row per unused set
    pub fn set_summary_dataset(&self) -> Dataset {
        let mut data = Dataset::new(SUMMARY_COLUMNS);

        for set in &self.snapshot.security_groups {
            let head = vec![
                text(&set.id),
                text(set.display_name()),
                text(&set.description),
                text(or_placeholder(&set.vpc_id)),
                text(or_placeholder(&set.region)),
            ];

            let attached = self.usage.attached(&set.id);
            if attached.is_empty() {
                let mut row = head;
                row.extend((0..5).map(|_| text("")));
                row.push(Value::Bool(false));
                data.push_row(row);
                continue;
            }

            for resource in attached {
                let mut row = head.clone();
                row.extend(vec![
                    text(&resource.resource_name),
                    text(&resource.resource_id),
                    text(resource.resource_type.label()),
                    text(&resource.interface_id),
                    text(&resource.private_address),
                ]);
                row.push(Value::Bool(true));
                data.push_row(row);
            }
        }

        data
    }

    /// For each resource, every rule of every set it attaches
    pub fn resource_rules_dataset(&self) -> Dataset {
        let expander = RuleExpander::new(&self.resolver);
        let rules_by_set: HashMap<&str, Vec<Rule>> = self
            .snapshot
            .security_groups
            .iter()
            .map(|set| (set.id.as_str(), expander.expand(set)))
            .collect();

        let mut data = Dataset::new(RESOURCE_RULE_COLUMNS);
        for resource in &self.snapshot.resources {
            let head = resource_head(resource);
            let mut seen: Vec<&str> = Vec::new();

            for set_id in &resource.security_group_ids {
                let set_id = set_id.trim();
                if set_id.is_empty() || seen.contains(&set_id) {
                    continue;
                }
                seen.push(set_id);

                let set_name = self.resolver.name_of(set_id).unwrap_or(set_id);
                match rules_by_set.get(set_id) {
                    Some(rules) if !rules.is_empty() => {
                        for rule in rules {
                            let cells = rule_cells(rule);
                            let mut row = head.clone();
                            row.extend(vec![text(set_id), text(set_name)]);
                            // direction, protocol, ports, src parsed, des parsed
                            row.extend(vec![
                                cells[0].clone(),
                                cells[1].clone(),
                                cells[2].clone(),
                                cells[4].clone(),
                                cells[6].clone(),
                            ]);
                            data.push_row(row);
                        }
                    }
                    // Attached set without rules, or not present in the snapshot
                    _ => {
                        let mut row = head.clone();
                        row.extend(vec![text(set_id), text(set_name)]);
                        row.extend((0..5).map(|_| text(PLACEHOLDER)));
                        data.push_row(row);
                    }
                }
            }
        }

        data
    }

    /// Inventory view of the security groups: one row per expanded rule
    pub fn rules_dataset(&self) -> Dataset {
        let expander = RuleExpander::new(&self.resolver);
        let mut data = Dataset::new(RULE_COLUMNS);

        for set in &self.snapshot.security_groups {
            for rule in expander.expand(set) {
                let mut row = vec![
                    text(&set.id),
                    text(set.display_name()),
                    text(&set.description),
                    text(or_placeholder(&set.vpc_id)),
                    text(or_placeholder(&set.region)),
                ];
                row.extend(rule_cells(&rule));
                data.push_row(row);
            }
        }

        data
    }

    /// Inventory view of one resource type
    pub fn resources_dataset(&self, resource_type: ResourceType) -> Dataset {
        let mut data = Dataset::new(RESOURCE_COLUMNS);
        for resource in self.snapshot.resources_of(resource_type) {
            data.push_row(vec![
                text(&resource.id),
                text(resource.resource_type.label()),
                text(or_placeholder(&resource.name)),
                text(or_placeholder(&resource.interface_id)),
                text(or_placeholder(&resource.private_address)),
                text(&resource.security_group_ids.join(", ")),
            ]);
        }
        data
    }
}

fn resource_head(resource: &Resource) -> Vec<Value> {
    vec![
        text(or_placeholder(&resource.name)),
        text(&resource.id),
        text(resource.resource_type.label()),
        text(or_placeholder(&resource.interface_id)),
        text(or_placeholder(&resource.private_address)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{FirewallSet, PermissionEntry};
    use serde_json::json;

    fn snapshot() -> InventorySnapshot {
        InventorySnapshot {
            profile: "prod".to_string(),
            security_groups: vec![
                FirewallSet {
                    id: "sg-1".to_string(),
                    name: "web".to_string(),
                    description: "web tier".to_string(),
                    vpc_id: "vpc-1".to_string(),
                    region: "ap-northeast-2".to_string(),
                    permissions: vec![PermissionEntry {
                        egress: false,
                        protocol: "tcp".to_string(),
                        from_port: Some(22),
                        to_port: Some(22),
                        partners: vec!["0.0.0.0/0".to_string()],
                    }],
                    ..Default::default()
                },
                FirewallSet {
                    id: "sg-2".to_string(),
                    name: "idle".to_string(),
                    ..Default::default()
                },
            ],
            resources: vec![
                Resource {
                    id: "i-1".to_string(),
                    resource_type: ResourceType::Ec2Instance,
                    name: "bastion-a".to_string(),
                    security_group_ids: vec!["sg-1".to_string()],
                    ..Default::default()
                },
                Resource {
                    id: "i-2".to_string(),
                    resource_type: ResourceType::Ec2Instance,
                    name: "bastion-b".to_string(),
                    security_group_ids: vec!["sg-1".to_string(), "sg-404".to_string()],
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_findings_report_projection() {
        let snapshot = snapshot();
        let report = ReportGenerator::new(&snapshot).findings_report();

        assert_eq!(
            report.columns,
            vec![
                "Findings",
                "Security Group Name",
                "VPC ID",
                "Direction",
                "Protocol",
                "Port Range",
                "Src Parsed",
                "Des Parsed",
            ]
        );
        // Two bastions share the rule; the rows collapse once resource columns are gone
        assert_eq!(report.len(), 1);
        assert_eq!(report.rows[0][0], json!("Inbound 0.0.0.0/0 open (22/ALL)"));
        assert_eq!(report.rows[0][6], json!("0.0.0.0/0"));
        assert_eq!(report.rows[0][7], json!(""));
    }

    #[test]
    fn test_relation_dataset_usage_column() {
        let snapshot = snapshot();
        let generator = ReportGenerator::new(&snapshot);
        let data = relation_dataset(generator.relation());

        assert_eq!(data.len(), 2);
        assert_eq!(data.value(&data.rows[0], COL_USAGE), Some(&json!(true)));
        assert_eq!(data.value(&data.rows[1], COL_RESOURCE_ID), Some(&json!("i-2")));
    }

    #[test]
    fn test_detail_workbook_sheets() {
        let snapshot = snapshot();
        let workbook = ReportGenerator::new(&snapshot).detail_workbook();

        let summary = workbook.sheet(SHEET_SET_SUMMARY).unwrap();
        assert_eq!(summary.len(), 3);
        assert_eq!(summary.value(&summary.rows[2], COL_SET_ID), Some(&json!("sg-2")));
        assert_eq!(summary.value(&summary.rows[2], COL_USAGE), Some(&json!(false)));

        let by_resource = workbook.sheet(SHEET_RESOURCE_RULES).unwrap();
        assert_eq!(by_resource.len(), 3);
        assert_eq!(by_resource.value(&by_resource.rows[2], COL_SET_NAME), Some(&json!("sg-404")));
        assert_eq!(by_resource.value(&by_resource.rows[2], COL_DIRECTION), Some(&json!("-")));

        assert!(workbook.sheet(SHEET_SET_RULES).is_some());
    }

    #[test]
    fn test_overall_workbook_skips_failed_and_empty_kinds() {
        let mut snapshot = snapshot();
        snapshot.collection.record(CollectionOutcome::Loaded {
            kind: SECURITY_GROUPS_KIND.to_string(),
            count: 2,
        });
        snapshot.collection.record(CollectionOutcome::Loaded { kind: "ec2".to_string(), count: 2 });
        snapshot.collection.record(CollectionOutcome::Loaded { kind: "elbs".to_string(), count: 0 });
        snapshot.collection.record(CollectionOutcome::Failed {
            kind: "msk".to_string(),
            reason: "truncated".to_string(),
        });

        let workbook = ReportGenerator::new(&snapshot).overall_workbook();
        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["security-groups", "ec2"]);
        assert_eq!(workbook.sheet("ec2").unwrap().len(), 2);
        assert_eq!(workbook.sheet("security-groups").unwrap().len(), 1);
    }

    #[test]
    fn test_inventory_views() {
        let snapshot = snapshot();
        let generator = ReportGenerator::new(&snapshot);

        let rules = generator.rules_dataset();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.value(&rules.rows[0], COL_PORT_RANGE), Some(&json!("22")));

        let instances = generator.resources_dataset(ResourceType::Ec2Instance);
        assert_eq!(instances.len(), 2);
        assert_eq!(
            instances.value(&instances.rows[1], COL_SECURITY_GROUPS),
            Some(&json!("sg-1, sg-404"))
        );
        assert!(generator.resources_dataset(ResourceType::LoadBalancer).is_empty());
    }
}
