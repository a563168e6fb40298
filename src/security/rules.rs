use crate::security::helpers::port_descriptor;
use crate::security::peer::PeerResolver;
use crate::security::types::{Direction, FirewallSet, Protocol, Rule};

/// Flattens raw permission entries into one rule per (entry, partner) pair.
pub struct RuleExpander<'a> {
    resolver: &'a PeerResolver,
}

impl<'a> RuleExpander<'a> {
    pub fn new(resolver: &'a PeerResolver) -> Self {
        RuleExpander { resolver }
    }

    /// Expand every entry of one firewall set, preserving entry order
    pub fn expand(&self, set: &FirewallSet) -> Vec<Rule> {
        let mut rules = Vec::new();

        for entry in &set.permissions {
            let direction = Direction::from_egress(entry.egress);
            let protocol = Protocol::parse(&entry.protocol);
            let ports = port_descriptor(&protocol, entry.from_port, entry.to_port);

            // Every partner is evaluated on its own
            for raw in &entry.partners {
                rules.push(Rule {
                    set_id: set.id.clone(),
                    direction,
                    protocol: protocol.clone(),
                    ports: ports.clone(),
                    partner: self.resolver.resolve(raw),
                });
            }
        }

        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::types::{PartnerKind, PermissionEntry};

    fn entry(egress: bool, protocol: &str, ports: Option<(i32, i32)>, partners: &[&str]) -> PermissionEntry {
        PermissionEntry {
            egress,
            protocol: protocol.to_string(),
            from_port: ports.map(|p| p.0),
            to_port: ports.map(|p| p.1),
            partners: partners.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_one_rule_per_partner() {
        let sets = vec![
            FirewallSet {
                id: "sg-1".to_string(),
                name: "web".to_string(),
                permissions: vec![
                    entry(false, "tcp", Some((443, 443)), &["10.0.0.0/16", "sg-2"]),
                    entry(true, "-1", None, &["0.0.0.0/0"]),
                ],
                ..Default::default()
            },
            FirewallSet {
                id: "sg-2".to_string(),
                name: "lb".to_string(),
                ..Default::default()
            },
        ];
        let resolver = PeerResolver::new(&sets);
        let rules = RuleExpander::new(&resolver).expand(&sets[0]);

        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].direction, Direction::Inbound);
        assert_eq!(rules[0].ports, "443");
        assert_eq!(rules[0].partner.kind, PartnerKind::NetworkRange);
        assert_eq!(rules[1].partner.kind, PartnerKind::SetReference);
        assert_eq!(rules[1].partner.display_name, "lb");
        assert_eq!(rules[2].direction, Direction::Outbound);
        assert_eq!(rules[2].protocol, Protocol::All);
        assert_eq!(rules[2].ports, "ALL");
        assert!(rules.iter().all(|r| r.set_id == "sg-1"));
    }

    #[test]
    fn test_entry_without_partners_yields_nothing() {
        let set = FirewallSet {
            id: "sg-9".to_string(),
            permissions: vec![entry(false, "udp", Some((53, 53)), &[])],
            ..Default::default()
        };
        let resolver = PeerResolver::new(std::slice::from_ref(&set));

        assert!(RuleExpander::new(&resolver).expand(&set).is_empty());
    }

    #[test]
    fn test_ranged_entry_descriptor() {
        let set = FirewallSet {
            id: "sg-5".to_string(),
            permissions: vec![entry(false, "6", Some((22, 25)), &["0.0.0.0/0"])],
            ..Default::default()
        };
        let resolver = PeerResolver::new(std::slice::from_ref(&set));
        let rules = RuleExpander::new(&resolver).expand(&set);

        assert_eq!(rules[0].protocol, Protocol::Tcp);
        assert_eq!(rules[0].ports, "22-25");
    }
}
