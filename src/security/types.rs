use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::security::templates;

/// A firewall rule set (security group) as handed over by the collectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallSet {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vpc_id: String,
    pub region: String,
    pub tags: HashMap<String, String>,
    pub permissions: Vec<PermissionEntry>,
}

impl FirewallSet {
    /// Name used wherever another rule points at this set
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            return &self.name;
        }
        match self.tags.get("Name") {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// One raw permission entry. A single entry may list several partners.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionEntry {
    pub egress: bool,
    pub protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub partners: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceType {
    Ec2Instance,
    NetworkInterface,
    LoadBalancer,
    DatabaseCluster,
    CacheCluster,
    KafkaCluster,
    SearchDomain,
    ContainerCluster,
    AutoScalingGroup,
    Function,
    #[default]
    #[serde(other)]
    Other,
}

impl ResourceType {
    /// Map a snapshot file stem (the collector key) to a resource type
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind.to_lowercase().as_str() {
            "ec2" | "instances" => Some(ResourceType::Ec2Instance),
            "eni" | "network-interfaces" => Some(ResourceType::NetworkInterface),
            "elbs" | "elb" | "load-balancers" => Some(ResourceType::LoadBalancer),
            "database" | "db" | "rds" => Some(ResourceType::DatabaseCluster),
            "elasticache" | "cache" => Some(ResourceType::CacheCluster),
            "msk" | "kafka" => Some(ResourceType::KafkaCluster),
            "opensearch" | "search" => Some(ResourceType::SearchDomain),
            "eks" | "containers" => Some(ResourceType::ContainerCluster),
            "asg" | "auto-scaling-groups" => Some(ResourceType::AutoScalingGroup),
            "lambda" | "functions" => Some(ResourceType::Function),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceType::Ec2Instance => "EC2 Instance",
            ResourceType::NetworkInterface => "ENI",
            ResourceType::LoadBalancer => "Load Balancer",
            ResourceType::DatabaseCluster => "DB Cluster",
            ResourceType::CacheCluster => "ElastiCache Cluster",
            ResourceType::KafkaCluster => "MSK Cluster",
            ResourceType::SearchDomain => "OpenSearch Domain",
            ResourceType::ContainerCluster => "EKS Cluster",
            ResourceType::AutoScalingGroup => "Auto Scaling Group",
            ResourceType::Function => "Lambda Function",
            ResourceType::Other => "Other",
        }
    }
}

/// A resource that attaches one or more firewall sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Resource {
    pub id: String,
    pub resource_type: ResourceType,
    pub name: String,
    pub interface_id: String,
    pub private_address: String,
    pub security_group_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn from_egress(egress: bool) -> Self {
        if egress {
            Direction::Outbound
        } else {
            Direction::Inbound
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Direction::Inbound => Direction::Outbound,
            Direction::Outbound => Direction::Inbound,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inbound => "Inbound",
            Direction::Outbound => "Outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
    Other(String),
}

impl Protocol {
    /// Accepts both protocol names and IANA numbers, as the providers report either
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim().to_lowercase();
        match token.as_str() {
            "-1" | "all" => Protocol::All,
            "6" | "tcp" => Protocol::Tcp,
            "17" | "udp" => Protocol::Udp,
            "1" | "icmp" => Protocol::Icmp,
            "" => Protocol::Other(templates::PLACEHOLDER.to_string()),
            _ => Protocol::Other(token),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
            Protocol::All => "all",
            Protocol::Other(token) => token,
        }
    }
}

impl From<String> for Protocol {
    fn from(raw: String) -> Self {
        Protocol::parse(&raw)
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.as_str().to_string()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PartnerKind {
    NetworkRange,
    SetReference,
}

/// The other endpoint of a rule, resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub raw: String,
    pub kind: PartnerKind,
    pub display_name: String,
}

impl Partner {
    pub fn is_set_reference(&self) -> bool {
        self.kind == PartnerKind::SetReference
    }
}

/// One (entry, partner) pair of a firewall set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub set_id: String,
    pub direction: Direction,
    pub protocol: Protocol,
    pub ports: String,
    pub partner: Partner,
}
