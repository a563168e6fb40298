// Shared literals for rule rendering and finding messages

pub const PLACEHOLDER: &str = "-";
pub const OPEN_WORLD_CIDR: &str = "0.0.0.0/0";
pub const ALL_PORTS: &str = "ALL";
pub const SSH_PORT: &str = "22";
pub const SSH_RANGE_PREFIX: &str = "22-";
pub const FINDING_SEPARATOR: &str = ", ";

// Finding flags
pub const FINDING_OPEN_INGRESS: &str = "Inbound 0.0.0.0/0 open (22/ALL)";
pub const FINDING_OPEN_EGRESS: &str = "Outbound 0.0.0.0/0 open (ALL)";
pub const FINDING_UNUSED_SET: &str = "Unused SG";

pub fn outbound_without_inbound(destination: &str) -> String {
    format!("Outbound references {} but no matching inbound", destination)
}

pub fn inbound_without_outbound(source: &str) -> String {
    format!("Inbound references {} but no matching outbound", source)
}

pub fn with_open_world_note(finding: String, peer: &str) -> String {
    format!("{} (note: {} open to {})", finding, peer, OPEN_WORLD_CIDR)
}

// Report column headers
pub const COL_FINDINGS: &str = "Findings";
pub const COL_SET_ID: &str = "Security Group ID";
pub const COL_SET_NAME: &str = "Security Group Name";
pub const COL_SET_DESCRIPTION: &str = "SG Description";
pub const COL_VPC_ID: &str = "VPC ID";
pub const COL_REGION: &str = "Region";
pub const COL_DIRECTION: &str = "Direction";
pub const COL_PROTOCOL: &str = "Protocol";
pub const COL_PORT_RANGE: &str = "Port Range";
pub const COL_SRC_ORIGIN: &str = "Src Origin";
pub const COL_SRC_PARSED: &str = "Src Parsed";
pub const COL_DES_ORIGIN: &str = "Des Origin";
pub const COL_DES_PARSED: &str = "Des Parsed";
pub const COL_RESOURCE_NAME: &str = "Resource Name";
pub const COL_RESOURCE_ID: &str = "Resource ID";
pub const COL_RESOURCE_TYPE: &str = "Resource Type";
pub const COL_ENI_ID: &str = "ENI ID";
pub const COL_PRIVATE_IP: &str = "Private IP";
pub const COL_USAGE: &str = "Usage";
pub const COL_SECURITY_GROUPS: &str = "Security Group IDs";

/// Columns removed from the findings report projection
pub const FINDINGS_DROPPED_COLUMNS: &[&str] = &[
    COL_USAGE,
    COL_REGION,
    COL_SRC_ORIGIN,
    COL_DES_ORIGIN,
    COL_RESOURCE_NAME,
    COL_RESOURCE_ID,
    COL_RESOURCE_TYPE,
    COL_ENI_ID,
    COL_PRIVATE_IP,
    COL_SET_ID,
    COL_SET_DESCRIPTION,
];

// Sheet names of the detail workbook
/// Snapshot stem, resource route kind and overall sheet name of the security groups
pub const SECURITY_GROUPS_KIND: &str = "security-groups";

pub const SHEET_FINDINGS: &str = "SG Findings";
pub const SHEET_SET_SUMMARY: &str = "SG-Resource No Rules";
pub const SHEET_SET_RULES: &str = "SG-Resource Rules";
pub const SHEET_RESOURCE_RULES: &str = "Resource-SG-Rules";
