pub mod analyzer;
pub mod helpers;
pub mod join;
pub mod peer;
pub mod rules;
pub mod templates;
pub mod types;
pub mod usage;

pub use analyzer::{ComplianceAnalyzer, Finding};
pub use join::{JoinedRow, Relation, RuleResourceJoiner, SetMetadata};
pub use peer::PeerResolver;
pub use rules::RuleExpander;
pub use types::{Direction, FirewallSet, Partner, PartnerKind, PermissionEntry, Protocol, Resource, ResourceType, Rule};
pub use usage::{ResourceDescriptor, UsageIndex};
