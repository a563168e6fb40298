use serde::{Deserialize, Serialize};

/// Result of one collection (one resource kind of one profile)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CollectionOutcome {
    Loaded { kind: String, count: usize },
    Failed { kind: String, reason: String },
}

impl CollectionOutcome {
    pub fn kind(&self) -> &str {
        match self {
            CollectionOutcome::Loaded { kind, .. } => kind,
            CollectionOutcome::Failed { kind, .. } => kind,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CollectionOutcome::Failed { .. })
    }
}

/// Every collection outcome of a scan. Failed kinds contributed nothing, the
/// rest of the scan went on with what was loaded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionReport {
    pub outcomes: Vec<CollectionOutcome>,
}

impl CollectionReport {
    pub fn record(&mut self, outcome: CollectionOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn failures(&self) -> Vec<&CollectionOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure()).collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                CollectionOutcome::Loaded { count, .. } => *count,
                CollectionOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures().is_empty()
    }
}
