//! Condition bundles
//!
//! A bundle groups one active condition with the encounters and medications
//! judged relevant to it by the extraction service.

use super::patient::{Condition, Encounter, Medication};
use serde::{Deserialize, Serialize};

/// One condition plus its clinically relevant encounters and medications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionBundle {
    pub condition: Condition,

    #[serde(default)]
    pub encounters: Vec<Encounter>,

    #[serde(default)]
    pub medications: Vec<Medication>,
}

impl ConditionBundle {
    /// Create a bundle with no associated encounters or medications
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            encounters: Vec::new(),
            medications: Vec::new(),
        }
    }

    /// Compact JSON used as prompt context
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Ordered set of bundles, one per active condition
///
/// Created once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionBundleSet {
    pub bundles: Vec<ConditionBundle>,
}

impl ConditionBundleSet {
    pub fn new(bundles: Vec<ConditionBundle>) -> Self {
        Self { bundles }
    }

    /// Fan-out width of the guideline-matching stage
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}
