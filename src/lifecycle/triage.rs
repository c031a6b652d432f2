// Triage checklist evaluation - pure, no side effects

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Triage;

/// One line of the consultant's checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageItem {
    InventorIdentified,
    DesignViewsComplete,
    DescriptionClear,
}

impl fmt::Display for TriageItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TriageItem::InventorIdentified => "inventor identified",
            TriageItem::DesignViewsComplete => "design views complete",
            TriageItem::DescriptionClear => "description clear",
        };
        f.write_str(label)
    }
}

/// True iff every checklist item has been ticked.
pub fn is_triage_complete(triage: &Triage) -> bool {
    triage.inventor_identified && triage.design_views_complete && triage.description_clear
}

/// Unticked items, in checklist order.
pub fn unchecked_items(triage: &Triage) -> Vec<TriageItem> {
    [
        (triage.inventor_identified, TriageItem::InventorIdentified),
        (triage.design_views_complete, TriageItem::DesignViewsComplete),
        (triage.description_clear, TriageItem::DescriptionClear),
    ]
    .into_iter()
    .filter(|(checked, _)| !checked)
    .map(|(_, item)| item)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_checklist_is_incomplete() {
        let triage = Triage::default();
        assert!(!is_triage_complete(&triage));
        assert_eq!(unchecked_items(&triage).len(), 3);
    }

    #[test]
    fn any_single_gap_blocks_completion() {
        for gap in 0..3 {
            let triage = Triage {
                inventor_identified: gap != 0,
                design_views_complete: gap != 1,
                description_clear: gap != 2,
            };
            assert!(!is_triage_complete(&triage));
            assert_eq!(unchecked_items(&triage).len(), 1);
        }
    }

    #[test]
    fn all_checked_is_complete() {
        let triage = Triage::all_checked();
        assert!(is_triage_complete(&triage));
        assert!(unchecked_items(&triage).is_empty());
    }
}
