//! Fixed reference data shared by every identity.

use std::sync::LazyLock;

use serde::Serialize;

use super::{Grievance, GrievanceStatus};

pub const DISTRICTS: [&str; 12] = [
    "Bilaspur",
    "Chamba",
    "Hamirpur",
    "Kangra",
    "Kinnaur",
    "Kullu",
    "Lahaul and Spiti",
    "Mandi",
    "Shimla",
    "Sirmaur",
    "Solan",
    "Una",
];

pub const CATEGORIES: [&str; 8] = [
    "Roads & Transport",
    "Water Supply",
    "Electricity",
    "Health & Sanitation",
    "Education",
    "Social Welfare",
    "Police & Law",
    "Others",
];

static REFERENCE_GRIEVANCES: LazyLock<Vec<Grievance>> = LazyLock::new(|| {
    serde_json::from_str(include_str!("reference_grievances.json"))
        .expect("embedded reference grievances must deserialize")
});

/// Demo grievances visible to every identity. Never written back.
pub fn reference_grievances() -> &'static [Grievance] {
    &REFERENCE_GRIEVANCES
}

/// Enumerations the filing form offers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    pub districts: Vec<&'static str>,
    pub categories: Vec<&'static str>,
    pub statuses: Vec<GrievanceStatus>,
}

impl ReferenceData {
    pub fn current() -> Self {
        Self {
            districts: DISTRICTS.to_vec(),
            categories: CATEGORIES.to_vec(),
            statuses: GrievanceStatus::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimelineStatus;

    #[test]
    fn test_reference_dataset_loads() {
        let records = reference_grievances();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "HP-2024-089");
        assert_eq!(records[1].status, GrievanceStatus::Closed);
        assert_eq!(records[2].status, GrievanceStatus::Submitted);
    }

    #[test]
    fn test_reference_records_use_known_sets() {
        for g in reference_grievances() {
            assert!(DISTRICTS.iter().any(|d| *d == g.district), "{}", g.district);
            assert!(CATEGORIES.iter().any(|c| *c == g.category), "{}", g.category);
        }
    }

    #[test]
    fn test_closed_reference_record_has_no_current_event() {
        let closed = &reference_grievances()[1];
        assert!(closed
            .timeline
            .iter()
            .all(|e| e.status == TimelineStatus::Completed));
    }
}
