//! Grievance model matching the portal's Grievance interface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a grievance.
///
/// Serialized with the human-readable names the portal displays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GrievanceStatus {
    #[serde(rename = "Submitted")]
    Submitted,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Pending")]
    Pending,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Closed")]
    Closed,
    #[serde(rename = "Reopened")]
    Reopened,
}

impl GrievanceStatus {
    pub const ALL: [GrievanceStatus; 7] = [
        GrievanceStatus::Submitted,
        GrievanceStatus::UnderReview,
        GrievanceStatus::InProgress,
        GrievanceStatus::Pending,
        GrievanceStatus::Resolved,
        GrievanceStatus::Closed,
        GrievanceStatus::Reopened,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GrievanceStatus::Submitted => "Submitted",
            GrievanceStatus::UnderReview => "Under Review",
            GrievanceStatus::InProgress => "In Progress",
            GrievanceStatus::Pending => "Pending",
            GrievanceStatus::Resolved => "Resolved",
            GrievanceStatus::Closed => "Closed",
            GrievanceStatus::Reopened => "Reopened",
        }
    }
}

impl std::fmt::Display for GrievanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress marker of a single timeline entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimelineStatus {
    Completed,
    Current,
    Pending,
}

/// One milestone in a grievance's processing history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub label: String,
    pub date: DateTime<Utc>,
    pub status: TimelineStatus,
}

/// A remark exchanged between the grievance owner and officials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceReply {
    pub author: String,
    pub message: String,
    pub date: DateTime<Utc>,
}

/// A citizen-filed complaint.
///
/// Required fields carry no serde defaults: a stored record missing any of
/// them fails to deserialize instead of being silently patched up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Grievance {
    pub id: String,
    pub subject: String,
    pub description: String,
    pub location: String,
    pub district: String,
    pub category: String,
    pub date_filed: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub status: GrievanceStatus,
    pub files: Vec<String>,
    pub is_anonymized: bool,
    pub timeline: Vec<TimelineEvent>,
    pub replies: Vec<GrievanceReply>,
    /// Action taken report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_officer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_officer: Option<String>,
}

/// Request body for filing a new grievance.
///
/// Text fields default to empty so that missing fields are reported by
/// validation together with the other problems, not by the JSON extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrievanceRequest {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub is_anonymized: bool,
}

/// Request body for adding a remark to a grievance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[serde(default)]
    pub message: String,
}

/// Request body for an officer-driven status change.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    pub status: GrievanceStatus,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub atr: Option<String>,
    /// Officer to record as assignee; defaults to the acting officer
    #[serde(default)]
    pub assigned_officer: Option<String>,
}

/// Counts of grievances by status bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceStats {
    pub total: usize,
    pub open: usize,
    pub resolved: usize,
    pub reopened: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        let value = serde_json::to_value(GrievanceStatus::UnderReview).unwrap();
        assert_eq!(value, json!("Under Review"));
        for status in GrievanceStatus::ALL {
            let parsed: GrievanceStatus = serde_json::from_value(json!(status.as_str())).unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let record = json!({
            "id": "HPG-1",
            "subject": "Broken hand pump",
            "description": "The hand pump near the school is broken.",
            "location": "Ward 2",
            "district": "Una",
            "category": "Water Supply",
            "dateFiled": "2024-06-01T00:00:00Z",
            "lastUpdated": "2024-06-01T00:00:00Z",
            "status": "Submitted",
            "files": [],
            "isAnonymized": false,
            "replies": []
        });

        let result: Result<Grievance, _> = serde_json::from_value(record);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("timeline"), "unexpected error: {}", err);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<GrievanceStatus, _> = serde_json::from_value(json!("Escalated"));
        assert!(result.is_err());
    }

    #[test]
    fn test_optional_officer_fields_are_omitted() {
        let record = json!({
            "id": "HPG-2",
            "subject": "Street light",
            "description": "Not working",
            "location": "Sector 2",
            "district": "Shimla",
            "category": "Electricity",
            "dateFiled": "2024-06-01T00:00:00Z",
            "lastUpdated": "2024-06-01T00:00:00Z",
            "status": "Submitted",
            "files": ["photo.jpg"],
            "isAnonymized": true,
            "timeline": [
                { "label": "Grievance Filed", "date": "2024-06-01T00:00:00Z", "status": "current" }
            ],
            "replies": []
        });

        let grievance: Grievance = serde_json::from_value(record).unwrap();
        assert!(grievance.assigned_officer.is_none());
        assert_eq!(grievance.timeline[0].status, TimelineStatus::Current);

        let out = serde_json::to_value(&grievance).unwrap();
        assert!(out.get("assignedOfficer").is_none());
        assert!(out.get("closingOfficer").is_none());
        assert_eq!(out["isAnonymized"], true);
    }
}
