//! Grievance lifecycle engine.
//!
//! Pure functions over `Grievance` snapshots: every operation takes the
//! current instant explicitly and returns a new snapshot. Persisting the
//! result is the caller's job (see `db::RecordStore`).
//!
//! Status machine:
//!
//! ```text
//! Submitted -> Under Review -> In Progress <-> Pending -> Resolved -> Closed
//!                  ^                                                   |
//!                  +------------------- Reopened <--------------------+
//! ```

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::errors::AppError;
use crate::models::{
    CreateGrievanceRequest, Grievance, GrievanceReply, GrievanceStats, GrievanceStatus,
    TimelineEvent, TimelineStatus, TransitionRequest, CATEGORIES, DISTRICTS,
};

/// Label of the first timeline entry of every grievance.
pub const FILING_EVENT_LABEL: &str = "Grievance Filed";

/// Author label used for remarks written by the grievance owner.
pub const OWNER_AUTHOR: &str = "You";

static LAST_ISSUED_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Issue a grievance id of the form `HPG-<millis>`.
///
/// Ids are strictly increasing within the process even when several are
/// issued in the same millisecond or the wall clock steps backwards.
pub fn next_grievance_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis();
    let previous = match LAST_ISSUED_MILLIS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        Some(millis.max(last + 1))
    }) {
        Ok(prev) | Err(prev) => prev,
    };
    format!("HPG-{}", millis.max(previous + 1))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_member(set: &[&str], value: &str) -> bool {
    let value = value.trim();
    set.iter().any(|member| *member == value)
}

/// Check the filing form, collecting every failing field.
pub fn validate(request: &CreateGrievanceRequest) -> Result<(), AppError> {
    let mut fields = Vec::new();

    if is_blank(&request.subject) {
        fields.push("subject");
    }
    if !is_member(&CATEGORIES, &request.category) {
        fields.push("category");
    }
    if !is_member(&DISTRICTS, &request.district) {
        fields.push("district");
    }
    if is_blank(&request.location) {
        fields.push("location");
    }
    if is_blank(&request.description) {
        fields.push("description");
    }

    if fields.is_empty() {
        Ok(())
    } else {
        Err(AppError::validation(
            fields.into_iter().map(String::from).collect(),
        ))
    }
}

/// File a new grievance.
pub fn create(request: &CreateGrievanceRequest, now: DateTime<Utc>) -> Result<Grievance, AppError> {
    validate(request)?;

    Ok(Grievance {
        id: next_grievance_id(now),
        subject: request.subject.trim().to_string(),
        description: request.description.trim().to_string(),
        location: request.location.trim().to_string(),
        district: request.district.trim().to_string(),
        category: request.category.trim().to_string(),
        date_filed: now,
        last_updated: now,
        status: GrievanceStatus::Submitted,
        files: request.files.clone(),
        is_anonymized: request.is_anonymized,
        timeline: vec![TimelineEvent {
            label: FILING_EVENT_LABEL.to_string(),
            date: now,
            status: TimelineStatus::Current,
        }],
        replies: Vec::new(),
        atr: None,
        assigned_officer: None,
        resolution: None,
        closing_officer: None,
    })
}

/// Append a remark. Closed grievances accept no further remarks.
pub fn append_reply(
    grievance: &Grievance,
    author: &str,
    message: &str,
    now: DateTime<Utc>,
) -> Result<Grievance, AppError> {
    if grievance.status == GrievanceStatus::Closed {
        return Err(AppError::InvalidState(format!(
            "Grievance {} is closed and accepts no further remarks",
            grievance.id
        )));
    }
    if is_blank(message) {
        return Err(AppError::validation(vec!["message".to_string()]));
    }

    let mut updated = grievance.clone();
    updated.replies.push(GrievanceReply {
        author: author.to_string(),
        message: message.trim().to_string(),
        date: now,
    });
    updated.last_updated = now.max(grievance.last_updated);
    Ok(updated)
}

/// Whether the machine has an edge `from -> to`.
pub fn can_transition(from: GrievanceStatus, to: GrievanceStatus) -> bool {
    use GrievanceStatus::*;

    matches!(
        (from, to),
        (Submitted, UnderReview)
            | (UnderReview, InProgress)
            | (UnderReview, Pending)
            | (InProgress, Pending)
            | (Pending, InProgress)
            | (InProgress, Resolved)
            | (Pending, Resolved)
            | (Resolved, Closed)
            | (Closed, Reopened)
            | (Reopened, UnderReview)
    )
}

/// Move a grievance to a new status on behalf of an officer.
///
/// The previous "current" timeline entry is completed and a new entry for
/// the target status is appended. Closing completes every entry.
pub fn transition(
    grievance: &Grievance,
    request: &TransitionRequest,
    officer: &str,
    now: DateTime<Utc>,
) -> Result<Grievance, AppError> {
    let from = grievance.status;
    let to = request.status;

    if !can_transition(from, to) {
        return Err(AppError::InvalidState(format!(
            "Cannot move grievance {} from {} to {}",
            grievance.id, from, to
        )));
    }

    let resolution = request
        .resolution
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if to == GrievanceStatus::Closed && resolution.is_none() && grievance.resolution.is_none() {
        return Err(AppError::validation(vec!["resolution".to_string()]));
    }

    let mut updated = grievance.clone();
    for event in updated.timeline.iter_mut() {
        if event.status == TimelineStatus::Current {
            event.status = TimelineStatus::Completed;
        }
    }
    updated.timeline.push(TimelineEvent {
        label: to.as_str().to_string(),
        date: now,
        status: if to == GrievanceStatus::Closed {
            TimelineStatus::Completed
        } else {
            TimelineStatus::Current
        },
    });

    match to {
        GrievanceStatus::UnderReview => {
            let assignee = request
                .assigned_officer
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(officer);
            updated.assigned_officer = Some(assignee.to_string());
        }
        GrievanceStatus::Closed => {
            updated.closing_officer = Some(officer.to_string());
        }
        _ => {}
    }
    if let Some(resolution) = resolution {
        if matches!(to, GrievanceStatus::Resolved | GrievanceStatus::Closed) {
            updated.resolution = Some(resolution.to_string());
        }
    }
    if let Some(atr) = request.atr.as_deref().filter(|a| !is_blank(a)) {
        updated.atr = Some(atr.trim().to_string());
    }

    updated.status = to;
    updated.last_updated = now.max(grievance.last_updated);

    tracing::info!("Grievance {} moved from {} to {} by {}", updated.id, from, to, officer);
    Ok(updated)
}

/// Count grievances per status bucket. The buckets partition `total`.
pub fn compute_stats(grievances: &[Grievance]) -> GrievanceStats {
    grievances
        .iter()
        .fold(GrievanceStats::default(), |mut stats, g| {
            stats.total += 1;
            match g.status {
                GrievanceStatus::Resolved | GrievanceStatus::Closed => stats.resolved += 1,
                GrievanceStatus::Reopened => stats.reopened += 1,
                _ => stats.open += 1,
            }
            stats
        })
}

/// Newest filing first. Stable, so equal timestamps keep their input order.
pub fn sort_by_recency(mut grievances: Vec<Grievance>) -> Vec<Grievance> {
    grievances.sort_by(|a, b| b.date_filed.cmp(&a.date_filed));
    grievances
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, NaiveDate, Utc};

    use crate::models::{Grievance, GrievanceStatus, TimelineEvent, TimelineStatus};

    /// Midnight UTC of a `YYYY-MM-DD` date.
    pub fn day(date: &str) -> DateTime<Utc> {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    }

    /// A stored grievance with the given status and a consistent timeline.
    pub fn grievance(id: &str, status: GrievanceStatus, filed: &str) -> Grievance {
        let filed_at = day(filed);
        let mut timeline = vec![TimelineEvent {
            label: super::FILING_EVENT_LABEL.to_string(),
            date: filed_at,
            status: TimelineStatus::Current,
        }];
        if status != GrievanceStatus::Submitted {
            timeline[0].status = TimelineStatus::Completed;
            timeline.push(TimelineEvent {
                label: status.as_str().to_string(),
                date: filed_at,
                status: if status == GrievanceStatus::Closed {
                    TimelineStatus::Completed
                } else {
                    TimelineStatus::Current
                },
            });
        }

        Grievance {
            id: id.to_string(),
            subject: format!("Subject of {}", id),
            description: "Details".to_string(),
            location: "Ward 1".to_string(),
            district: "Kangra".to_string(),
            category: "Others".to_string(),
            date_filed: filed_at,
            last_updated: filed_at,
            status,
            files: Vec::new(),
            is_anonymized: false,
            timeline,
            replies: Vec::new(),
            atr: None,
            assigned_officer: None,
            resolution: None,
            closing_officer: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{day, grievance};
    use super::*;
    use chrono::Duration;

    fn pothole() -> CreateGrievanceRequest {
        CreateGrievanceRequest {
            subject: "Pothole on Mall Road".to_string(),
            category: "Roads & Transport".to_string(),
            district: "Shimla".to_string(),
            location: "Mall Road".to_string(),
            description: "Large pothole causing traffic".to_string(),
            files: vec!["pothole.jpg".to_string()],
            is_anonymized: false,
        }
    }

    fn current_events(g: &Grievance) -> usize {
        g.timeline
            .iter()
            .filter(|e| e.status == TimelineStatus::Current)
            .count()
    }

    fn move_to(g: &Grievance, status: GrievanceStatus, resolution: Option<&str>) -> Grievance {
        let request = TransitionRequest {
            status,
            resolution: resolution.map(String::from),
            atr: None,
            assigned_officer: None,
        };
        transition(g, &request, "Rajesh Kumar", g.last_updated + Duration::hours(1)).unwrap()
    }

    #[test]
    fn test_create_pothole_grievance() {
        let now = day("2024-07-01");
        let g = create(&pothole(), now).unwrap();

        assert!(g.id.starts_with("HPG-"));
        assert_eq!(g.status, GrievanceStatus::Submitted);
        assert_eq!(g.timeline.len(), 1);
        assert_eq!(g.timeline[0].label, FILING_EVENT_LABEL);
        assert_eq!(g.timeline[0].status, TimelineStatus::Current);
        assert!(g.replies.is_empty());
        assert_eq!(g.date_filed, now);
        assert_eq!(g.last_updated, now);
        assert_eq!(g.files, vec!["pothole.jpg"]);
    }

    #[test]
    fn test_create_reports_every_invalid_field() {
        let request = CreateGrievanceRequest {
            subject: "  ".to_string(),
            category: "Roads".to_string(),
            district: "".to_string(),
            location: "Mall Road".to_string(),
            description: "".to_string(),
            ..Default::default()
        };

        match create(&request, Utc::now()) {
            Err(AppError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["subject", "category", "district", "description"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_ids_are_unique_within_same_instant() {
        let now = Utc::now();
        let a = next_grievance_id(now);
        let b = next_grievance_id(now);
        assert_ne!(a, b);

        let millis = |id: &str| id.trim_start_matches("HPG-").parse::<i64>().unwrap();
        assert!(millis(&b) > millis(&a));
    }

    #[test]
    fn test_append_reply_on_open_statuses() {
        for status in GrievanceStatus::ALL {
            if status == GrievanceStatus::Closed {
                continue;
            }
            let g = grievance("HPG-1", status, "2024-06-01");
            let later = g.last_updated + Duration::minutes(5);

            let updated = append_reply(&g, OWNER_AUTHOR, "Any update?", later).unwrap();
            assert_eq!(updated.replies.len(), g.replies.len() + 1);
            assert!(updated.last_updated >= g.last_updated);
            assert_eq!(updated.status, g.status);
            assert_eq!(updated.replies.last().unwrap().author, OWNER_AUTHOR);
        }
    }

    #[test]
    fn test_append_reply_never_moves_last_updated_backwards() {
        let g = grievance("HPG-1", GrievanceStatus::Submitted, "2024-06-10");
        let earlier = day("2024-06-01");
        let updated = append_reply(&g, OWNER_AUTHOR, "Hello", earlier).unwrap();
        assert_eq!(updated.last_updated, g.last_updated);
    }

    #[test]
    fn test_append_reply_rejected_when_closed() {
        let g = grievance("HPG-1", GrievanceStatus::Closed, "2024-06-01");
        let err = append_reply(&g, OWNER_AUTHOR, "Please reopen", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
        assert!(g.replies.is_empty());
    }

    #[test]
    fn test_blank_reply_is_invalid() {
        let g = grievance("HPG-1", GrievanceStatus::Submitted, "2024-06-01");
        let err = append_reply(&g, OWNER_AUTHOR, "   ", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_full_lifecycle_keeps_timeline_invariants() {
        let mut g = create(&pothole(), day("2024-07-01")).unwrap();

        let path = [
            (GrievanceStatus::UnderReview, None),
            (GrievanceStatus::InProgress, None),
            (GrievanceStatus::Pending, None),
            (GrievanceStatus::InProgress, None),
            (GrievanceStatus::Resolved, Some("Pothole filled")),
        ];
        for (status, resolution) in path {
            let before = g.clone();
            g = move_to(&g, status, resolution);
            assert_eq!(g.status, status);
            assert_eq!(current_events(&g), 1);
            assert_eq!(g.timeline.len(), before.timeline.len() + 1);
            for (old, new) in before.timeline.iter().zip(&g.timeline) {
                assert_eq!(old.label, new.label);
                assert_eq!(old.date, new.date);
            }
            assert!(g.last_updated > before.last_updated);
        }
        assert_eq!(g.assigned_officer.as_deref(), Some("Rajesh Kumar"));
        assert_eq!(g.resolution.as_deref(), Some("Pothole filled"));

        g = move_to(&g, GrievanceStatus::Closed, None);
        assert_eq!(current_events(&g), 0);
        assert!(g
            .timeline
            .iter()
            .all(|e| e.status == TimelineStatus::Completed));
        assert_eq!(g.closing_officer.as_deref(), Some("Rajesh Kumar"));

        g = move_to(&g, GrievanceStatus::Reopened, None);
        assert_eq!(current_events(&g), 1);
        assert_eq!(g.timeline.last().unwrap().label, "Reopened");

        g = move_to(&g, GrievanceStatus::UnderReview, None);
        assert_eq!(g.status, GrievanceStatus::UnderReview);
    }

    #[test]
    fn test_backward_and_skipping_transitions_are_rejected() {
        use GrievanceStatus::*;

        for (from, to) in [
            (Submitted, Resolved),
            (Submitted, Closed),
            (UnderReview, Submitted),
            (Resolved, InProgress),
            (Resolved, Reopened),
            (Closed, Submitted),
            (Reopened, Closed),
        ] {
            assert!(!can_transition(from, to), "{} -> {}", from, to);
            let g = grievance("HPG-1", from, "2024-06-01");
            let request = TransitionRequest {
                status: to,
                resolution: Some("done".to_string()),
                atr: None,
                assigned_officer: None,
            };
            let err = transition(&g, &request, "Officer", Utc::now()).unwrap_err();
            assert!(matches!(err, AppError::InvalidState(_)));
        }
    }

    #[test]
    fn test_closing_requires_a_resolution() {
        let g = grievance("HPG-1", GrievanceStatus::Resolved, "2024-06-01");
        let request = TransitionRequest {
            status: GrievanceStatus::Closed,
            resolution: None,
            atr: None,
            assigned_officer: None,
        };
        let err = transition(&g, &request, "Officer", Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_stats_partition_total() {
        let all: Vec<Grievance> = GrievanceStatus::ALL
            .iter()
            .enumerate()
            .map(|(i, status)| grievance(&format!("HPG-{}", i), *status, "2024-06-01"))
            .collect();

        let stats = compute_stats(&all);
        assert_eq!(stats.total, 7);
        assert_eq!(stats.resolved, 2);
        assert_eq!(stats.reopened, 1);
        assert_eq!(stats.open, 4);
        assert_eq!(stats.open + stats.resolved + stats.reopened, stats.total);

        assert_eq!(compute_stats(&[]), GrievanceStats::default());
    }

    #[test]
    fn test_sort_by_recency_is_stable_and_idempotent() {
        let input = vec![
            grievance("A", GrievanceStatus::Submitted, "2024-06-01"),
            grievance("B", GrievanceStatus::Submitted, "2024-06-03"),
            grievance("C", GrievanceStatus::Submitted, "2024-06-01"),
            grievance("D", GrievanceStatus::Submitted, "2024-06-02"),
        ];

        let sorted = sort_by_recency(input);
        let ids: Vec<&str> = sorted.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "D", "A", "C"]);

        let again = sort_by_recency(sorted.clone());
        assert_eq!(again, sorted);
    }
}
