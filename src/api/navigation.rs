//! Navigation endpoint.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use super::grievances::{partition_for, OwnerQuery};
use super::{current_revision, error, success, ApiResult};
use crate::navigation::{NavigationGuard, NavigationIntent, NavigationOutcome};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    #[serde(flatten)]
    pub outcome: NavigationOutcome,
    pub navigation: NavigationGuard,
}

/// POST /api/navigation - Ask the guard to show a view.
///
/// A `grievanceId` selects that grievance for the detail view. When signed
/// in it must exist in the addressed partition.
pub async fn navigate(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
    Json(intent): Json<NavigationIntent>,
) -> ApiResult<NavigationResponse> {
    let revision_id = current_revision(&state).await;
    let mut host = state.host.lock().await;
    let identity = host.identity.clone();

    if let (Some(me), Some(id)) = (&identity, &intent.grievance_id) {
        let found = match partition_for(me, &query) {
            Ok(partition) => state.records.find(&partition, id).await,
            Err(e) => Err(e),
        };
        if let Err(e) = found {
            return error(e, revision_id);
        }
    }

    let outcome = host.navigation.follow(intent, identity.as_ref());

    success(
        NavigationResponse {
            outcome,
            navigation: host.navigation.clone(),
        },
        revision_id,
    )
}
