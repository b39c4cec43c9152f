//! Grievance API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{current_revision, error, require_identity, success, ApiResult};
use crate::errors::AppError;
use crate::lifecycle::{self, OWNER_AUTHOR};
use crate::models::{
    CreateGrievanceRequest, Grievance, GrievanceStats, Identity, ReplyRequest, TransitionRequest,
};
use crate::AppState;

/// Selects whose grievances an officer is working on.
#[derive(Debug, Default, Deserialize)]
pub struct OwnerQuery {
    /// Contact key of the citizen; defaults to the caller's own.
    pub owner: Option<String>,
}

/// A grievance after a mutation, with whether the change reached storage.
///
/// `persisted` is false for reference grievances, which are shared by every
/// identity and never stored per partition.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrievanceUpdate {
    pub grievance: Grievance,
    pub persisted: bool,
}

/// Partition the caller may read or write. Citizens only ever see their own.
pub(super) fn partition_for(identity: &Identity, query: &OwnerQuery) -> Result<String, AppError> {
    match query.owner.as_deref().map(str::trim) {
        None | Some("") => Ok(identity.contact_key.clone()),
        Some(owner) if owner == identity.contact_key => Ok(owner.to_string()),
        Some(owner) if identity.is_officer() => Ok(owner.to_string()),
        Some(_) => Err(AppError::Forbidden(
            "Citizens can only access their own grievances".to_string(),
        )),
    }
}

/// Signed-in identity plus the partition it addresses.
async fn caller(state: &AppState, query: &OwnerQuery) -> Result<(Identity, String), AppError> {
    let identity = require_identity(&*state.host.lock().await)?;
    let partition = partition_for(&identity, query)?;
    Ok((identity, partition))
}

/// GET /api/grievances - Merged list, newest first.
pub async fn list_grievances(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Vec<Grievance>> {
    let revision_id = current_revision(&state).await;

    let (_, partition) = match caller(&state, &query).await {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };

    match state.records.list_for(&partition).await {
        Ok(all) => success(lifecycle::sort_by_recency(all), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/grievances/stats - Counts per status bucket.
pub async fn grievance_stats(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<GrievanceStats> {
    let revision_id = current_revision(&state).await;

    let (_, partition) = match caller(&state, &query).await {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };

    match state.records.list_for(&partition).await {
        Ok(all) => success(lifecycle::compute_stats(&all), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/grievances - File a new grievance.
pub async fn create_grievance(
    State(state): State<AppState>,
    Json(request): Json<CreateGrievanceRequest>,
) -> ApiResult<Grievance> {
    let revision_id = current_revision(&state).await;
    let mut host = state.host.lock().await;

    let identity = match require_identity(&host) {
        Ok(identity) => identity,
        Err(e) => return error(e, revision_id),
    };

    let grievance = match lifecycle::create(&request, Utc::now()) {
        Ok(g) => g,
        Err(e) => return error(e, revision_id),
    };

    if let Err(e) = state
        .records
        .append(&identity.contact_key, grievance.clone())
        .await
    {
        return error(e, revision_id);
    }

    tracing::info!("{} filed grievance {}", identity.id, grievance.id);
    host.navigation.on_grievance_filed();

    success(grievance, current_revision(&state).await)
}

/// GET /api/grievances/{id} - Look a grievance up.
///
/// Selecting it for the detail view goes through `POST /api/navigation`.
pub async fn get_grievance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Grievance> {
    let revision_id = current_revision(&state).await;

    let (_, partition) = match caller(&state, &query).await {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };

    match state.records.find(&partition, &id).await {
        Ok(grievance) => success(grievance, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/grievances/{id}/replies - Add a remark.
pub async fn add_reply(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
    Json(request): Json<ReplyRequest>,
) -> ApiResult<GrievanceUpdate> {
    let revision_id = current_revision(&state).await;

    let (identity, partition) = match caller(&state, &query).await {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };
    let author = if identity.is_officer() {
        identity.display_name.as_str()
    } else {
        OWNER_AUTHOR
    };

    let result = async {
        let current = state.records.find(&partition, &id).await?;
        let updated = lifecycle::append_reply(&current, author, &request.message, Utc::now())?;
        let persisted = state
            .records
            .replace_one(&partition, &id, updated.clone())
            .await?;
        Ok::<_, AppError>(GrievanceUpdate {
            grievance: updated,
            persisted,
        })
    }
    .await;

    match result {
        Ok(update) => success(update, current_revision(&state).await),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/grievances/{id}/transitions - Officer status change.
pub async fn transition_grievance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<GrievanceUpdate> {
    let revision_id = current_revision(&state).await;

    let (officer, partition) = match caller(&state, &query).await {
        Ok(c) => c,
        Err(e) => return error(e, revision_id),
    };
    if !officer.is_officer() {
        return error(
            AppError::Forbidden("Only a Grievance Redressal Officer can change status".to_string()),
            revision_id,
        );
    }

    let result = async {
        let current = state.records.find(&partition, &id).await?;
        let updated = lifecycle::transition(&current, &request, &officer.display_name, Utc::now())?;
        let persisted = state
            .records
            .replace_one(&partition, &id, updated.clone())
            .await?;
        Ok::<_, AppError>(GrievanceUpdate {
            grievance: updated,
            persisted,
        })
    }
    .await;

    match result {
        Ok(update) => success(update, current_revision(&state).await),
        Err(e) => error(e, revision_id),
    }
}
