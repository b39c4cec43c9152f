//! Reference data endpoint.

use axum::extract::State;

use super::{current_revision, success, ApiResult};
use crate::models::ReferenceData;
use crate::AppState;

/// GET /api/reference - Districts, categories and status names.
pub async fn get_reference(State(state): State<AppState>) -> ApiResult<ReferenceData> {
    success(ReferenceData::current(), current_revision(&state).await)
}
