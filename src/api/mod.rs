//! REST API module.
//!
//! Every handler answers with the `{success, data, revisionId}` envelope;
//! `revisionId` is the key-value store's write counter.

mod assistant;
mod grievances;
mod navigation;
mod reference;
mod session;

pub use assistant::*;
pub use grievances::*;
pub use navigation::*;
pub use reference::*;
pub use session::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::{AppError, AppErrorWithRevision};
use crate::models::Identity;
use crate::{AppState, Host};

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(err.at_revision(revision_id))
}

/// Store revision for the envelope. A failing store reports 0 here and the
/// real error from the operation itself.
async fn current_revision(state: &AppState) -> i64 {
    state.records.revision().await.unwrap_or(0)
}

/// The signed-in identity, or `Unauthorized`.
fn require_identity(host: &Host) -> Result<Identity, AppError> {
    host.identity
        .clone()
        .ok_or_else(|| AppError::Unauthorized("Sign in required".to_string()))
}
