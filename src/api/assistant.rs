//! HP Assist endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{current_revision, error, success, ApiResult};
use crate::assistant::{AssistantContext, AssistantSession, Effect};
use crate::navigation::NavigationOutcome;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    /// Re-open (and reset) this panel instead of creating a new one
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct InputRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub session: AssistantSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<Effect>,
    /// What the host did with a navigation effect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<NavigationOutcome>,
}

/// POST /api/assistant/sessions - Open a panel with a fresh greeting.
pub async fn open_assistant(
    State(state): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> ApiResult<AssistantSession> {
    let revision_id = current_revision(&state).await;
    success(state.assistant.open(request.session_id).await, revision_id)
}

/// GET /api/assistant/sessions/{id} - Current conversation.
pub async fn get_assistant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AssistantSession> {
    let revision_id = current_revision(&state).await;

    match state.assistant.get(id).await {
        Ok(session) => success(session, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/assistant/sessions/{id}/select - Choose an offered option.
///
/// Options that hand control to the host close the panel; its id is no
/// longer valid afterwards.
pub async fn select_option(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectOptionRequest>,
) -> ApiResult<SelectionResponse> {
    let revision_id = current_revision(&state).await;
    let mut host = state.host.lock().await;
    let identity = host.identity.clone();

    let option = match state.assistant.offered(id, &request.key).await {
        Ok(option) => option,
        Err(e) => return error(e, revision_id),
    };

    // Signed out, or on any branch but the updates summary, the store is
    // never consulted
    let records = match &identity {
        Some(me) if option.reads_records() => {
            match state.records.list_for(&me.contact_key).await {
                Ok(records) => records,
                Err(e) => return error(e, revision_id),
            }
        }
        _ => Vec::new(),
    };
    let ctx = AssistantContext {
        identity: identity.as_ref(),
        records: &records,
    };

    let result = match state.assistant.select(id, &request.key, ctx).await {
        Ok(result) => result,
        Err(e) => return error(e, revision_id),
    };

    let navigation = match &result.effect {
        Some(Effect::Authenticate) => {
            host.navigation.open_authentication();
            None
        }
        Some(Effect::Navigate { intent }) => {
            Some(host.navigation.follow(intent.clone(), identity.as_ref()))
        }
        None => None,
    };

    success(
        SelectionResponse {
            session: result.session,
            effect: result.effect,
            navigation,
        },
        revision_id,
    )
}

/// POST /api/assistant/sessions/{id}/input - Free text (QNA only).
pub async fn submit_input(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<InputRequest>,
) -> ApiResult<AssistantSession> {
    let revision_id = current_revision(&state).await;

    match state.assistant.input(id, &request.text).await {
        Ok(session) => success(session, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/assistant/sessions/{id} - Close a panel.
pub async fn close_assistant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let revision_id = current_revision(&state).await;

    match state.assistant.close(id).await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}
