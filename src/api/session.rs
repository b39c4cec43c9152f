//! Session and sign-in endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use super::{current_revision, error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{Identity, OtpRequest, VerifyOtpRequest};
use crate::navigation::{DashboardVariant, NavigationGuard};
use crate::{AppState, Host};

/// What the host currently shows and who is signed in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardVariant>,
    pub navigation: NavigationGuard,
}

impl SessionView {
    pub fn of(host: &Host) -> Self {
        Self {
            identity: host.identity.clone(),
            dashboard: host.identity.as_ref().map(DashboardVariant::for_identity),
            navigation: host.navigation.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpSent {
    pub mobile: String,
}

/// GET /api/session - Current identity and navigation state.
pub async fn get_session(State(state): State<AppState>) -> ApiResult<SessionView> {
    let revision_id = current_revision(&state).await;
    let host = state.host.lock().await;
    success(SessionView::of(&host), revision_id)
}

/// POST /api/auth/otp - Send an OTP and open the authentication flow.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(request): Json<OtpRequest>,
) -> ApiResult<OtpSent> {
    let revision_id = current_revision(&state).await;
    let mobile = request.mobile.trim().to_string();

    match state.authenticator.request_otp(&mobile).await {
        Ok(()) => {
            state.host.lock().await.navigation.open_authentication();
            success(OtpSent { mobile }, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/verify - Complete the OTP flow and sign in.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> ApiResult<SessionView> {
    let revision_id = current_revision(&state).await;

    match state
        .authenticator
        .verify_otp(request.mobile.trim(), &request.otp)
        .await
    {
        Ok(identity) => sign_in(&state, identity, revision_id).await,
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/auth/officer - Demo sign-in as the Grievance Redressal Officer.
pub async fn officer_login(State(state): State<AppState>) -> ApiResult<SessionView> {
    let revision_id = current_revision(&state).await;

    match state.authenticator.officer().await {
        Ok(identity) => sign_in(&state, identity, revision_id).await,
        Err(e) => error(e, revision_id),
    }
}

async fn sign_in(state: &AppState, identity: Identity, revision_id: i64) -> ApiResult<SessionView> {
    let mut host = state.host.lock().await;
    if host.identity.is_some() {
        return error(
            AppError::BadRequest("Already signed in; sign out first".to_string()),
            revision_id,
        );
    }

    if let Err(e) = state.identities.save(&identity).await {
        return error(e, revision_id);
    }

    tracing::info!("{} signed in as {:?}", identity.id, identity.role);
    host.identity = Some(identity);
    let view = host.navigation.on_authenticated();
    tracing::debug!("Landing on {:?}", view);

    success(SessionView::of(&host), current_revision(state).await)
}

/// POST /api/auth/cancel - Abandon the authentication flow.
pub async fn cancel_authentication(State(state): State<AppState>) -> ApiResult<SessionView> {
    let revision_id = current_revision(&state).await;
    let mut host = state.host.lock().await;
    host.navigation.on_authentication_abandoned();
    success(SessionView::of(&host), revision_id)
}

/// POST /api/auth/logout - Sign out and forget the stored identity.
pub async fn logout(State(state): State<AppState>) -> ApiResult<SessionView> {
    let revision_id = current_revision(&state).await;
    let mut host = state.host.lock().await;

    if let Err(e) = state.identities.clear().await {
        return error(e, revision_id);
    }
    if let Some(identity) = host.identity.take() {
        tracing::info!("{} signed out", identity.id);
    }
    host.navigation.on_signed_out();

    success(SessionView::of(&host), current_revision(&state).await)
}
