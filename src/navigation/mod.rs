//! Navigation guard.
//!
//! Tracks which view the host is showing and gates views that need a
//! signed-in identity. A blocked request is parked as the pending target
//! and replayed once authentication succeeds.

use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Views the host can show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Home,
    Dashboard,
    FileGrievance,
    Track,
    GrievanceDetails,
}

impl View {
    pub fn requires_identity(self) -> bool {
        !matches!(self, View::Home)
    }
}

/// Where a successful sign-in lands when nothing was pending.
pub const LANDING_VIEW: View = View::Dashboard;

/// Which dashboard the `dashboard` view shows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DashboardVariant {
    Citizen,
    Officer,
}

impl DashboardVariant {
    pub fn for_identity(identity: &Identity) -> Self {
        if identity.is_officer() {
            DashboardVariant::Officer
        } else {
            DashboardVariant::Citizen
        }
    }
}

/// Fields that pre-fill the filing form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FormPrefill {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
}

/// A request from elsewhere (e.g. HP Assist) to show a view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    pub target: View,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<FormPrefill>,
    /// Grievance to open when `target` is `grievance-details`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grievance_id: Option<String>,
}

impl NavigationIntent {
    pub fn to(target: View) -> Self {
        Self {
            target,
            payload: None,
            grievance_id: None,
        }
    }
}

/// Result of a navigation request.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum NavigationOutcome {
    /// The host now shows `view`.
    Navigated { view: View },
    /// The authentication flow was opened; `pending` is replayed on success.
    AuthenticationRequired { pending: View },
}

/// Host-side navigation state.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationGuard {
    current: View,
    pending: Option<View>,
    auth_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    selected_grievance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefill: Option<FormPrefill>,
}

impl Default for NavigationGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self {
            current: View::Home,
            pending: None,
            auth_open: false,
            selected_grievance: None,
            prefill: None,
        }
    }

    pub fn current(&self) -> View {
        self.current
    }

    pub fn pending(&self) -> Option<View> {
        self.pending
    }

    pub fn is_auth_open(&self) -> bool {
        self.auth_open
    }

    pub fn prefill(&self) -> Option<&FormPrefill> {
        self.prefill.as_ref()
    }

    pub fn selected_grievance(&self) -> Option<&str> {
        self.selected_grievance.as_deref()
    }

    /// Ask to show `target`.
    ///
    /// Without an identity, protected targets open the authentication flow
    /// instead. Only the latest blocked target is remembered.
    pub fn request(&mut self, target: View, identity: Option<&Identity>) -> NavigationOutcome {
        if target.requires_identity() && identity.is_none() {
            tracing::debug!("Navigation to {:?} deferred until sign-in", target);
            self.pending = Some(target);
            self.auth_open = true;
            return NavigationOutcome::AuthenticationRequired { pending: target };
        }

        self.current = target;
        NavigationOutcome::Navigated { view: target }
    }

    /// Follow an intent, keeping its form payload for the filing view.
    pub fn follow(
        &mut self,
        intent: NavigationIntent,
        identity: Option<&Identity>,
    ) -> NavigationOutcome {
        if let Some(payload) = intent.payload {
            self.prefill = Some(payload);
        }
        match (intent.target, intent.grievance_id) {
            (View::GrievanceDetails, Some(id)) => self.show_grievance(&id, identity),
            (target, _) => self.request(target, identity),
        }
    }

    /// Open a grievance's detail view.
    pub fn show_grievance(&mut self, id: &str, identity: Option<&Identity>) -> NavigationOutcome {
        let outcome = self.request(View::GrievanceDetails, identity);
        if matches!(outcome, NavigationOutcome::Navigated { .. }) {
            self.selected_grievance = Some(id.to_string());
        }
        outcome
    }

    /// Open the authentication flow without a pending target (header sign-in).
    pub fn open_authentication(&mut self) {
        self.auth_open = true;
    }

    /// Close the flow after a successful sign-in and replay the pending target.
    pub fn on_authenticated(&mut self) -> View {
        self.auth_open = false;
        self.current = self.pending.take().unwrap_or(LANDING_VIEW);
        self.current
    }

    /// The user dismissed the authentication flow.
    pub fn on_authentication_abandoned(&mut self) {
        self.auth_open = false;
        self.pending = None;
    }

    pub fn on_signed_out(&mut self) {
        self.current = View::Home;
        self.pending = None;
        self.selected_grievance = None;
    }

    /// A grievance was filed: drop the prefill and show the tracking list.
    pub fn on_grievance_filed(&mut self) {
        self.prefill = None;
        self.current = View::Track;
    }
}
