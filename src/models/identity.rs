//! Identity model for the signed-in portal user.

use serde::{Deserialize, Serialize};

/// The two fixed roles known to the portal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Citizen,
    /// Grievance Redressal Officer
    Gro,
}

/// The authenticated identity.
///
/// `contact_key` (the mobile number) never changes for the lifetime of the
/// identity and is the partition key for stored grievances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub role: UserRole,
    pub contact_key: String,
}

impl Identity {
    pub fn is_officer(&self) -> bool {
        self.role == UserRole::Gro
    }
}

/// Request body for starting the OTP flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    #[serde(default)]
    pub mobile: String,
}

/// Request body for completing the OTP flow.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub otp: String,
}
