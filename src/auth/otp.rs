//! Portal sign-in.
//!
//! Identity verification is a black box to the rest of the backend: it takes
//! credentials and yields an `Identity` with a role. The demo implementation
//! accepts a fixed OTP for any well-formed mobile number.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Identity, UserRole};

/// Digits in a mobile number.
pub const MOBILE_DIGITS: usize = 10;

/// Display name given to citizens signing in with an OTP.
pub const CITIZEN_DISPLAY_NAME: &str = "Citizen User";

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Send a one-time password to `mobile`.
    async fn request_otp(&self, mobile: &str) -> Result<(), AppError>;

    /// Check the OTP and produce the signed-in citizen.
    async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<Identity, AppError>;

    /// The demo Grievance Redressal Officer.
    async fn officer(&self) -> Result<Identity, AppError>;
}

fn check_mobile(mobile: &str) -> Result<(), AppError> {
    if mobile.len() == MOBILE_DIGITS && mobile.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(AppError::validation(vec!["mobile".to_string()]))
    }
}

/// Accepts OTP `1234` for every valid number. Nothing is actually sent.
#[derive(Debug, Clone)]
pub struct DemoOtpAuthenticator {
    otp: String,
}

impl Default for DemoOtpAuthenticator {
    fn default() -> Self {
        Self {
            otp: "1234".to_string(),
        }
    }
}

#[async_trait]
impl Authenticator for DemoOtpAuthenticator {
    async fn request_otp(&self, mobile: &str) -> Result<(), AppError> {
        check_mobile(mobile)?;
        tracing::info!("OTP requested for mobile ending {}", &mobile[MOBILE_DIGITS - 4..]);
        Ok(())
    }

    async fn verify_otp(&self, mobile: &str, otp: &str) -> Result<Identity, AppError> {
        check_mobile(mobile)?;
        if otp.trim() != self.otp {
            return Err(AppError::Unauthorized("Invalid OTP".to_string()));
        }

        Ok(Identity {
            id: format!("USER-{}", mobile),
            display_name: CITIZEN_DISPLAY_NAME.to_string(),
            role: UserRole::Citizen,
            contact_key: mobile.to_string(),
        })
    }

    async fn officer(&self) -> Result<Identity, AppError> {
        Ok(Identity {
            id: "GRO-001".to_string(),
            display_name: "Rajesh Kumar".to_string(),
            role: UserRole::Gro,
            contact_key: "9999999999".to_string(),
        })
    }
}
