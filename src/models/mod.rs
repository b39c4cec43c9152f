//! Data models for the HP grievance portal.
//!
//! Field names serialize in camelCase to match the portal frontend.

mod grievance;
mod identity;
mod reference;

pub use grievance::*;
pub use identity::*;
pub use reference::*;
