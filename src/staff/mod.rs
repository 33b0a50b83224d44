//! Staff onboarding: draft records, phone OTP verification and first-login
//! activation.

pub mod error;
pub mod lifecycle;
pub mod otp;
pub mod record;
pub mod service;
pub mod staff_id;
pub mod store;

pub use error::StaffError;
pub use lifecycle::{StaffEvent, StaffState, StaffStatus};
pub use record::{StaffPatch, StaffRecord};
pub use service::{LoginOutcome, ServiceSettings, StaffService};
pub use store::{StaffStore, StoreError};
