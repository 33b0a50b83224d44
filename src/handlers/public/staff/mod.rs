// handlers/public/staff/mod.rs - Registration wizard and staff login
//
// Everything a new staff member does before holding a token.

pub mod draft; // POST /staff/draft, GET /staff/draft/:draft_id
pub mod login; // POST /staff/login
pub mod otp; //   POST /staff/send-otp, POST /staff/verify

pub use draft::{draft_get, draft_save};
pub use login::login;
pub use otp::{otp_send, otp_verify};
