// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Registration drafts, phone verification and token acquisition.
//
// Security Level: None
// Middleware: None (the OTP route applies its own per-phone rate limit)

pub mod admin;
pub mod staff;
