// handlers/protected/mod.rs - Protected handlers (staff JWT required)
//
// Security Level: bearer token with role `teacher`
// Middleware: staff_auth_middleware injects `AuthUser`

pub mod staff;
