// handlers/elevated/mod.rs - Elevated handlers (admin JWT required)
//
// Security Level: bearer token with role `admin`
// Middleware: admin_auth_middleware injects `AuthUser`

pub mod staff;
