// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (staff JWT) → Elevated (admin JWT)

pub mod elevated; // Tier 3: /admin/staff*
pub mod protected; // Tier 2: /staff/me, /staff/courses
pub mod public; // Tier 1: registration wizard, logins
