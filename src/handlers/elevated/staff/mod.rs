// handlers/elevated/staff/mod.rs - Staff directory management
//
// Requires an admin token from POST /admin/login.

pub mod delete; // DELETE /admin/staff/:id
pub mod list; //   GET /admin/staff
pub mod update; // PUT /admin/staff/:id

pub use delete::staff_delete;
pub use list::staff_list;
pub use update::staff_update;
