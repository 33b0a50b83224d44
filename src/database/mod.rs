pub mod manager;
pub mod memory;
pub mod schema;
pub mod staff_repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStaffStore;
pub use staff_repository::PgStaffStore;
