//! Database repository implementations

pub mod application_repository;
pub mod audit_log_repository;
pub mod cafeteria_repository;
pub mod inventory_repository;
pub mod menu_repository;
pub mod notification_repository;
pub mod order_repository;
pub mod profile_repository;
pub mod support_repository;

// Re-export all repositories for convenience
pub use application_repository::*;
pub use audit_log_repository::*;
pub use cafeteria_repository::*;
pub use inventory_repository::*;
pub use menu_repository::*;
pub use notification_repository::*;
pub use order_repository::*;
pub use profile_repository::*;
pub use support_repository::*;
