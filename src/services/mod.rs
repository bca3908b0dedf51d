pub mod debug_service;
pub mod migration_service;
pub mod user_service;
