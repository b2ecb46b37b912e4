pub mod session_repo;
pub mod slot_repo;
pub mod store;
pub mod template_repo;
