// Repository modules untuk Chat Service
pub mod conversation_repo;
pub mod message_repo;
pub mod store;

// Export publik
pub use conversation_repo::*;
pub use message_repo::*;
pub use store::PgChatStore;
