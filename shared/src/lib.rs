// Shared library untuk booking-service dan chat-service
pub mod models;
pub mod utils;
