// Handler modules untuk Chat Service
pub mod conversations;
pub mod messages;
pub mod websocket;
