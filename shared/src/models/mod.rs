pub mod claims;
pub mod error;
