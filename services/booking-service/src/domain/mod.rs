// Modul domain untuk Booking Service
pub mod session;
pub mod slot;
pub mod template;
