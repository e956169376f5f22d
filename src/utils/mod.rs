pub mod format;
pub mod jwt;
pub mod time;
