pub mod env;
pub mod log;
pub mod shutdown_manager;

pub use env::{AppConfig, TelegramConfig};
