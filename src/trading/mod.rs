pub mod analysis;
pub mod cache;
pub mod notification;
pub mod upbit;
pub mod watch;
