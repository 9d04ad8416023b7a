pub mod market;
pub mod upbit_client;

pub use upbit_client::UpbitClient;
