pub mod market_directory_cache;

pub use market_directory_cache::{MarketDirectory, MarketDirectoryCache, NameLookupTable};
