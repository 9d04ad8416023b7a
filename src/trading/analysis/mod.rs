pub mod change_summary;
pub mod report;

pub use change_summary::{analyze, compute_change_rates, ChangeRate, ChangeSummary};
pub use report::MarketReport;
