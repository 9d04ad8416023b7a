pub mod list_job;
pub mod market_job;
pub mod task_scheduler;

pub use list_job::{ListJob, ListStatus};
pub use market_job::MarketJob;
pub use task_scheduler::{PeriodicJob, TaskScheduler};
