pub mod alert_set;
pub mod evaluator;
pub mod rule;
pub mod rule_source;

pub use alert_set::FiredSet;
pub use evaluator::{evaluate, AlertEvent, EvalOutcome, RuleEvaluator, SkipReason};
pub use rule::{AlertKey, Condition, WatchRule};
pub use rule_source::{load_active_rules, RuleRow};
