pub mod config;
pub mod engine;
pub mod profile;
pub mod validation;

pub use config::{RuleValue, ScoringRules};
pub use engine::{
    compute_score, compute_score_value, leave_bonus_achieved, MetricContribution, Phase,
    ScoreBreakdown,
};
pub use profile::{CategoryTotals, ClimbLevel, Specialization, SPECIALIZATION_THRESHOLD};
pub use validation::validate_scoring;
