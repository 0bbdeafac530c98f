use serde_json::Value;
use tracing::warn;

use super::config::{RuleValue, ScoringRules};
use crate::record::{keys, normalize_record, ColumnAliases, MetricValue, TeamRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Auto,
    Teleop,
    Foul,
}

impl Phase {
    pub fn for_metric(key: &str) -> Self {
        if keys::is_foul(key) {
            Phase::Foul
        } else if key.starts_with("Auto") {
            Phase::Auto
        } else {
            Phase::Teleop
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Auto => "auto",
            Phase::Teleop => "teleop",
            Phase::Foul => "foul",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricContribution {
    pub metric: String,  // e.g. "Coral L4 (#)"
    pub phase: Phase,
    pub value: f64,      // value read from the record (tier index for tiered rules)
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub auto: f64,
    pub teleop: f64,
    pub fouls: f64,
    pub total: f64,
    pub contributions: Vec<MetricContribution>,
}

impl ScoreBreakdown {
    pub fn zero() -> Self {
        Self {
            auto: 0.0,
            teleop: 0.0,
            fouls: 0.0,
            total: 0.0,
            contributions: Vec::new(),
        }
    }

    fn add(&mut self, metric: &str, phase: Phase, value: f64, points: f64) {
        match phase {
            Phase::Auto => self.auto += points,
            Phase::Teleop => self.teleop += points,
            Phase::Foul => self.fouls += points,
        }
        self.contributions.push(MetricContribution {
            metric: metric.to_string(),
            phase,
            value,
            points,
        });
    }
}

/// Whether a leave-bonus value counts as achieved: `true`, a number of at
/// least 0.5 (an average over matches), or the text "true".
pub fn leave_bonus_achieved(value: &MetricValue) -> bool {
    match value {
        MetricValue::Bool(b) => *b,
        MetricValue::Text(s) if s.trim().eq_ignore_ascii_case("true") => true,
        other => other.as_number().is_some_and(|n| n >= 0.5),
    }
}

/// Score one match record, or one team's averages, against a rule table.
///
/// Metrics without a rule, and values that are not finite numbers, add
/// nothing. Fouls count toward the total only.
pub fn compute_score(record: &TeamRecord, rules: &ScoringRules) -> ScoreBreakdown {
    let mut breakdown = ScoreBreakdown::zero();

    for (key, rule) in rules.iter() {
        let Some(value) = record.get(key) else {
            continue;
        };

        match rule {
            RuleValue::Flat(bonus) if key == keys::LEAVE_BONUS => {
                if leave_bonus_achieved(value) {
                    breakdown.add(key, Phase::Auto, 1.0, *bonus);
                }
            }
            RuleValue::Flat(per_unit) => {
                let Some(n) = value.as_number() else {
                    continue;
                };
                breakdown.add(key, Phase::for_metric(key), n, per_unit * n);
            }
            RuleValue::Tiered(tiers) => {
                let Some(n) = value.as_number() else {
                    continue;
                };
                // f64::round goes half away from zero, so an average of 1.5 lands on tier 2
                let tier = n.round();
                if let Some(points) = tiers.get(&format!("{}", tier as i64)) {
                    breakdown.add(key, Phase::for_metric(key), tier, *points);
                }
            }
        }
    }

    breakdown.total = breakdown.auto + breakdown.teleop + breakdown.fouls;
    breakdown
}

/// Score raw backend JSON. Anything that is not an object scores zero.
pub fn compute_score_value(
    raw: &Value,
    rules: &ScoringRules,
    aliases: &ColumnAliases,
) -> ScoreBreakdown {
    match normalize_record(raw, aliases) {
        Ok(record) => compute_score(&record, rules),
        Err(e) => {
            warn!("Scoring skipped: {}", e);
            ScoreBreakdown::zero()
        }
    }
}
