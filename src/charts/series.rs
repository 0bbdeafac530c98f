use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::record::{keys, TeamRecord};
use crate::scoring::{compute_score, ScoringRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMetric {
    Total,
    Auto,
    Teleop,
    Defense,
}

impl ChartMetric {
    pub fn label(&self) -> &'static str {
        match self {
            ChartMetric::Total => "Total Score",
            ChartMetric::Auto => "Auto Score",
            ChartMetric::Teleop => "Teleop Score",
            ChartMetric::Defense => "Defense Rating",
        }
    }

    /// Value of this metric for one match.
    pub fn value(&self, record: &TeamRecord, rules: &ScoringRules) -> f64 {
        match self {
            ChartMetric::Defense => record.number_or_zero(keys::DEFENSE_PERFORMED),
            scored => {
                let breakdown = compute_score(record, rules);
                match scored {
                    ChartMetric::Auto => breakdown.auto,
                    ChartMetric::Teleop => breakdown.teleop,
                    // Robot points, fouls left out
                    _ => breakdown.auto + breakdown.teleop,
                }
            }
        }
    }
}

impl FromStr for ChartMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "total" | "total_score" => Ok(ChartMetric::Total),
            "auto" | "auto_score" => Ok(ChartMetric::Auto),
            "teleop" | "teleop_score" => Ok(ChartMetric::Teleop),
            "defense" | "defense_rating" => Ok(ChartMetric::Defense),
            other => Err(format!(
                "unknown chart metric '{}' (expected total, auto, teleop or defense)",
                other
            )),
        }
    }
}

impl fmt::Display for ChartMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    #[default]
    PerMatch,
    Average,
}

impl FromStr for Grouping {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_match" | "match" => Ok(Grouping::PerMatch),
            "average" | "avg" => Ok(Grouping::Average),
            other => Err(format!("unknown grouping '{}' (expected per-match or average)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (&str, f64)> {
        self.labels.iter().map(String::as_str).zip(self.values.iter().copied())
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

fn match_label(record: &TeamRecord) -> String {
    match record.match_number {
        Some(n) => format!("Match {}", n),
        None => "Match ?".to_string(),
    }
}

/// Shape one team's matches into chart points.
///
/// Matches are ordered by match number (unnumbered ones first). Averaging
/// defense ignores matches where no defense was played.
pub fn metric_series(
    matches: &[TeamRecord],
    metric: ChartMetric,
    grouping: Grouping,
    rules: &ScoringRules,
) -> Series {
    if matches.is_empty() {
        return Series::default();
    }

    let mut ordered: Vec<&TeamRecord> = matches.iter().collect();
    ordered.sort_by_key(|r| r.match_number.unwrap_or(0));

    match grouping {
        Grouping::PerMatch => Series {
            labels: ordered.iter().map(|r| match_label(r)).collect(),
            values: ordered.iter().map(|r| metric.value(r, rules)).collect(),
        },
        Grouping::Average => {
            let mut values: Vec<f64> = ordered.iter().map(|r| metric.value(r, rules)).collect();
            if metric == ChartMetric::Defense {
                values.retain(|v| *v > 0.0);
            }
            let average = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            Series {
                labels: vec!["Average".to_string()],
                values: vec![average],
            }
        }
    }
}
