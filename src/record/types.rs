use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single scouted value. Sheets mix booleans, counts, averages and free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetricValue {
    /// Convert a JSON value. Nulls, arrays and objects carry no metric.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetricValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(MetricValue::Number),
            serde_json::Value::String(s) => Some(MetricValue::Text(s.clone())),
            _ => None,
        }
    }

    /// Finite numeric reading of the value. Booleans are not numbers here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) if n.is_finite() => Some(*n),
            MetricValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Rate reading used for flags averaged over matches: `true` counts as 1.
    pub fn as_rate(&self) -> Option<f64> {
        match self {
            MetricValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            other => other.as_number(),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(value: f64) -> Self {
        MetricValue::Number(value)
    }
}

impl From<bool> for MetricValue {
    fn from(value: bool) -> Self {
        MetricValue::Bool(value)
    }
}

impl From<&str> for MetricValue {
    fn from(value: &str) -> Self {
        MetricValue::Text(value.to_string())
    }
}

/// One match (or one team's averages) after alias normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub team: Option<u32>,
    pub match_number: Option<u32>,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
}

impl TeamRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_team(team: u32) -> Self {
        Self {
            team: Some(team),
            ..Self::default()
        }
    }

    /// Builder-style insert, mostly for assembling records by hand.
    pub fn with(mut self, key: &str, value: impl Into<MetricValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<MetricValue>) {
        self.metrics.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.metrics.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.metrics.contains_key(key)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(MetricValue::as_number)
    }

    /// Numeric value or zero. Scouting data is sparse, missing means nothing scored.
    pub fn number_or_zero(&self, key: &str) -> f64 {
        self.number(key).unwrap_or(0.0)
    }

    pub fn rate_or_zero(&self, key: &str) -> f64 {
        self.get(key).and_then(MetricValue::as_rate).unwrap_or(0.0)
    }

    /// Sum of several metrics, each missing one counting as zero.
    pub fn sum_of(&self, keys: &[&str]) -> f64 {
        keys.iter().map(|k| self.number_or_zero(k)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}
