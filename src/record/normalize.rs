use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, warn};

use super::keys;
use super::types::{MetricValue, TeamRecord};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected a JSON object for a team record, found {0}")]
    NotAnObject(&'static str),

    #[error("expected a JSON array of match records, found {0}")]
    NotAnArray(&'static str),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Legacy column names, keyed by the canonical metric they stand for.
///
/// Example YAML:
/// ```yaml
/// column_aliases:
///   "Coral L2/L3 (#)": ["L2", "L3", "Teleop Coral L2", "Teleop Coral L3"]
///   "Algae Net (#)": ["Barge Algae"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnAliases(BTreeMap<String, Vec<String>>);

impl Default for ColumnAliases {
    fn default() -> Self {
        let table: [(&str, &[&str]); 9] = [
            (keys::TEAM_NUMBER, &["Team"]),
            (keys::MATCH_NUMBER, &["Match"]),
            (keys::SCOUTER_NAME, &["Name"]),
            (
                keys::AUTO_CORAL_L2_L3,
                &[
                    "Auto L2",
                    "Auto Coral L2",
                    "Auto Coral L2 (#)",
                    "Auto L3",
                    "Auto Coral L3",
                    "Auto Coral L3 (#)",
                ],
            ),
            (keys::AUTO_ALGAE_NET, &["Auto Barge Algae"]),
            (keys::AUTO_ALGAE_PROCESSOR, &["Auto Processor Algae"]),
            (
                keys::CORAL_L2_L3,
                &[
                    "L2",
                    "Teleop Coral L2",
                    "Coral L2 (#)",
                    "L3",
                    "Teleop Coral L3",
                    "Coral L3 (#)",
                ],
            ),
            (keys::ALGAE_NET, &["Barge Algae"]),
            (keys::ALGAE_PROCESSOR, &["processor Algae"]),
        ];

        Self(
            table
                .iter()
                .map(|(canonical, aliases)| {
                    (
                        canonical.to_string(),
                        aliases.iter().map(|a| a.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl ColumnAliases {
    pub fn new(table: BTreeMap<String, Vec<String>>) -> Self {
        Self(table)
    }

    /// alias -> canonical lookup table
    fn reverse(&self) -> HashMap<&str, &str> {
        self.0
            .iter()
            .flat_map(|(canonical, aliases)| {
                aliases
                    .iter()
                    .map(move |alias| (alias.as_str(), canonical.as_str()))
            })
            .collect()
    }

    pub fn canonical_for(&self, alias: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a == alias))
            .map(|(canonical, _)| canonical.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Fold an alias value into whatever the canonical key has gathered so far.
/// Numbers add up (split L2 and L3 columns become one L2/L3 count); anything
/// else keeps the first value seen.
fn merge_alias_value(existing: Option<MetricValue>, incoming: MetricValue) -> MetricValue {
    match existing {
        None => incoming,
        Some(current) => match (current.as_number(), incoming.as_number()) {
            (Some(a), Some(b)) => MetricValue::Number(a + b),
            _ => current,
        },
    }
}

fn parse_identifier(value: &MetricValue) -> Option<u32> {
    if let Some(n) = value.as_number() {
        return (n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64).then_some(n as u32);
    }
    // Match labels such as "Q12" or "Match 7"
    if let MetricValue::Text(s) = value {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        return digits.parse().ok();
    }
    None
}

/// Map one raw backend object onto canonical metric names.
///
/// A canonical key present in the input always wins over its aliases.
pub fn normalize_record(raw: &Value, aliases: &ColumnAliases) -> Result<TeamRecord, RecordError> {
    let object = raw
        .as_object()
        .ok_or_else(|| RecordError::NotAnObject(json_kind(raw)))?;

    let reverse = aliases.reverse();
    let mut metrics: BTreeMap<String, MetricValue> = BTreeMap::new();
    let mut from_aliases: BTreeMap<String, MetricValue> = BTreeMap::new();

    for (key, value) in object {
        let Some(metric) = MetricValue::from_json(value) else {
            continue;
        };

        match reverse.get(key.as_str()) {
            Some(canonical) if object.contains_key(*canonical) => {
                debug!("Dropping alias '{}' in favour of '{}'", key, canonical);
            }
            Some(canonical) => {
                let merged = merge_alias_value(from_aliases.remove(*canonical), metric);
                from_aliases.insert(canonical.to_string(), merged);
            }
            None => {
                metrics.insert(key.clone(), metric);
            }
        }
    }

    for (canonical, value) in from_aliases {
        metrics.entry(canonical).or_insert(value);
    }

    let team = metrics
        .remove(keys::TEAM_NUMBER)
        .as_ref()
        .and_then(parse_identifier);
    let match_number = metrics
        .remove(keys::MATCH_NUMBER)
        .as_ref()
        .and_then(parse_identifier);

    Ok(TeamRecord {
        team,
        match_number,
        metrics,
    })
}

/// Normalize a list of match records. Entries that are not objects are
/// skipped with a warning rather than failing the whole list.
pub fn normalize_records(raw: &Value, aliases: &ColumnAliases) -> Result<Vec<TeamRecord>, RecordError> {
    let items = raw
        .as_array()
        .ok_or_else(|| RecordError::NotAnArray(json_kind(raw)))?;

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match normalize_record(item, aliases) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping match record {}: {}", i, e),
        }
    }
    Ok(records)
}

/// Normalize a `team number -> averages` object. Keys that are not team
/// numbers, and team 0, are skipped.
pub fn normalize_team_map(
    raw: &Value,
    aliases: &ColumnAliases,
) -> Result<BTreeMap<u32, TeamRecord>, RecordError> {
    let object = raw
        .as_object()
        .ok_or_else(|| RecordError::NotAnObject(json_kind(raw)))?;

    let mut teams = BTreeMap::new();
    for (key, value) in object {
        let team = match key.trim().parse::<u32>() {
            Ok(0) | Err(_) => {
                debug!("Ignoring non-team key '{}'", key);
                continue;
            }
            Ok(team) => team,
        };
        match normalize_record(value, aliases) {
            Ok(mut record) => {
                record.team = Some(team);
                teams.insert(team, record);
            }
            Err(e) => warn!("Skipping averages for team {}: {}", team, e),
        }
    }
    Ok(teams)
}
