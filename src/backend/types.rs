use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::error::BackendError;

/// Per-team entry of `/get_defense_teams`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DefenseRating {
    pub score: f64,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    /// Only alliance selection saves report a timestamp.
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsResponse {
    #[serde(default)]
    pub teams: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamAveragesResponse {
    #[serde(default)]
    pub averages: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectionsResponse {
    #[serde(default)]
    pub selections: Value,
    #[serde(default)]
    pub timestamp: f64,
}

/// The backend's error convention: an object with an `error` key.
pub fn error_message(body: &Value) -> Option<String> {
    let error = body.as_object()?.get("error")?;
    Some(match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Decode a `{"<team>": value}` object, skipping team 0, non-numeric keys
/// and values `parse` rejects.
pub fn parse_team_map<T, F>(endpoint: &str, body: &Value, parse: F) -> Result<BTreeMap<u32, T>, BackendError>
where
    F: Fn(&Value) -> Option<T>,
{
    let object = body.as_object().ok_or_else(|| BackendError::Decode {
        endpoint: endpoint.to_string(),
        reason: "expected an object keyed by team number".to_string(),
    })?;

    let mut map = BTreeMap::new();
    for (key, value) in object {
        let team = match key.trim().parse::<u32>() {
            Ok(team) if team > 0 => team,
            _ => {
                debug!("{}: ignoring key '{}'", endpoint, key);
                continue;
            }
        };
        match parse(value) {
            Some(parsed) => {
                map.insert(team, parsed);
            }
            None => debug!("{}: ignoring value for team {}", endpoint, team),
        }
    }
    Ok(map)
}

pub fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: Value) -> Result<T, BackendError> {
    serde_json::from_value(body).map_err(|e| BackendError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}
