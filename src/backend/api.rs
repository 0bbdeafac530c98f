use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::client::{BackendClient, Form};
use super::error::BackendError;
use super::types::{
    decode, parse_team_map, DefenseRating, SaveResponse, SelectionsResponse, TeamAveragesResponse,
    TeamsResponse,
};
use crate::alliance::lists::{parse_defense_list, team_number, ListKind, PickLists};
use crate::alliance::selections::{AllianceSelections, RemoteSelections};
use crate::alliance::DefenseEntry;
use crate::record::{
    normalize_record, normalize_records, normalize_team_map, ColumnAliases, RecordError, TeamRecord,
};
use crate::scoring::ScoringRules;

fn record_error(endpoint: &str, e: RecordError) -> BackendError {
    BackendError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    }
}

impl BackendClient {
    /// Game configuration, including the scoring rules the event uses.
    pub async fn get_config(&self) -> Result<Value, BackendError> {
        self.get_json("/get_config", &[], true).await
    }

    /// Scoring rules published by the backend, if it has any.
    pub async fn get_scoring_rules(&self) -> Result<Option<ScoringRules>, BackendError> {
        let config = self.get_config().await?;
        Ok(ScoringRules::from_game_config(&config))
    }

    pub async fn get_all_teams(&self) -> Result<Vec<u32>, BackendError> {
        const ENDPOINT: &str = "/get_all_teams";
        let body = self.get_json(ENDPOINT, &[], true).await?;
        let response: TeamsResponse = decode(ENDPOINT, body)?;
        let mut teams: Vec<u32> = response.teams.iter().filter_map(team_number).collect();
        teams.sort_unstable();
        teams.dedup();
        Ok(teams)
    }

    pub async fn get_all_team_averages(
        &self,
        aliases: &ColumnAliases,
    ) -> Result<BTreeMap<u32, TeamRecord>, BackendError> {
        const ENDPOINT: &str = "/get_all_team_averages";
        let body = self.get_json(ENDPOINT, &[], true).await?;
        normalize_team_map(&body, aliases).map_err(|e| record_error(ENDPOINT, e))
    }

    pub async fn get_team_averages(
        &self,
        team: u32,
        aliases: &ColumnAliases,
    ) -> Result<TeamRecord, BackendError> {
        const ENDPOINT: &str = "/get_team_averages";
        let form: Form = vec![("team_number".to_string(), team.to_string())];
        let body = self.post_form(ENDPOINT, &form).await?;
        let response: TeamAveragesResponse = decode(ENDPOINT, body)?;

        let mut record =
            normalize_record(&response.averages, aliases).map_err(|e| record_error(ENDPOINT, e))?;
        record.team = Some(team);
        Ok(record)
    }

    /// Every scouted match for one team. A 404 means the team has no
    /// matches yet and yields an empty list.
    pub async fn get_match_data(
        &self,
        team: u32,
        aliases: &ColumnAliases,
    ) -> Result<Vec<TeamRecord>, BackendError> {
        const ENDPOINT: &str = "/get_match_data";
        let query = [("team_number", team.to_string())];
        let body = match self.get_json(ENDPOINT, &query, true).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                debug!("No match data for team {}", team);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut records =
            normalize_records(&body, aliases).map_err(|e| record_error(ENDPOINT, e))?;
        for record in records.iter_mut() {
            record.team.get_or_insert(team);
        }
        Ok(records)
    }

    /// Total match points per team.
    pub async fn get_team_rankings(&self) -> Result<BTreeMap<u32, f64>, BackendError> {
        const ENDPOINT: &str = "/get_team_rankings";
        let body = self.get_json(ENDPOINT, &[], true).await?;
        parse_team_map(ENDPOINT, &body, |v| v.as_f64().filter(|n| n.is_finite()))
    }

    pub async fn get_team_match_counts(&self) -> Result<BTreeMap<u32, u32>, BackendError> {
        const ENDPOINT: &str = "/get_team_match_counts";
        let body = self.get_json(ENDPOINT, &[], true).await?;
        parse_team_map(ENDPOINT, &body, |v| {
            v.as_u64().and_then(|n| u32::try_from(n).ok())
        })
    }

    pub async fn get_defense_teams(&self) -> Result<BTreeMap<u32, DefenseRating>, BackendError> {
        const ENDPOINT: &str = "/get_defense_teams";
        let body = self.get_json(ENDPOINT, &[], true).await?;
        parse_team_map(ENDPOINT, &body, |v| {
            serde_json::from_value::<DefenseRating>(v.clone()).ok()
        })
    }

    /// Team numbers of a flat list (do-not-pick or avoid).
    pub async fn load_team_list(&self, kind: ListKind) -> Result<Vec<u32>, BackendError> {
        let endpoint = format!("/load_{}_list", kind.as_str());
        let body = self.get_json(&endpoint, &[], false).await?;
        let response: TeamsResponse = decode(&endpoint, body)?;
        Ok(response.teams.iter().filter_map(team_number).collect())
    }

    /// Defense list in rank order; legacy flat arrays are ranked by position.
    pub async fn load_defense_list(&self) -> Result<Vec<DefenseEntry>, BackendError> {
        let endpoint = format!("/load_{}_list", ListKind::Defense.as_str());
        let body = self.get_json(&endpoint, &[], false).await?;
        let response: TeamsResponse = decode(&endpoint, body)?;
        parse_defense_list(&Value::Array(response.teams)).map_err(|e| BackendError::Decode {
            endpoint,
            reason: e.to_string(),
        })
    }

    /// Fetch all three lists from the backend.
    pub async fn load_pick_lists(&self) -> Result<PickLists, BackendError> {
        let (dnp, avoid, defense) = tokio::try_join!(
            self.load_team_list(ListKind::DoNotPick),
            self.load_team_list(ListKind::Avoid),
            self.load_defense_list(),
        )?;

        let mut lists = PickLists::new();
        lists.set(ListKind::DoNotPick, dnp);
        lists.set(ListKind::Avoid, avoid);
        lists.set(ListKind::Defense, defense.into_iter().map(|e| e.team).collect());
        Ok(lists)
    }

    pub async fn save_list(&self, kind: ListKind, lists: &PickLists) -> Result<SaveResponse, BackendError> {
        let endpoint = format!("/save_{}_list", kind.as_str());
        let form: Form = match kind {
            ListKind::Defense => vec![("teams".to_string(), lists.export(kind).to_string())],
            _ => lists
                .teams(kind)
                .into_iter()
                .map(|team| ("teams[]".to_string(), team.to_string()))
                .collect(),
        };

        let body = self.post_form(&endpoint, &form).await?;
        let response: SaveResponse = decode(&endpoint, body)?;
        if !response.success {
            return Err(BackendError::Server {
                endpoint,
                message: format!("Error saving \"{}\" list", kind.label()),
            });
        }
        info!("{}", response.message);
        Ok(response)
    }

    pub async fn load_selections(&self) -> Result<RemoteSelections, BackendError> {
        const ENDPOINT: &str = "/load_alliance_selections";
        let body = self.get_json(ENDPOINT, &[], false).await?;
        let response: SelectionsResponse = decode(ENDPOINT, body)?;
        Ok(RemoteSelections {
            selections: AllianceSelections::from_json(&response.selections),
            timestamp: response.timestamp,
        })
    }

    /// Save the whole board. Returns the backend's timestamp for the write.
    pub async fn save_selections(&self, selections: &AllianceSelections) -> Result<f64, BackendError> {
        const ENDPOINT: &str = "/save_alliance_selections";
        let form: Form = vec![("selections".to_string(), selections.to_json().to_string())];
        let body = self.post_form(ENDPOINT, &form).await?;
        let response: SaveResponse = decode(ENDPOINT, body)?;

        match (response.success, response.timestamp) {
            (true, Some(timestamp)) => Ok(timestamp),
            (true, None) => Err(BackendError::Decode {
                endpoint: ENDPOINT.to_string(),
                reason: "missing timestamp".to_string(),
            }),
            (false, _) => Err(BackendError::Server {
                endpoint: ENDPOINT.to_string(),
                message: "Error saving alliance selections".to_string(),
            }),
        }
    }
}
