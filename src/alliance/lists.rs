use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    DoNotPick,
    Avoid,
    Defense,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::DoNotPick, ListKind::Avoid, ListKind::Defense];

    /// Name used in backend endpoints (`load_<name>_list`) and export files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::DoNotPick => "do_not_pick",
            ListKind::Avoid => "avoid",
            ListKind::Defense => "defense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::DoNotPick => "Do Not Pick",
            ListKind::Avoid => "Avoid",
            ListKind::Defense => "Defense",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "do_not_pick" | "dnp" => Ok(ListKind::DoNotPick),
            "avoid" => Ok(ListKind::Avoid),
            "defense" | "defence" => Ok(ListKind::Defense),
            other => Err(format!(
                "unknown list '{}' (expected do-not-pick, avoid or defense)",
                other
            )),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ListError {
    #[error("Team {team} is already in the \"{list}\" list")]
    AlreadyListed { team: u32, list: ListKind },

    #[error("Team {team} is not in the \"{list}\" list")]
    NotListed { team: u32, list: ListKind },

    #[error("{0} is not a valid team number")]
    InvalidTeam(u32),

    #[error("rank {rank} is out of range (list has {len} teams)")]
    RankOutOfRange { rank: u32, len: usize },

    #[error("Invalid format: not an array")]
    NotAnArray,

    #[error("No valid team numbers found in import")]
    EmptyImport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseEntry {
    pub team: u32,
    pub rank: u32,
}

/// The three user-curated team lists consulted by the recommender.
///
/// The defense list is kept sorted with ranks 1..=n.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PickLists {
    #[serde(default)]
    do_not_pick: Vec<u32>,
    #[serde(default)]
    avoid: Vec<u32>,
    #[serde(default)]
    defense: Vec<DefenseEntry>,
}

impl PickLists {
    pub fn new() -> Self {
        Self::default()
    }

    fn flat(&self, kind: ListKind) -> Option<&Vec<u32>> {
        match kind {
            ListKind::DoNotPick => Some(&self.do_not_pick),
            ListKind::Avoid => Some(&self.avoid),
            ListKind::Defense => None,
        }
    }

    fn flat_mut(&mut self, kind: ListKind) -> Option<&mut Vec<u32>> {
        match kind {
            ListKind::DoNotPick => Some(&mut self.do_not_pick),
            ListKind::Avoid => Some(&mut self.avoid),
            ListKind::Defense => None,
        }
    }

    pub fn contains(&self, kind: ListKind, team: u32) -> bool {
        match self.flat(kind) {
            Some(list) => list.contains(&team),
            None => self.defense.iter().any(|e| e.team == team),
        }
    }

    /// Teams on a list. Defense teams come back in rank order.
    pub fn teams(&self, kind: ListKind) -> Vec<u32> {
        match self.flat(kind) {
            Some(list) => list.clone(),
            None => self.defense.iter().map(|e| e.team).collect(),
        }
    }

    pub fn len(&self, kind: ListKind) -> usize {
        match self.flat(kind) {
            Some(list) => list.len(),
            None => self.defense.len(),
        }
    }

    pub fn defense_entries(&self) -> &[DefenseEntry] {
        &self.defense
    }

    pub fn defense_rank(&self, team: u32) -> Option<u32> {
        self.defense.iter().find(|e| e.team == team).map(|e| e.rank)
    }

    /// Append a team. Defense teams get the next rank.
    pub fn add(&mut self, kind: ListKind, team: u32) -> Result<(), ListError> {
        if team == 0 {
            return Err(ListError::InvalidTeam(team));
        }
        if self.contains(kind, team) {
            return Err(ListError::AlreadyListed { team, list: kind });
        }
        match self.flat_mut(kind) {
            Some(list) => list.push(team),
            None => {
                let rank = self.defense.len() as u32 + 1;
                self.defense.push(DefenseEntry { team, rank });
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, kind: ListKind, team: u32) -> Result<(), ListError> {
        if !self.contains(kind, team) {
            return Err(ListError::NotListed { team, list: kind });
        }
        match self.flat_mut(kind) {
            Some(list) => list.retain(|t| *t != team),
            None => {
                self.defense.retain(|e| e.team != team);
                self.rerank();
            }
        }
        Ok(())
    }

    /// Move a defense team to `rank` (1-based), shifting the others.
    pub fn move_defense(&mut self, team: u32, rank: u32) -> Result<(), ListError> {
        let len = self.defense.len();
        if rank == 0 || rank as usize > len {
            return Err(ListError::RankOutOfRange { rank, len });
        }
        let from = self
            .defense
            .iter()
            .position(|e| e.team == team)
            .ok_or(ListError::NotListed {
                team,
                list: ListKind::Defense,
            })?;

        let entry = self.defense.remove(from);
        self.defense.insert(rank as usize - 1, entry);
        self.rerank();
        Ok(())
    }

    /// Replace a whole list, dropping duplicates and team 0.
    pub fn set(&mut self, kind: ListKind, teams: Vec<u32>) {
        let mut unique: Vec<u32> = Vec::with_capacity(teams.len());
        for team in teams {
            if team != 0 && !unique.contains(&team) {
                unique.push(team);
            }
        }
        match self.flat_mut(kind) {
            Some(list) => *list = unique,
            None => {
                self.defense = unique
                    .into_iter()
                    .map(|team| DefenseEntry { team, rank: 0 })
                    .collect();
                self.rerank();
            }
        }
    }

    fn rerank(&mut self) {
        for (i, entry) in self.defense.iter_mut().enumerate() {
            entry.rank = i as u32 + 1;
        }
    }

    /// Replace a list from an exported JSON array. Returns the number of
    /// teams imported. Entries without a usable team number are dropped.
    pub fn import(&mut self, kind: ListKind, raw: &Value) -> Result<usize, ListError> {
        let teams = match kind {
            ListKind::Defense => parse_defense_list(raw)?
                .into_iter()
                .map(|e| e.team)
                .collect::<Vec<_>>(),
            _ => raw
                .as_array()
                .ok_or(ListError::NotAnArray)?
                .iter()
                .filter_map(team_number)
                .collect(),
        };
        if teams.is_empty() {
            return Err(ListError::EmptyImport);
        }
        self.set(kind, teams);
        Ok(self.len(kind))
    }

    pub fn export(&self, kind: ListKind) -> Value {
        match kind {
            ListKind::Defense => serde_json::to_value(&self.defense).unwrap_or(Value::Null),
            _ => Value::from(self.teams(kind)),
        }
    }
}

/// Team number from a JSON number or numeric string.
pub fn team_number(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    u32::try_from(n).ok().filter(|n| *n > 0)
}

/// Parse a defense list in either shape the backend has stored: a flat
/// array of team numbers (ranked by position) or `{team, rank}` objects.
/// The result is sorted by rank and renumbered 1..=n.
pub fn parse_defense_list(raw: &Value) -> Result<Vec<DefenseEntry>, ListError> {
    let items = raw.as_array().ok_or(ListError::NotAnArray)?;

    let mut entries: Vec<(u32, u32)> = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let fallback_rank = i as u32 + 1;
        let parsed = match item {
            Value::Object(obj) => obj.get("team").and_then(team_number).map(|team| {
                let rank = obj
                    .get("rank")
                    .and_then(Value::as_u64)
                    .and_then(|r| u32::try_from(r).ok())
                    .filter(|r| *r > 0)
                    .unwrap_or(fallback_rank);
                (team, rank)
            }),
            other => team_number(other).map(|team| (team, fallback_rank)),
        };
        if let Some(pair) = parsed {
            if !entries.iter().any(|(team, _)| *team == pair.0) {
                entries.push(pair);
            }
        }
    }

    entries.sort_by_key(|(_, rank)| *rank);
    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, (team, _))| DefenseEntry {
            team,
            rank: i as u32 + 1,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_rejects_duplicates_and_zero() {
        let mut lists = PickLists::new();
        lists.add(ListKind::DoNotPick, 254).unwrap();
        assert_eq!(
            lists.add(ListKind::DoNotPick, 254),
            Err(ListError::AlreadyListed {
                team: 254,
                list: ListKind::DoNotPick
            })
        );
        assert_eq!(lists.add(ListKind::Avoid, 0), Err(ListError::InvalidTeam(0)));
        assert!(lists.contains(ListKind::DoNotPick, 254));
        assert!(!lists.contains(ListKind::Avoid, 254));
    }

    #[test]
    fn test_defense_add_remove_reranks() {
        let mut lists = PickLists::new();
        for team in [111, 222, 333] {
            lists.add(ListKind::Defense, team).unwrap();
        }
        assert_eq!(lists.defense_rank(333), Some(3));

        lists.remove(ListKind::Defense, 111).unwrap();
        assert_eq!(lists.defense_rank(222), Some(1));
        assert_eq!(lists.defense_rank(333), Some(2));
        assert_eq!(lists.defense_rank(111), None);
    }

    #[test]
    fn test_move_defense() {
        let mut lists = PickLists::new();
        lists.set(ListKind::Defense, vec![1, 2, 3, 4]);
        lists.move_defense(4, 1).unwrap();
        assert_eq!(lists.teams(ListKind::Defense), vec![4, 1, 2, 3]);
        assert_eq!(lists.defense_rank(3), Some(4));

        assert_eq!(
            lists.move_defense(4, 9),
            Err(ListError::RankOutOfRange { rank: 9, len: 4 })
        );
        assert!(matches!(lists.move_defense(42, 1), Err(ListError::NotListed { .. })));
    }

    #[test]
    fn test_remove_missing_team() {
        let mut lists = PickLists::new();
        assert!(matches!(
            lists.remove(ListKind::Avoid, 5),
            Err(ListError::NotListed { .. })
        ));
    }

    #[test]
    fn test_import_flat_list_drops_junk() {
        let mut lists = PickLists::new();
        let count = lists
            .import(ListKind::Avoid, &json!([254, "1678", "abc", null, 254]))
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(lists.teams(ListKind::Avoid), vec![254, 1678]);
    }

    #[test]
    fn test_import_rejects_empty_and_non_array() {
        let mut lists = PickLists::new();
        assert_eq!(lists.import(ListKind::DoNotPick, &json!(["x"])), Err(ListError::EmptyImport));
        assert_eq!(lists.import(ListKind::DoNotPick, &json!({"teams": []})), Err(ListError::NotAnArray));
    }

    #[test]
    fn test_parse_legacy_defense_list() {
        let entries = parse_defense_list(&json!([971, 254])).unwrap();
        assert_eq!(
            entries,
            vec![
                DefenseEntry { team: 971, rank: 1 },
                DefenseEntry { team: 254, rank: 2 }
            ]
        );
    }

    #[test]
    fn test_parse_ranked_defense_list_sorts_and_renumbers() {
        let raw = json!([{"team": 1, "rank": 5}, {"team": "2", "rank": 2}, {"team": 3}]);
        let entries = parse_defense_list(&raw).unwrap();
        let order: Vec<(u32, u32)> = entries.iter().map(|e| (e.team, e.rank)).collect();
        assert_eq!(order, vec![(2, 1), (3, 2), (1, 3)]);
    }

    #[test]
    fn test_export_roundtrips_through_import() {
        let mut lists = PickLists::new();
        lists.set(ListKind::Defense, vec![10, 20]);
        let exported = lists.export(ListKind::Defense);
        assert_eq!(exported, json!([{"team": 10, "rank": 1}, {"team": 20, "rank": 2}]));

        let mut other = PickLists::new();
        other.import(ListKind::Defense, &exported).unwrap();
        assert_eq!(other, lists);
    }

    #[test]
    fn test_list_kind_from_str() {
        assert_eq!("do-not-pick".parse::<ListKind>(), Ok(ListKind::DoNotPick));
        assert_eq!("DNP".parse::<ListKind>(), Ok(ListKind::DoNotPick));
        assert!("favorites".parse::<ListKind>().is_err());
    }
}
