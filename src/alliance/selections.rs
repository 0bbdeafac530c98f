use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use super::lists::team_number;

pub const ALLIANCE_COUNT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Position {
    Captain = 1,
    FirstPick = 2,
    SecondPick = 3,
    Backup = 4,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Captain,
        Position::FirstPick,
        Position::SecondPick,
        Position::Backup,
    ];

    pub fn number(&self) -> u8 {
        *self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.number() == n)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::Captain => "Captain",
            Position::FirstPick => "First Pick",
            Position::SecondPick => "Second Pick",
            Position::Backup => "Backup",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "1" | "captain" => Ok(Position::Captain),
            "2" | "first" | "firstpick" => Ok(Position::FirstPick),
            "3" | "second" | "secondpick" => Ok(Position::SecondPick),
            "4" | "backup" => Ok(Position::Backup),
            _ => Err(format!(
                "unknown position '{}' (expected captain, first, second, backup or 1-4)",
                s
            )),
        }
    }
}

/// One slot on the alliance board. Wire form is `"<alliance>-<position>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    pub alliance: u8,
    pub position: Position,
}

impl SlotKey {
    pub fn new(alliance: u8, position: Position) -> Result<Self, SelectionError> {
        if alliance == 0 || alliance > ALLIANCE_COUNT {
            return Err(SelectionError::InvalidAlliance(alliance));
        }
        Ok(Self { alliance, position })
    }

    pub fn parse(key: &str) -> Option<Self> {
        let (alliance, position) = key.split_once('-')?;
        let alliance: u8 = alliance.trim().parse().ok()?;
        let position = Position::from_number(position.trim().parse().ok()?)?;
        Self::new(alliance, position).ok()
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.alliance, self.position.number())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("alliance {0} does not exist (expected 1-{max})", max = ALLIANCE_COUNT)]
    InvalidAlliance(u8),

    #[error("Team {team} is already selected for alliance {slot}")]
    AlreadySelected { team: u32, slot: SlotKey },

    #[error("slot {0} is empty")]
    EmptySlot(SlotKey),
}

/// Slot -> team assignments for the whole event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllianceSelections {
    slots: BTreeMap<SlotKey, u32>,
}

impl AllianceSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the backend's selection object, skipping malformed keys and teams.
    pub fn from_json(raw: &Value) -> Self {
        let mut slots = BTreeMap::new();
        if let Some(object) = raw.as_object() {
            for (key, value) in object {
                match (SlotKey::parse(key), team_number(value)) {
                    (Some(slot), Some(team)) => {
                        slots.insert(slot, team);
                    }
                    _ => debug!("Ignoring selection entry {}={}", key, value),
                }
            }
        }
        Self { slots }
    }

    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .slots
            .iter()
            .map(|(slot, team)| (slot.to_string(), Value::from(*team)))
            .collect();
        Value::Object(object)
    }

    pub fn get(&self, slot: SlotKey) -> Option<u32> {
        self.slots.get(&slot).copied()
    }

    /// Put a team in a slot, returning the team it displaced.
    pub fn assign(&mut self, slot: SlotKey, team: u32) -> Result<Option<u32>, SelectionError> {
        if let Some(existing) = self.slot_of(team) {
            if existing != slot {
                return Err(SelectionError::AlreadySelected {
                    team,
                    slot: existing,
                });
            }
        }
        Ok(self.slots.insert(slot, team))
    }

    pub fn clear(&mut self, slot: SlotKey) -> Result<u32, SelectionError> {
        self.slots.remove(&slot).ok_or(SelectionError::EmptySlot(slot))
    }

    pub fn slot_of(&self, team: u32) -> Option<SlotKey> {
        self.slots
            .iter()
            .find(|(_, t)| **t == team)
            .map(|(slot, _)| *slot)
    }

    pub fn is_selected(&self, team: u32) -> bool {
        self.slot_of(team).is_some()
    }

    pub fn selected_teams(&self) -> BTreeSet<u32> {
        self.slots.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &u32)> {
        self.slots.iter()
    }

    pub fn alliance(&self, alliance: u8) -> Vec<(Position, u32)> {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.alliance == alliance)
            .map(|(slot, team)| (slot.position, *team))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Selections as last reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSelections {
    pub selections: AllianceSelections,
    /// Backend modification time, seconds since the epoch. 0 means never saved.
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Updated,
    Reset,
}

/// Local view of the alliance board plus sync bookkeeping.
///
/// `revision` increases on every local edit and every accepted remote
/// update. `timestamp` is the newest backend timestamp observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub selections: AllianceSelections,
    pub timestamp: f64,
    pub revision: u64,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a polled remote state into the local one. Older or same-age
    /// remote states are ignored.
    pub fn apply_remote(&mut self, remote: RemoteSelections) -> SyncOutcome {
        if remote.timestamp <= self.timestamp {
            return SyncOutcome::Unchanged;
        }
        self.timestamp = remote.timestamp;

        if remote.selections == self.selections {
            return SyncOutcome::Unchanged;
        }

        self.revision += 1;
        if remote.selections.is_empty() {
            self.selections = AllianceSelections::new();
            SyncOutcome::Reset
        } else {
            self.selections = remote.selections;
            SyncOutcome::Updated
        }
    }

    pub fn assign(&mut self, slot: SlotKey, team: u32) -> Result<Option<u32>, SelectionError> {
        let displaced = self.selections.assign(slot, team)?;
        self.revision += 1;
        Ok(displaced)
    }

    pub fn clear(&mut self, slot: SlotKey) -> Result<u32, SelectionError> {
        let team = self.selections.clear(slot)?;
        self.revision += 1;
        Ok(team)
    }

    pub fn reset(&mut self) {
        self.selections = AllianceSelections::new();
        self.revision += 1;
    }

    /// Record the timestamp the backend assigned to our own save.
    pub fn mark_saved(&mut self, timestamp: f64) {
        if timestamp > self.timestamp {
            self.timestamp = timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slot(alliance: u8, position: Position) -> SlotKey {
        SlotKey::new(alliance, position).unwrap()
    }

    fn remote(raw: Value, timestamp: f64) -> RemoteSelections {
        RemoteSelections {
            selections: AllianceSelections::from_json(&raw),
            timestamp,
        }
    }

    #[test]
    fn test_slot_key_parse_and_display() {
        let key = SlotKey::parse("3-2").unwrap();
        assert_eq!(key, slot(3, Position::FirstPick));
        assert_eq!(key.to_string(), "3-2");
        assert!(SlotKey::parse("9-1").is_none());
        assert!(SlotKey::parse("1-5").is_none());
        assert!(SlotKey::parse("captain").is_none());
    }

    #[test]
    fn test_from_json_skips_bad_entries() {
        let selections =
            AllianceSelections::from_json(&json!({"1-1": 254, "1-2": "1678", "x": 5, "2-1": "none"}));
        assert_eq!(selections.len(), 2);
        assert_eq!(selections.get(slot(1, Position::FirstPick)), Some(1678));
        assert_eq!(selections.to_json(), json!({"1-1": 254, "1-2": 1678}));
    }

    #[test]
    fn test_assign_rejects_team_in_other_slot() {
        let mut selections = AllianceSelections::new();
        selections.assign(slot(1, Position::Captain), 254).unwrap();
        let err = selections.assign(slot(2, Position::Captain), 254).unwrap_err();
        assert_eq!(
            err,
            SelectionError::AlreadySelected {
                team: 254,
                slot: slot(1, Position::Captain)
            }
        );
        assert_eq!(selections.assign(slot(1, Position::Captain), 971), Ok(Some(254)));
    }

    #[test]
    fn test_apply_remote_ignores_stale() {
        let mut state = SelectionState::new();
        state.timestamp = 100.0;
        assert_eq!(state.apply_remote(remote(json!({"1-1": 254}), 100.0)), SyncOutcome::Unchanged);
        assert_eq!(state.apply_remote(remote(json!({"1-1": 254}), 50.0)), SyncOutcome::Unchanged);
        assert!(state.selections.is_empty());
        assert_eq!(state.revision, 0);
    }

    #[test]
    fn test_apply_remote_update_then_reset() {
        let mut state = SelectionState::new();
        assert_eq!(state.apply_remote(remote(json!({"1-1": 254}), 10.0)), SyncOutcome::Updated);
        assert_eq!(state.revision, 1);
        assert!(state.selections.is_selected(254));

        assert_eq!(state.apply_remote(remote(json!({}), 20.0)), SyncOutcome::Reset);
        assert_eq!(state.revision, 2);
        assert!(state.selections.is_empty());
        assert_eq!(state.timestamp, 20.0);
    }

    #[test]
    fn test_apply_remote_same_content_advances_timestamp_only() {
        let mut state = SelectionState::new();
        state.assign(slot(1, Position::Captain), 254).unwrap();
        let before = state.revision;

        assert_eq!(state.apply_remote(remote(json!({"1-1": 254}), 30.0)), SyncOutcome::Unchanged);
        assert_eq!(state.timestamp, 30.0);
        assert_eq!(state.revision, before);
    }

    #[test]
    fn test_position_from_str() {
        assert_eq!("first pick".parse::<Position>(), Ok(Position::FirstPick));
        assert_eq!("4".parse::<Position>(), Ok(Position::Backup));
        assert!("coach".parse::<Position>().is_err());
    }
}
