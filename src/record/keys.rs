//! Canonical metric names as they appear in scouting sheets.

pub const TEAM_NUMBER: &str = "Team Number";
pub const MATCH_NUMBER: &str = "Match Number";
pub const SCOUTER_NAME: &str = "Scouter Name";

pub const LEAVE_BONUS: &str = "Leave Bonus (T/F)";

pub const AUTO_CORAL_L1: &str = "Auto Coral L1 (#)";
pub const AUTO_CORAL_L2_L3: &str = "Auto Coral L2/L3 (#)";
pub const AUTO_CORAL_L4: &str = "Auto Coral L4 (#)";
pub const AUTO_CORAL_UNCLEAR: &str = "Auto Coral Unclear (#)";
pub const AUTO_ALGAE_NET: &str = "Auto Algae Net (#)";
pub const AUTO_ALGAE_PROCESSOR: &str = "Auto Algae Processor (#)";

pub const CORAL_L1: &str = "Coral L1 (#)";
pub const CORAL_L2_L3: &str = "Coral L2/L3 (#)";
pub const CORAL_L4: &str = "Coral L4 (#)";
pub const CORAL_UNCLEAR: &str = "Coral Unclear (#)";
pub const ALGAE_NET: &str = "Algae Net (#)";
pub const ALGAE_PROCESSOR: &str = "Algae Processor (#)";

pub const ENDGAME_BARGE: &str = "Endgame Barge";
pub const DEFENSE_PERFORMED: &str = "Defense Performed";
pub const MINOR_FOULS: &str = "Minor Fouls";
pub const MAJOR_FOULS: &str = "Major Fouls";

/// Keys whose points count toward the total but neither auto nor teleop.
pub const FOUL_KEYS: [&str; 2] = [MINOR_FOULS, MAJOR_FOULS];

pub fn is_foul(key: &str) -> bool {
    FOUL_KEYS.contains(&key)
}
