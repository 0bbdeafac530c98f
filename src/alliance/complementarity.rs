use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::ranking::RankingInfo;
use crate::record::{keys, TeamRecord};
use crate::scoring::{CategoryTotals, ClimbLevel, Specialization};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Offense,
    Defense,
    Balanced,
}

impl Preference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preference::Offense => "offense",
            Preference::Defense => "defense",
            Preference::Balanced => "balanced",
        }
    }

    pub fn weights(&self) -> Weights {
        match self {
            Preference::Offense => Weights {
                climb: 1.2,
                auto: 1.0,
                scoring: 1.5,
                defense: 0.5,
            },
            Preference::Defense => Weights {
                climb: 0.8,
                auto: 0.8,
                scoring: 0.7,
                defense: 2.0,
            },
            Preference::Balanced => Weights {
                climb: 1.0,
                auto: 1.0,
                scoring: 1.0,
                defense: 1.0,
            },
        }
    }
}

impl fmt::Display for Preference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offense" | "offence" => Ok(Preference::Offense),
            "defense" | "defence" => Ok(Preference::Defense),
            "balanced" => Ok(Preference::Balanced),
            other => Err(format!(
                "unknown preference '{}' (expected offense, defense or balanced)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub climb: f64,
    pub auto: f64,
    pub scoring: f64,
    pub defense: f64,
}

/// Unweighted complementarity bonuses between two teams.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Factors {
    pub climb: f64,
    pub auto: f64,
    pub scoring: f64,
    pub defense: f64,
}

impl Factors {
    pub fn between(mine: &TeamRecord, candidate: &TeamRecord) -> Self {
        let mut factors = Factors::default();

        if ClimbLevel::from_record(mine) < ClimbLevel::Shallow
            && ClimbLevel::from_record(candidate) >= ClimbLevel::Shallow
        {
            factors.climb += 20.0;
        }

        if reliable_leave(mine) != reliable_leave(candidate) {
            factors.auto += 10.0;
        }

        let my_shares = CategoryTotals::from_record(mine).shares();
        let their_shares = CategoryTotals::from_record(candidate).shares();
        if let (Some(my_shares), Some(their_shares)) = (my_shares, their_shares) {
            let fills_gap = my_shares
                .iter()
                .zip(their_shares.iter())
                .any(|((_, my_pct), (_, their_pct))| *my_pct < 25.0 && *their_pct > 40.0);
            if fills_gap {
                factors.scoring += 25.0;
            }
        }

        factors.scoring += role_coverage_bonus(
            &Specialization::detect(mine),
            &Specialization::detect(candidate),
        );

        if plays_defense(candidate) {
            factors.defense += 15.0;
        }

        factors
    }

    pub fn weighted(&self, weights: &Weights) -> f64 {
        self.climb * weights.climb
            + self.auto * weights.auto
            + self.scoring * weights.scoring
            + self.defense * weights.defense
    }
}

/// 15 points per role the pair covers beyond what the broader of the two covers alone.
fn role_coverage_bonus(mine: &BTreeSet<Specialization>, theirs: &BTreeSet<Specialization>) -> f64 {
    let union = mine.union(theirs).count();
    let widest = mine.len().max(theirs.len());
    if union > widest {
        15.0 * (union - widest) as f64
    } else {
        0.0
    }
}

fn reliable_leave(record: &TeamRecord) -> bool {
    record.rate_or_zero(keys::LEAVE_BONUS) > 0.5
}

fn plays_defense(record: &TeamRecord) -> bool {
    record.rate_or_zero(keys::DEFENSE_PERFORMED) > 0.6
}

/// How well `candidate` rounds out `mine`: ranking points plus weighted bonuses.
pub fn score(
    mine: &TeamRecord,
    candidate: &TeamRecord,
    preference: Preference,
    ranking: &RankingInfo,
) -> f64 {
    ranking.points + Factors::between(mine, candidate).weighted(&preference.weights())
}

/// Human-readable notes on a candidate, one sentence each.
pub fn details(mine: &TeamRecord, candidate: &TeamRecord, ranking: &RankingInfo) -> Vec<String> {
    let mut notes = Vec::new();

    if *ranking != RankingInfo::UNRANKED {
        notes.push(format!("Ranked #{} overall.", ranking.rank));
    }
    if ranking.points > 0.0 {
        notes.push(format!(
            "Averages {:.1} points per match.",
            ranking.average_points()
        ));
    }

    let my_climb = ClimbLevel::from_record(mine);
    let their_climb = ClimbLevel::from_record(candidate);
    if their_climb >= ClimbLevel::Shallow && my_climb < ClimbLevel::Shallow {
        notes.push("Strong climber that complements your team's climbing capabilities.".to_string());
    } else if their_climb == my_climb && their_climb >= ClimbLevel::Shallow {
        notes.push("Good climber, similar to your team.".to_string());
    }

    let net = candidate.sum_of(&[keys::ALGAE_NET, keys::AUTO_ALGAE_NET]);
    let processor = candidate.sum_of(&[keys::ALGAE_PROCESSOR, keys::AUTO_ALGAE_PROCESSOR]);
    let teleop_coral = candidate.sum_of(&[keys::CORAL_L1, keys::CORAL_L2_L3, keys::CORAL_L4]);
    let mut strengths = Vec::new();
    if net > 2.5 {
        strengths.push("algae net");
    }
    if processor > 2.0 {
        strengths.push("algae processor");
    }
    if teleop_coral > 3.0 {
        strengths.push("coral collection");
    }
    if !strengths.is_empty() {
        notes.push(format!("Excels at {}.", strengths.join(" and ")));
    }

    if plays_defense(candidate) {
        notes.push("Plays effective defense.".to_string());
    }
    if reliable_leave(candidate) {
        notes.push("Consistent auto routine.".to_string());
    }

    let roles = Specialization::detect(candidate);
    if !roles.contains(&Specialization::Any) {
        let labels: Vec<&str> = roles.iter().map(|r| r.label()).collect();
        if labels.len() == 1 {
            notes.push(format!("{} robot.", labels[0]));
        } else {
            notes.push(format!("Multi-role robot: {}.", labels.join(" and ")));
        }
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranking(points: f64) -> RankingInfo {
        RankingInfo {
            rank: 3,
            points,
            match_count: 4,
        }
    }

    #[test]
    fn test_identical_teams_score_base_only() {
        let team = TeamRecord::new()
            .with(keys::CORAL_L4, 4.0)
            .with(keys::ENDGAME_BARGE, 3.0)
            .with(keys::LEAVE_BONUS, 1.0);
        let factors = Factors::between(&team, &team);
        assert_eq!(factors, Factors::default());
        assert_eq!(score(&team, &team, Preference::Balanced, &ranking(40.0)), 40.0);
    }

    #[test]
    fn test_climb_fills_gap() {
        let mine = TeamRecord::new().with(keys::ENDGAME_BARGE, 1.0);
        let theirs = TeamRecord::new().with(keys::ENDGAME_BARGE, 2.0);
        assert_eq!(Factors::between(&mine, &theirs).climb, 20.0);
        assert_eq!(Factors::between(&theirs, &mine).climb, 0.0);
    }

    #[test]
    fn test_auto_diversity_uses_strict_threshold() {
        let mine = TeamRecord::new().with(keys::LEAVE_BONUS, 0.5);
        let theirs = TeamRecord::new().with(keys::LEAVE_BONUS, 0.9);
        assert_eq!(Factors::between(&mine, &theirs).auto, 10.0);

        let theirs = TeamRecord::new().with(keys::LEAVE_BONUS, false);
        assert_eq!(Factors::between(&mine, &theirs).auto, 0.0);
    }

    #[test]
    fn test_scoring_gap_and_role_coverage() {
        let mine = TeamRecord::new().with(keys::CORAL_L4, 6.0);
        let theirs = TeamRecord::new().with(keys::ALGAE_NET, 4.0);
        let factors = Factors::between(&mine, &theirs);
        // gap fill (25) plus one extra role covered (15)
        assert_eq!(factors.scoring, 40.0);
    }

    #[test]
    fn test_scoring_gap_needs_both_totals() {
        let mine = TeamRecord::new();
        let theirs = TeamRecord::new().with(keys::ALGAE_NET, 4.0);
        // {any} and {algae_net} union to two roles
        assert_eq!(Factors::between(&mine, &theirs).scoring, 15.0);
    }

    #[test]
    fn test_defense_factor() {
        let mine = TeamRecord::new();
        let theirs = TeamRecord::new().with(keys::DEFENSE_PERFORMED, 0.7);
        assert_eq!(Factors::between(&mine, &theirs).defense, 15.0);

        let theirs = TeamRecord::new().with(keys::DEFENSE_PERFORMED, 0.6);
        assert_eq!(Factors::between(&mine, &theirs).defense, 0.0);
    }

    #[test]
    fn test_preference_weights() {
        let factors = Factors {
            climb: 20.0,
            auto: 10.0,
            scoring: 25.0,
            defense: 15.0,
        };
        assert_eq!(factors.weighted(&Preference::Offense.weights()), 24.0 + 10.0 + 37.5 + 7.5);
        assert_eq!(factors.weighted(&Preference::Defense.weights()), 16.0 + 8.0 + 17.5 + 30.0);
        assert_eq!(factors.weighted(&Preference::Balanced.weights()), 70.0);
    }

    #[test]
    fn test_preference_from_str() {
        assert_eq!("Defense".parse::<Preference>(), Ok(Preference::Defense));
        assert_eq!("balanced".parse::<Preference>(), Ok(Preference::Balanced));
        assert!("chaos".parse::<Preference>().is_err());
    }

    #[test]
    fn test_details_mentions_strengths() {
        let mine = TeamRecord::new().with(keys::ENDGAME_BARGE, 0.0);
        let theirs = TeamRecord::new()
            .with(keys::ENDGAME_BARGE, 3.0)
            .with(keys::ALGAE_NET, 3.0)
            .with(keys::DEFENSE_PERFORMED, 0.8)
            .with(keys::LEAVE_BONUS, 1.0);

        let notes = details(&mine, &theirs, &ranking(48.0));
        assert_eq!(notes[0], "Ranked #3 overall.");
        assert_eq!(notes[1], "Averages 12.0 points per match.");
        assert!(notes.iter().any(|n| n.contains("Strong climber")));
        assert!(notes.iter().any(|n| n == "Excels at algae net."));
        assert!(notes.iter().any(|n| n == "Plays effective defense."));
        assert!(notes.iter().any(|n| n == "Algae Net robot."));
    }
}
