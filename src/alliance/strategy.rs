use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::charts::ClimbDistribution;
use crate::record::{keys, TeamRecord};
use crate::scoring::{compute_score, ClimbLevel, ScoreBreakdown, ScoringRules, Specialization};

/// Projected margin under which a match is called close.
pub const CLOSE_MATCH_MARGIN: f64 = 10.0;

/// Phase point gap worth calling out as an advantage.
pub const PHASE_EDGE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllianceColor {
    Red,
    Blue,
}

impl AllianceColor {
    pub fn label(&self) -> &'static str {
        match self {
            AllianceColor::Red => "Red",
            AllianceColor::Blue => "Blue",
        }
    }
}

impl fmt::Display for AllianceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamProjection {
    pub team: u32,
    pub score: ScoreBreakdown,
    pub climb: ClimbLevel,
    pub leave: bool,
    pub specialization: BTreeSet<Specialization>,
}

impl TeamProjection {
    pub fn from_record(team: u32, record: &TeamRecord, rules: &ScoringRules) -> Self {
        Self {
            team,
            score: compute_score(record, rules),
            climb: ClimbLevel::from_record(record),
            leave: record.rate_or_zero(keys::LEAVE_BONUS) > 0.5,
            specialization: Specialization::detect(record),
        }
    }
}

/// One alliance's expected output from its teams' averages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllianceProjection {
    /// Highest projected total first.
    pub teams: Vec<TeamProjection>,
    /// Requested teams without averages. Totals leave them out.
    pub missing: Vec<u32>,
    pub auto: f64,
    pub teleop: f64,
    pub total: f64,
    pub climbs: ClimbDistribution,
    pub leave_count: usize,
    /// Per-team mean of teleop algae.
    pub algae_net_avg: f64,
    pub algae_processor_avg: f64,
}

impl AllianceProjection {
    pub fn build(teams: &[u32], records: &BTreeMap<u32, TeamRecord>, rules: &ScoringRules) -> Self {
        let mut projection = Self::default();
        let mut algae_net = 0.0;
        let mut algae_processor = 0.0;

        for &team in teams {
            let Some(record) = records.get(&team) else {
                projection.missing.push(team);
                continue;
            };
            let team_projection = TeamProjection::from_record(team, record, rules);

            projection.auto += team_projection.score.auto;
            projection.teleop += team_projection.score.teleop;
            projection.total += team_projection.score.total;
            projection.climbs.record(team_projection.climb);
            if team_projection.leave {
                projection.leave_count += 1;
            }
            algae_net += record.number_or_zero(keys::ALGAE_NET);
            algae_processor += record.number_or_zero(keys::ALGAE_PROCESSOR);
            projection.teams.push(team_projection);
        }

        if !projection.teams.is_empty() {
            let n = projection.teams.len() as f64;
            projection.algae_net_avg = algae_net / n;
            projection.algae_processor_avg = algae_processor / n;
        }
        projection
            .teams
            .sort_by(|a, b| b.score.total.total_cmp(&a.score.total));
        projection
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    fn coral_specialists(&self) -> Vec<u32> {
        self.teams
            .iter()
            .filter(|t| t.specialization.contains(&Specialization::Coral))
            .map(|t| t.team)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    Close { margin: f64 },
    Favored { alliance: AllianceColor, margin: f64 },
}

pub fn predict(red: &AllianceProjection, blue: &AllianceProjection) -> Prediction {
    let margin = (red.total - blue.total).abs();
    if margin < CLOSE_MATCH_MARGIN {
        Prediction::Close { margin }
    } else if red.total > blue.total {
        Prediction::Favored {
            alliance: AllianceColor::Red,
            margin,
        }
    } else {
        Prediction::Favored {
            alliance: AllianceColor::Blue,
            margin,
        }
    }
}

/// Notes for one alliance, measured against its opponent.
#[derive(Debug, Clone, PartialEq)]
pub struct AllianceAdvice {
    pub alliance: AllianceColor,
    /// Projected points ahead of the opponent; negative when behind.
    pub lead: f64,
    pub endgame: Vec<String>,
    pub auto: Vec<String>,
    pub teleop: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub red: AllianceProjection,
    pub blue: AllianceProjection,
    /// None unless both alliances have at least one projected team.
    pub prediction: Option<Prediction>,
    pub advice: Vec<AllianceAdvice>,
}

pub fn analyze(red: AllianceProjection, blue: AllianceProjection) -> StrategyReport {
    let (prediction, advice) = if red.teams.is_empty() || blue.teams.is_empty() {
        (None, Vec::new())
    } else {
        (
            Some(predict(&red, &blue)),
            vec![
                advise(AllianceColor::Red, &red, &blue),
                advise(AllianceColor::Blue, &blue, &red),
            ],
        )
    };
    StrategyReport {
        red,
        blue,
        prediction,
        advice,
    }
}

fn robots(n: usize) -> &'static str {
    if n == 1 {
        "robot"
    } else {
        "robots"
    }
}

fn phase_note(phase: &str, diff: f64) -> Option<String> {
    if diff > PHASE_EDGE {
        Some(format!("{} advantage: +{:.0} points over opponent", phase, diff))
    } else if diff < -PHASE_EDGE {
        Some(format!("{} disadvantage: {:.0} points below opponent", phase, diff.abs()))
    } else {
        None
    }
}

fn advise(color: AllianceColor, mine: &AllianceProjection, theirs: &AllianceProjection) -> AllianceAdvice {
    let team_count = mine.teams.len();

    let mut endgame = Vec::new();
    if mine.climbs.deep > 0 {
        endgame.push(format!(
            "Strength: {} deep climb {}",
            mine.climbs.deep,
            robots(mine.climbs.deep)
        ));
    } else if mine.climbs.shallow > 0 {
        endgame.push(format!(
            "Strength: {} shallow climb {}",
            mine.climbs.shallow,
            robots(mine.climbs.shallow)
        ));
    } else {
        endgame.push("Some teams should focus on climbing while others maximize scoring".to_string());
    }
    if theirs.climbs.deep > mine.climbs.deep {
        endgame.push(format!(
            "Opponent has {} deep climb {}; build a lead before the endgame",
            theirs.climbs.deep,
            robots(theirs.climbs.deep)
        ));
    }

    let mut auto = Vec::new();
    if mine.leave_count == team_count {
        auto.push("Strength: all teams likely to get the leave bonus".to_string());
    } else if mine.leave_count == 0 {
        auto.push("Weakness: no team consistently gets the leave bonus".to_string());
    } else {
        auto.push(format!(
            "{}/{} teams likely to get the leave bonus",
            mine.leave_count, team_count
        ));
    }
    auto.extend(phase_note("Auto", mine.auto - theirs.auto));

    let mut teleop = Vec::new();
    teleop.extend(phase_note("Teleop", mine.teleop - theirs.teleop));
    if mine.algae_net_avg > 1.5 && mine.algae_processor_avg > 1.5 {
        teleop.push("Versatile scoring: good at both algae net and processor".to_string());
    } else if mine.algae_net_avg > 2.0 {
        teleop.push("Net focused: strong at algae net scoring".to_string());
    } else if mine.algae_processor_avg > 2.0 {
        teleop.push("Processor focused: strong at algae processor scoring".to_string());
    }

    let coral = mine.coral_specialists();
    if !coral.is_empty() {
        let teams = coral
            .iter()
            .map(|t| format!("Team {}", t))
            .collect::<Vec<_>>()
            .join(", ");
        teleop.push(format!("Coral focused: {} carry the reef", teams));
    } else {
        let opposing = theirs.coral_specialists().len();
        if opposing > 0 {
            teleop.push(format!(
                "No coral specialist; opponent has {}, contest the reef",
                opposing
            ));
        }
    }

    AllianceAdvice {
        alliance: color,
        lead: mine.total - theirs.total,
        endgame,
        auto,
        teleop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::RuleValue;

    fn rules() -> ScoringRules {
        ScoringRules::new()
            .with(keys::LEAVE_BONUS, RuleValue::Flat(3.0))
            .with(keys::AUTO_CORAL_L1, RuleValue::Flat(3.0))
            .with(keys::CORAL_L4, RuleValue::Flat(5.0))
            .with(keys::ALGAE_NET, RuleValue::Flat(4.0))
            .with(keys::ENDGAME_BARGE, RuleValue::tiered([(0, 0.0), (1, 2.0), (2, 6.0), (3, 12.0)]))
    }

    fn records() -> BTreeMap<u32, TeamRecord> {
        let mut map = BTreeMap::new();
        // auto 3 + 6 = 9, teleop 20 + 12 = 32, total 41
        map.insert(
            254,
            TeamRecord::for_team(254)
                .with(keys::LEAVE_BONUS, 1.0)
                .with(keys::AUTO_CORAL_L1, 2.0)
                .with(keys::CORAL_L4, 4.0)
                .with(keys::ENDGAME_BARGE, 3.0),
        );
        // auto 0, teleop 8 + 6 = 14, total 14
        map.insert(
            1678,
            TeamRecord::for_team(1678)
                .with(keys::ALGAE_NET, 2.0)
                .with(keys::ENDGAME_BARGE, 2.0),
        );
        // auto 3, teleop 10, total 13
        map.insert(
            971,
            TeamRecord::for_team(971)
                .with(keys::LEAVE_BONUS, 1.0)
                .with(keys::CORAL_L4, 2.0),
        );
        // auto 0, teleop 12, total 12
        map.insert(
            118,
            TeamRecord::for_team(118).with(keys::ALGAE_NET, 3.0),
        );
        map
    }

    #[test]
    fn test_projection_sums_and_sorts() {
        let alliance = AllianceProjection::build(&[1678, 254], &records(), &rules());
        assert_eq!(alliance.auto, 9.0);
        assert_eq!(alliance.teleop, 46.0);
        assert_eq!(alliance.total, 55.0);
        assert_eq!(alliance.teams[0].team, 254);
        assert_eq!(alliance.climbs.deep, 1);
        assert_eq!(alliance.climbs.shallow, 1);
        assert_eq!(alliance.leave_count, 1);
        assert_eq!(alliance.algae_net_avg, 1.0);
        assert!(alliance.is_complete());
    }

    #[test]
    fn test_missing_team_left_out_of_totals() {
        let alliance = AllianceProjection::build(&[971, 9999], &records(), &rules());
        assert_eq!(alliance.total, 13.0);
        assert_eq!(alliance.missing, vec![9999]);
        assert!(!alliance.is_complete());
    }

    #[test]
    fn test_close_match() {
        let records = records();
        let red = AllianceProjection::build(&[971], &records, &rules());
        let blue = AllianceProjection::build(&[118], &records, &rules());
        assert_eq!(predict(&red, &blue), Prediction::Close { margin: 1.0 });
    }

    #[test]
    fn test_favored_alliance() {
        let records = records();
        let red = AllianceProjection::build(&[971, 118], &records, &rules());
        let blue = AllianceProjection::build(&[254, 1678], &records, &rules());

        let report = analyze(red, blue);
        assert_eq!(
            report.prediction,
            Some(Prediction::Favored {
                alliance: AllianceColor::Blue,
                margin: 30.0
            })
        );
        assert_eq!(report.advice[0].alliance, AllianceColor::Red);
        assert_eq!(report.advice[0].lead, -30.0);
        assert_eq!(report.advice[1].lead, 30.0);
    }

    #[test]
    fn test_advice_notes() {
        let records = records();
        let red = AllianceProjection::build(&[971, 118], &records, &rules());
        let blue = AllianceProjection::build(&[254, 1678], &records, &rules());
        let report = analyze(red, blue);
        let red_advice = &report.advice[0];
        let blue_advice = &report.advice[1];

        assert_eq!(
            red_advice.endgame[0],
            "Some teams should focus on climbing while others maximize scoring"
        );
        assert!(red_advice.endgame[1].starts_with("Opponent has 1 deep climb robot"));
        assert_eq!(red_advice.auto[0], "1/2 teams likely to get the leave bonus");
        assert!(red_advice.auto.iter().any(|n| n == "Auto disadvantage: 6 points below opponent"));

        assert_eq!(blue_advice.endgame, vec!["Strength: 1 deep climb robot".to_string()]);
        assert!(blue_advice
            .teleop
            .iter()
            .any(|n| n == "Teleop advantage: +24 points over opponent"));
    }

    #[test]
    fn test_empty_alliance_has_no_prediction() {
        let red = AllianceProjection::build(&[254], &records(), &rules());
        let report = analyze(red, AllianceProjection::default());
        assert!(report.prediction.is_none());
        assert!(report.advice.is_empty());
    }
}
