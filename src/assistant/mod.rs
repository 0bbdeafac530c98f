//! Rule-based answers to scouting questions.
//!
//! Questions are classified by keyword and answered from the fetched
//! snapshot through the scoring engine. Nothing here talks to the network.

pub mod intent;

pub use intent::{detect_intent, extract_team_numbers, requested_count, Intent, DEFAULT_TOP_N};

use crate::alliance::ScoutingSnapshot;
use crate::record::{keys, TeamRecord};
use crate::scoring::{compute_score, ClimbLevel, RuleValue, ScoringRules, Specialization};

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub intent: Intent,
    pub text: String,
    pub suggestions: Vec<String>,
}

impl Answer {
    fn new(intent: Intent, text: String) -> Self {
        Self {
            intent,
            text,
            suggestions: Vec::new(),
        }
    }

    fn suggest<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }
}

/// Answer one question from the snapshot.
pub fn ask(question: &str, snapshot: &ScoutingSnapshot, rules: &ScoringRules) -> Answer {
    let intent = detect_intent(question);
    let text = match &intent {
        Intent::Greeting => {
            "Hello! I'm your scouting assistant. Ask me about a team, a comparison, or who leads the event."
                .to_string()
        }
        Intent::Help => {
            return Answer::new(
                intent,
                "I can summarize a team, compare teams side by side, list the top scorers, \
                 best climbers and best defenders, and explain the scoring rules."
                    .to_string(),
            )
            .suggest([
                "Tell me about team 254",
                "Compare 254 and 1678",
                "Top 5 scorers",
                "Explain scoring rules",
            ]);
        }
        Intent::TeamInfo(teams) => teams
            .iter()
            .map(|team| team_summary(*team, snapshot, rules))
            .collect::<Vec<_>>()
            .join("\n"),
        Intent::Compare(teams) => compare(teams, snapshot, rules),
        Intent::TopScorers(n) => top_scorers(*n, snapshot, rules),
        Intent::BestClimbers(n) => best_climbers(*n, snapshot),
        Intent::BestDefense(n) => best_defense(*n, snapshot),
        Intent::ScoringRules => describe_rules(rules),
        Intent::Unknown => {
            return Answer::new(
                intent,
                "I'm not sure how to answer that. Tell me which team you're interested in, \
                 or try one of these:"
                    .to_string(),
            )
            .suggest(["Show me top teams", "Who are the best climbers?", "Explain scoring rules"]);
        }
    };
    Answer::new(intent, text)
}

fn average_score(record: &TeamRecord, rules: &ScoringRules) -> f64 {
    compute_score(record, rules).total
}

fn specialization_text(record: &TeamRecord) -> String {
    Specialization::detect(record)
        .iter()
        .map(Specialization::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn team_summary(team: u32, snapshot: &ScoutingSnapshot, rules: &ScoringRules) -> String {
    let Some(record) = snapshot.records.get(&team) else {
        return format!("I don't have any data for Team {} yet.", team);
    };

    let breakdown = compute_score(record, rules);
    let ranking = snapshot.rankings.lookup(team);
    let mut summary = format!(
        "Team {} averages {:.1} points ({:.1} auto, {:.1} teleop).",
        team, breakdown.total, breakdown.auto, breakdown.teleop
    );
    if snapshot.rankings.contains(team) {
        summary.push_str(&format!(" Ranked #{} with {:.0} ranking points.", ranking.rank, ranking.points));
    }
    summary.push_str(&format!(
        " Endgame: {}. Focus: {}.",
        ClimbLevel::from_record(record),
        specialization_text(record)
    ));
    if let Some(rating) = snapshot.defense_ratings.get(&team) {
        summary.push_str(&format!(" Defense rating {:.1}.", rating));
    }
    summary
}

fn compare(teams: &[u32], snapshot: &ScoutingSnapshot, rules: &ScoringRules) -> String {
    let mut lines: Vec<String> = teams.iter().map(|t| team_summary(*t, snapshot, rules)).collect();

    let mut scored: Vec<(u32, f64)> = teams
        .iter()
        .filter_map(|t| snapshot.records.get(t).map(|r| (*t, average_score(r, rules))))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    if let [first, second, ..] = scored.as_slice() {
        let gap = first.1 - second.1;
        if gap.abs() < 0.05 {
            lines.push(format!("Teams {} and {} score about the same.", first.0, second.0));
        } else {
            lines.push(format!(
                "Team {} outscores Team {} by {:.1} points per match.",
                first.0, second.0, gap
            ));
        }
    }
    lines.join("\n")
}

fn numbered(title: &str, rows: Vec<String>) -> String {
    if rows.is_empty() {
        return format!("{}: no team data available.", title);
    }
    let mut text = format!("{}:", title);
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!("\n{}. {}", i + 1, row));
    }
    text
}

fn top_scorers(n: usize, snapshot: &ScoutingSnapshot, rules: &ScoringRules) -> String {
    let mut scored: Vec<(u32, f64)> = snapshot
        .records
        .iter()
        .map(|(team, record)| (*team, average_score(record, rules)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let rows = scored
        .into_iter()
        .take(n)
        .map(|(team, score)| format!("Team {}: {:.1} pts", team, score))
        .collect();
    numbered(&format!("Top {} scorers", n), rows)
}

fn best_climbers(n: usize, snapshot: &ScoutingSnapshot) -> String {
    let mut climbers: Vec<(u32, f64)> = snapshot
        .records
        .iter()
        .filter_map(|(team, record)| record.number(keys::ENDGAME_BARGE).map(|b| (*team, b)))
        .collect();
    climbers.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let rows = climbers
        .into_iter()
        .take(n)
        .map(|(team, barge)| format!("Team {}: {} (avg {:.2})", team, ClimbLevel::from_barge(barge), barge))
        .collect();
    numbered(&format!("Best {} climbers", n), rows)
}

/// Backend defense ratings when present, otherwise scouted defense averages.
fn best_defense(n: usize, snapshot: &ScoutingSnapshot) -> String {
    let mut defenders: Vec<(u32, f64)> = if snapshot.defense_ratings.is_empty() {
        snapshot
            .records
            .iter()
            .map(|(team, record)| (*team, record.rate_or_zero(keys::DEFENSE_PERFORMED)))
            .collect()
    } else {
        snapshot.defense_ratings.iter().map(|(t, r)| (*t, *r)).collect()
    };
    defenders.retain(|(_, rating)| *rating > 0.0);
    defenders.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    let rows = defenders
        .into_iter()
        .take(n)
        .map(|(team, rating)| format!("Team {}: defense {:.1}", team, rating))
        .collect();
    numbered(&format!("Best {} defenders", n), rows)
}

fn describe_rules(rules: &ScoringRules) -> String {
    let mut text = String::from("Scoring rules:");
    for (metric, rule) in rules.iter() {
        match rule {
            RuleValue::Flat(points) => text.push_str(&format!("\n- {}: {} pts", metric, points)),
            RuleValue::Tiered(tiers) => {
                let tiers = tiers
                    .iter()
                    .map(|(level, points)| format!("{} = {}", level, points))
                    .collect::<Vec<_>>()
                    .join(", ");
                text.push_str(&format!("\n- {}: {}", metric, tiers));
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alliance::RankingTable;
    use std::collections::BTreeMap;

    fn snapshot() -> ScoutingSnapshot {
        let mut records = BTreeMap::new();
        records.insert(
            254,
            TeamRecord::for_team(254)
                .with(keys::CORAL_L4, 6.0)
                .with(keys::ENDGAME_BARGE, 2.8),
        );
        records.insert(
            1678,
            TeamRecord::for_team(1678)
                .with(keys::ALGAE_NET, 3.0)
                .with(keys::ENDGAME_BARGE, 1.6)
                .with(keys::DEFENSE_PERFORMED, 40.0),
        );
        records.insert(118, TeamRecord::for_team(118).with(keys::CORAL_L1, 1.0));

        let points = BTreeMap::from([(254, 120.0), (1678, 90.0)]);
        ScoutingSnapshot {
            teams: vec![118, 254, 1678],
            records,
            rankings: RankingTable::build(&points, &BTreeMap::new()),
            ..ScoutingSnapshot::default()
        }
    }

    #[test]
    fn test_team_info() {
        let answer = ask("tell me about team 254", &snapshot(), &ScoringRules::default());
        assert_eq!(answer.intent, Intent::TeamInfo(vec![254]));
        assert!(answer.text.starts_with("Team 254 averages 42.0 points"));
        assert!(answer.text.contains("Ranked #1"));
        assert!(answer.text.contains("Deep Climb"));
    }

    #[test]
    fn test_unknown_team() {
        let answer = ask("team 9999", &snapshot(), &ScoringRules::default());
        assert_eq!(answer.text, "I don't have any data for Team 9999 yet.");
    }

    #[test]
    fn test_compare() {
        let answer = ask("compare 1678 vs 254", &snapshot(), &ScoringRules::default());
        // 254: 30 + 12 = 42, 1678: 12 + 6 = 18
        assert!(answer.text.ends_with("Team 254 outscores Team 1678 by 24.0 points per match."));
    }

    #[test]
    fn test_top_scorers_limits_count() {
        let answer = ask("top 2 teams", &snapshot(), &ScoringRules::default());
        assert_eq!(answer.text, "Top 2 scorers:\n1. Team 254: 42.0 pts\n2. Team 1678: 18.0 pts");
    }

    #[test]
    fn test_best_climbers_and_defense() {
        let snap = snapshot();
        let climbers = ask("best climbers", &snap, &ScoringRules::default());
        assert!(climbers.text.contains("1. Team 254: Deep Climb"));
        assert!(climbers.text.contains("2. Team 1678: Shallow Climb"));

        let defense = ask("who plays defense", &snap, &ScoringRules::default());
        assert_eq!(defense.text, "Best 5 defenders:\n1. Team 1678: defense 40.0");
    }

    #[test]
    fn test_boolean_defense_counts_as_defender() {
        let mut snap = snapshot();
        snap.records.insert(
            118,
            TeamRecord::for_team(118).with(keys::DEFENSE_PERFORMED, true),
        );
        let defense = ask("best defense", &snap, &ScoringRules::default());
        assert_eq!(
            defense.text,
            "Best 5 defenders:\n1. Team 1678: defense 40.0\n2. Team 118: defense 1.0"
        );
    }

    #[test]
    fn test_unknown_has_suggestions() {
        let answer = ask("what's for lunch", &snapshot(), &ScoringRules::default());
        assert_eq!(answer.intent, Intent::Unknown);
        assert_eq!(answer.suggestions.len(), 3);
    }

    #[test]
    fn test_scoring_rules_listed() {
        let rules = ScoringRules::new().with(keys::ENDGAME_BARGE, RuleValue::tiered([(0, 0.0), (3, 12.0)]));
        let answer = ask("explain scoring rules", &snapshot(), &rules);
        assert_eq!(answer.text, "Scoring rules:\n- Endgame Barge: 0 = 0, 3 = 12");
    }
}
