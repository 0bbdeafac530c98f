use owo_colors::OwoColorize;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::alliance::{
    AllianceColor, AllianceProjection, AllianceSelections, ListKind, PickLists, Position, Prediction,
    RankingTable, RecommendationSet, SlotKey, StrategyReport, ALLIANCE_COUNT,
};
use crate::assistant::Answer;
use crate::charts::{Chart, PositioningStats};
use crate::record::TeamRecord;
use crate::search::SearchHit;
use crate::scoring::{compute_score, ClimbLevel, ScoreBreakdown, ScoringRules, Specialization};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score in compact notation (1.5k, 2.3M, 84.5)
/// If incomplete is true, appends asterisk to indicate partial data
pub fn format_score(score: f64, incomplete: bool) -> String {
    let formatted = if score.abs() >= 1_000_000.0 {
        format!("{:.1}M", score / 1_000_000.0)
    } else if score.abs() >= 1_000.0 {
        format!("{:.1}k", score / 1_000.0)
    } else {
        format!("{:.1}", score)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k", "12.0" -> "12")
    let trimmed = formatted
        .replace(".0M", "M")
        .replace(".0k", "k")
        .trim_end_matches(".0")
        .to_string();

    if incomplete {
        format!("{}*", trimmed)
    } else {
        trimmed
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn specialization_text(tags: impl IntoIterator<Item = Specialization>) -> String {
    tags.into_iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Event rankings with each team's average match score.
/// Columns: rank, team, ranking points, average score, climb, focus
pub fn format_rankings(
    rankings: &RankingTable,
    records: &BTreeMap<u32, TeamRecord>,
    rules: &ScoringRules,
    limit: Option<usize>,
    use_colors: bool,
) -> String {
    if rankings.is_empty() {
        return "No rankings available.".to_string();
    }

    let header = format!(
        "{:>4}  {:>5}  {:>7}  {:>7}  {:<13}  {}",
        "#", "Team", "RP", "Avg", "Climb", "Focus"
    );
    let mut lines = vec![if use_colors { header.dimmed().to_string() } else { header }];

    for (team, info) in rankings.ordered().into_iter().take(limit.unwrap_or(usize::MAX)) {
        let (avg, climb, focus) = match records.get(&team) {
            Some(record) => (
                format_score(compute_score(record, rules).total, false),
                ClimbLevel::from_record(record).label().to_string(),
                specialization_text(Specialization::detect(record)),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        let rank = format!("{:>3}.", info.rank);
        let team_str = format!("{:>5}", team);
        let rest = format!(
            "{:>7}  {:>7}  {:<13}  {}",
            format_score(info.points, false),
            avg,
            climb,
            focus
        );
        if use_colors {
            lines.push(format!("{}  {}  {}", rank.dimmed(), team_str.bold(), rest));
        } else {
            lines.push(format!("{}  {}  {}", rank, team_str, rest));
        }
    }
    lines.join("\n")
}

/// Ranked partner suggestions with their reasons.
pub fn format_recommendations(set: &RecommendationSet, my_team: u32, use_colors: bool) -> String {
    if set.entries.is_empty() {
        return "No eligible alliance partners found.".to_string();
    }

    let width = get_terminal_width();
    let mut lines = Vec::new();
    if set.robot_type_fallback {
        lines.push("No teams match the requested robot type; showing all candidates.".to_string());
    }
    lines.push(format!("Recommended partners for Team {}:", my_team));

    for (i, rec) in set.entries.iter().enumerate() {
        let index = format!("{:>2}.", i + 1);
        let score = format!("{:>7}", format_score(rec.score, false));
        let mut heading = format!(
            "Team {}  (avg {} pts, rank {})",
            rec.team,
            format_score(rec.avg_score, false),
            rec.ranking.rank
        );
        if let Some(rank) = rec.defense_rank {
            heading.push_str(&format!("  defense #{}", rank));
        }
        if use_colors {
            let heading = if rec.avoided {
                heading.yellow().to_string()
            } else {
                heading.bold().to_string()
            };
            lines.push(format!("{} {}  {}", index.dimmed(), score.cyan(), heading));
        } else {
            lines.push(format!("{} {}  {}", index, score, heading));
        }

        lines.push(format!(
            "             Focus: {}",
            specialization_text(rec.specialization.iter().copied())
        ));
        for detail in &rec.details {
            let detail = match width {
                Some(w) if w > 24 => truncate(detail, w - 15),
                _ => detail.clone(),
            };
            lines.push(format!("             - {}", detail));
        }
    }
    lines.join("\n")
}

/// Score breakdown; verbose adds one line per scored metric.
pub fn format_breakdown(breakdown: &ScoreBreakdown, verbose: bool, use_colors: bool) -> String {
    let summary = format!(
        "Auto: {}  Teleop: {}  Fouls: {}  Total: {}",
        format_score(breakdown.auto, false),
        format_score(breakdown.teleop, false),
        format_score(breakdown.fouls, false),
        format_score(breakdown.total, false)
    );
    let mut lines = vec![if use_colors { summary.bold().to_string() } else { summary }];

    if verbose {
        for c in &breakdown.contributions {
            let points = format!("{:>7}", format_score(c.points, false));
            let line = format!("  {:<6} {:<28} x{:<6} {}", c.phase.label(), c.metric, c.value, points);
            if use_colors && c.points < 0.0 {
                lines.push(line.red().to_string());
            } else {
                lines.push(line);
            }
        }
    }
    lines.join("\n")
}

/// One team's averages, ranking and optional positioning stats.
pub fn format_team_detail(
    team: u32,
    record: &TeamRecord,
    rankings: &RankingTable,
    rules: &ScoringRules,
    positioning: Option<&PositioningStats>,
    use_colors: bool,
) -> String {
    let title = format!("Team {}", team);
    let ranking = rankings.lookup(team);
    let mut lines = vec![
        if use_colors { title.bold().to_string() } else { title },
        format!(
            "  Rank: {}  RP: {}  Matches: {}",
            if rankings.contains(team) { ranking.rank.to_string() } else { "-".to_string() },
            format_score(ranking.points, false),
            ranking.match_count
        ),
        format!("  Climb: {}", ClimbLevel::from_record(record)),
        format!("  Focus: {}", specialization_text(Specialization::detect(record))),
    ];

    for line in format_breakdown(&compute_score(record, rules), false, false).lines() {
        lines.push(format!("  {}", line));
    }

    if let Some(stats) = positioning {
        lines.push(String::new());
        lines.push(format!("  Positioning over {} matches:", stats.match_count));
        if let Some((level, count)) = stats.climb.most_common() {
            lines.push(format!(
                "    Endgame: most common {} ({}), avg {:.2}, on barge {:.1}%",
                level,
                count,
                stats.climb.average(),
                stats.climb.success_rate()
            ));
        }
        lines.push(format!(
            "    Leave: {}/{} ({:.1}%)",
            stats.leave_succeeded, stats.match_count, stats.leave_rate
        ));
        lines.push(format!(
            "    Algae per match: auto net {:.2}, auto processor {:.2}, net {:.2}, processor {:.2}",
            stats.auto_net.average,
            stats.auto_processor.average,
            stats.teleop_net.average,
            stats.teleop_processor.average
        ));
    }
    lines.join("\n")
}

fn hex_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Horizontal bar chart, one block per dataset.
pub fn format_chart(chart: &Chart, use_colors: bool) -> String {
    if chart.datasets.iter().all(|d| d.series.is_empty()) {
        return "No match data to chart.".to_string();
    }

    let max = chart
        .datasets
        .iter()
        .filter_map(|d| d.series.max())
        .fold(0.0_f64, f64::max);
    let label_width = chart
        .datasets
        .iter()
        .flat_map(|d| d.series.labels.iter().map(|l| l.chars().count()))
        .max()
        .unwrap_or(0);
    let bar_room = get_terminal_width()
        .map(|w| w.saturating_sub(label_width + 12))
        .unwrap_or(50)
        .clamp(10, 60);

    let mut lines = vec![chart.metric.label().to_string()];
    for dataset in &chart.datasets {
        lines.push(String::new());
        lines.push(if use_colors {
            dataset.label.bold().to_string()
        } else {
            dataset.label.clone()
        });
        if dataset.series.is_empty() {
            lines.push("  (no data)".to_string());
            continue;
        }
        for (label, value) in dataset.series.points() {
            let len = if max > 0.0 {
                ((value.max(0.0) / max) * bar_room as f64).round() as usize
            } else {
                0
            };
            let bar = "#".repeat(len);
            let bar = match (use_colors, hex_rgb(&dataset.color)) {
                (true, Some((r, g, b))) => bar.truecolor(r, g, b).to_string(),
                _ => bar,
            };
            lines.push(format!(
                "  {:<width$}  {} {}",
                label,
                bar,
                format_score(value, false),
                width = label_width
            ));
        }
    }
    lines.join("\n")
}

/// The three pick lists, defense in rank order.
pub fn format_lists(lists: &PickLists, use_colors: bool) -> String {
    ListKind::ALL
        .iter()
        .map(|kind| {
            let title = format!("{} ({})", kind.label(), lists.len(*kind));
            let title = if use_colors { title.bold().to_string() } else { title };
            let body = match kind {
                ListKind::Defense => lists
                    .defense_entries()
                    .iter()
                    .map(|e| format!("  {:>2}. {}", e.rank, e.team))
                    .collect::<Vec<_>>(),
                _ => lists
                    .teams(*kind)
                    .iter()
                    .map(|t| format!("  {}", t))
                    .collect::<Vec<_>>(),
            };
            if body.is_empty() {
                format!("{}\n  (empty)", title)
            } else {
                format!("{}\n{}", title, body.join("\n"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The alliance board, one row per alliance.
pub fn format_alliances(selections: &AllianceSelections, use_colors: bool) -> String {
    let header = format!(
        "{:<10}  {:>7}  {:>10}  {:>11}  {:>6}",
        "Alliance",
        Position::Captain.label(),
        Position::FirstPick.label(),
        Position::SecondPick.label(),
        Position::Backup.label()
    );
    let mut lines = vec![if use_colors { header.dimmed().to_string() } else { header }];

    for alliance in 1..=ALLIANCE_COUNT {
        let cell = |position: Position| {
            SlotKey::new(alliance, position)
                .ok()
                .and_then(|slot| selections.get(slot))
                .map(|t| t.to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        let name = format!("{:<10}", format!("Alliance {}", alliance));
        let row = format!(
            "{:>7}  {:>10}  {:>11}  {:>6}",
            cell(Position::Captain),
            cell(Position::FirstPick),
            cell(Position::SecondPick),
            cell(Position::Backup)
        );
        if use_colors {
            lines.push(format!("{}  {}", name.bold(), row));
        } else {
            lines.push(format!("{}  {}", name, row));
        }
    }
    lines.join("\n")
}

pub fn format_answer(answer: &Answer, use_colors: bool) -> String {
    let mut text = answer.text.clone();
    for suggestion in &answer.suggestions {
        if use_colors {
            text.push_str(&format!("\n  - {}", suggestion.italic()));
        } else {
            text.push_str(&format!("\n  - {}", suggestion));
        }
    }
    text
}

fn alliance_block(color: AllianceColor, alliance: &AllianceProjection, use_colors: bool) -> Vec<String> {
    // Totals that leave out a requested team are marked as partial
    let heading = format!(
        "{} Alliance: {} pts (auto {}, teleop {})",
        color,
        format_score(alliance.total, !alliance.is_complete()),
        format_score(alliance.auto, false),
        format_score(alliance.teleop, false)
    );
    let heading = match (use_colors, color) {
        (true, AllianceColor::Red) => heading.red().bold().to_string(),
        (true, AllianceColor::Blue) => heading.blue().bold().to_string(),
        (false, _) => heading,
    };

    let mut lines = vec![heading];
    if alliance.teams.is_empty() && alliance.missing.is_empty() {
        lines.push("  No teams selected".to_string());
    }
    for team in &alliance.teams {
        lines.push(format!(
            "  Team {:<5} {:>6}  auto {:<5} teleop {:<5} {}{}",
            team.team,
            format_score(team.score.total, false),
            format_score(team.score.auto, false),
            format_score(team.score.teleop, false),
            team.climb,
            if team.leave { ", leave" } else { "" }
        ));
    }
    if !alliance.missing.is_empty() {
        let missing = alliance
            .missing
            .iter()
            .map(|t| format!("Team {}", t))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("  * no data for {}", missing));
    }
    lines
}

/// Projected alliance totals, the match call and per-alliance notes.
pub fn format_strategy(report: &StrategyReport, use_colors: bool) -> String {
    let mut lines = alliance_block(AllianceColor::Red, &report.red, use_colors);
    lines.push(String::new());
    lines.extend(alliance_block(AllianceColor::Blue, &report.blue, use_colors));
    lines.push(String::new());

    let prediction = match report.prediction {
        None => "Enter teams for both alliances to get a prediction.".to_string(),
        Some(Prediction::Close { margin }) => format!(
            "Close match expected (projected difference: {:.0} points)",
            margin
        ),
        Some(Prediction::Favored { alliance, margin }) => format!(
            "{} alliance favored (projected difference: {:.0} points)",
            alliance, margin
        ),
    };
    lines.push(if use_colors { prediction.bold().to_string() } else { prediction });

    for advice in &report.advice {
        let standing = if advice.lead > 0.0 {
            format!("{:.0} point lead", advice.lead)
        } else if advice.lead < 0.0 {
            format!("{:.0} point deficit", advice.lead.abs())
        } else {
            "even".to_string()
        };
        lines.push(String::new());
        lines.push(format!("{} Alliance strategy: {}", advice.alliance, standing));
        for (section, notes) in [
            ("Endgame", &advice.endgame),
            ("Auto", &advice.auto),
            ("Teleop", &advice.teleop),
        ] {
            if notes.is_empty() {
                continue;
            }
            lines.push(format!("  {}", section));
            for note in notes {
                lines.push(format!("    - {}", note));
            }
        }
    }
    lines.join("\n")
}

pub fn format_search(hits: &[SearchHit], term: &str, use_colors: bool) -> String {
    if hits.is_empty() {
        return format!("No teams found matching '{}'.", term.trim());
    }

    let header = format!(
        "{:>5}  {:>5}  {:>6}  {:>6}  {:>6}  {:>7}",
        "Team", "Match", "Auto", "Teleop", "Total", "Defense"
    );
    let mut lines = vec![if use_colors { header.dimmed().to_string() } else { header }];
    for hit in hits {
        let team = format!("{:>5}", hit.team);
        let rest = format!(
            "{:>5}  {:>6}  {:>6}  {:>6}  {:>7}",
            hit.relevance.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string()),
            format_score(hit.auto, false),
            format_score(hit.teleop, false),
            format_score(hit.total, false),
            format_score(hit.defense, false)
        );
        if use_colors {
            lines.push(format!("{}  {}", team.bold(), rest));
        } else {
            lines.push(format!("{}  {}", team, rest));
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alliance::{Recommendation, RankingInfo};
    use crate::charts::{ChartMetric, ChartSession, Grouping, Series};
    use crate::record::keys;
    use std::collections::BTreeSet;

    #[test]
    fn test_format_score_small() {
        assert_eq!(format_score(84.5, false), "84.5");
        assert_eq!(format_score(12.0, false), "12");
        assert_eq!(format_score(0.0, false), "0");
    }

    #[test]
    fn test_format_score_compact() {
        assert_eq!(format_score(1000.0, false), "1k");
        assert_eq!(format_score(1500.0, false), "1.5k");
        assert_eq!(format_score(2_300_000.0, false), "2.3M");
        assert_eq!(format_score(-2500.0, false), "-2.5k");
    }

    #[test]
    fn test_format_score_with_incomplete() {
        assert_eq!(format_score(1500.0, true), "1.5k*");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Short", 20), "Short");
        assert_eq!(truncate("This is a very long detail", 15), "This is a ve...");
        assert_eq!(truncate("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_rankings() {
        let points = BTreeMap::from([(254, 120.0), (1678, 90.0)]);
        let table = RankingTable::build(&points, &BTreeMap::new());
        let records = BTreeMap::from([(254, TeamRecord::for_team(254).with(keys::CORAL_L4, 6.0))]);

        let out = format_rankings(&table, &records, &ScoringRules::default(), None, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("  1.    254"));
        assert!(lines[1].contains("30"));
        assert!(lines[2].contains("1678"));
        assert!(lines[2].contains('-'));

        let limited = format_rankings(&table, &records, &ScoringRules::default(), Some(1), false);
        assert_eq!(limited.lines().count(), 2);
    }

    #[test]
    fn test_format_rankings_empty() {
        let out = format_rankings(&RankingTable::default(), &BTreeMap::new(), &ScoringRules::default(), None, false);
        assert_eq!(out, "No rankings available.");
    }

    #[test]
    fn test_format_recommendations() {
        let set = RecommendationSet {
            entries: vec![Recommendation {
                team: 971,
                score: 1234.0,
                avg_score: 45.5,
                ranking: RankingInfo { rank: 3, points: 80.0, match_count: 8 },
                specialization: BTreeSet::from([Specialization::Coral]),
                details: vec!["Strong coral scorer.".to_string()],
                defense_rank: Some(2),
                avoided: false,
            }],
            robot_type_fallback: true,
        };
        let out = format_recommendations(&set, 254, false);
        assert!(out.starts_with("No teams match"));
        assert!(out.contains(" 1.    1.2k  Team 971  (avg 45.5 pts, rank 3)  defense #2"));
        assert!(out.contains("- Strong coral scorer."));
    }

    #[test]
    fn test_format_breakdown_verbose() {
        let record = TeamRecord::new().with(keys::CORAL_L4, 2.0).with(keys::MINOR_FOULS, 1.0);
        let out = format_breakdown(&compute_score(&record, &ScoringRules::default()), true, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Auto: 0  Teleop: 10  Fouls: -2  Total: 8");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_format_alliances() {
        let mut selections = AllianceSelections::new();
        selections.assign(SlotKey::new(2, Position::FirstPick).unwrap(), 1678).unwrap();
        let out = format_alliances(&selections, false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 1 + ALLIANCE_COUNT as usize);
        assert!(lines[2].starts_with("Alliance 2"));
        assert!(lines[2].contains("1678"));
    }

    #[test]
    fn test_format_lists() {
        let mut lists = PickLists::new();
        lists.add(ListKind::Defense, 118).unwrap();
        lists.add(ListKind::Avoid, 33).unwrap();
        let out = format_lists(&lists, false);
        assert!(out.contains("   1. 118"));
        assert!(out.contains("  33"));
        assert!(out.contains("(empty)"));
    }

    #[test]
    fn test_format_chart() {
        let mut session = ChartSession::default();
        let series = Series {
            labels: vec!["Match 1".to_string(), "Match 2".to_string()],
            values: vec![10.0, 20.0],
        };
        let chart = session
            .create(ChartMetric::Total, Grouping::PerMatch, vec![("Team 254".to_string(), series)])
            .unwrap();
        let out = format_chart(chart, false);
        assert!(out.starts_with("Total Score"));
        assert!(out.contains("Match 2"));
        assert!(out.contains("# 10"));
        assert!(out.contains("# 20"));
    }

    #[test]
    fn test_format_strategy_marks_partial_alliance() {
        let rules = ScoringRules::new().with(keys::CORAL_L4, crate::scoring::RuleValue::Flat(5.0));
        let records = BTreeMap::from([
            (254, TeamRecord::for_team(254).with(keys::CORAL_L4, 4.0)),
            (118, TeamRecord::for_team(118).with(keys::CORAL_L4, 2.0)),
        ]);
        let red = AllianceProjection::build(&[254], &records, &rules);
        let blue = AllianceProjection::build(&[118, 9999], &records, &rules);

        let out = format_strategy(&crate::alliance::analyze(red, blue), false);
        assert!(out.starts_with("Red Alliance: 20 pts (auto 0, teleop 20)"));
        assert!(out.contains("Blue Alliance: 10* pts"));
        assert!(out.contains("  * no data for Team 9999"));
        assert!(out.contains("Red alliance favored (projected difference: 10 points)"));
        assert!(out.contains("Red Alliance strategy: 10 point lead"));
        assert!(out.contains("Blue Alliance strategy: 10 point deficit"));
        assert!(out.contains("    - Teleop disadvantage: 10 points below opponent"));
    }

    #[test]
    fn test_format_strategy_without_opponent() {
        let report = crate::alliance::analyze(AllianceProjection::default(), AllianceProjection::default());
        let out = format_strategy(&report, false);
        assert!(out.contains("  No teams selected"));
        assert!(out.ends_with("Enter teams for both alliances to get a prediction."));
    }

    #[test]
    fn test_format_search() {
        let records = BTreeMap::from([(254, TeamRecord::for_team(254).with(keys::CORAL_L4, 6.0))]);
        let hits = crate::search::search_teams("254", &records, &ScoringRules::default());
        let out = format_search(&hits, "254", false);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("  254    100"));
        assert!(lines[1].ends_with("0"));

        assert_eq!(format_search(&[], " 9 ", false), "No teams found matching '9'.");
    }
}
