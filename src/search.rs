use std::collections::BTreeMap;

use crate::charts::ChartMetric;
use crate::record::TeamRecord;
use crate::scoring::ScoringRules;

pub const MAX_SEARCH_RESULTS: usize = 10;

/// Words that turn a search into a leaderboard, checked in this order.
const SORT_KEYWORDS: [(&str, ChartMetric); 8] = [
    ("auto", ChartMetric::Auto),
    ("autonomous", ChartMetric::Auto),
    ("teleop", ChartMetric::Teleop),
    ("total", ChartMetric::Total),
    ("score", ChartMetric::Total),
    ("defense", ChartMetric::Defense),
    ("best", ChartMetric::Total),
    ("top", ChartMetric::Total),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub team: u32,
    /// Set for team-number searches: 100 exact, up to 90 prefix, 60 contains.
    pub relevance: Option<u32>,
    pub auto: f64,
    pub teleop: f64,
    pub total: f64,
    pub defense: f64,
}

impl SearchHit {
    fn new(team: u32, record: &TeamRecord, rules: &ScoringRules, relevance: Option<u32>) -> Self {
        Self {
            team,
            relevance,
            auto: ChartMetric::Auto.value(record, rules),
            teleop: ChartMetric::Teleop.value(record, rules),
            total: ChartMetric::Total.value(record, rules),
            defense: ChartMetric::Defense.value(record, rules),
        }
    }

    fn metric(&self, metric: ChartMetric) -> f64 {
        match metric {
            ChartMetric::Auto => self.auto,
            ChartMetric::Teleop => self.teleop,
            ChartMetric::Total => self.total,
            ChartMetric::Defense => self.defense,
        }
    }
}

fn relevance(team: &str, term: &str) -> Option<u32> {
    if team == term {
        Some(100)
    } else if team.starts_with(term) {
        Some(90u32.saturating_sub((team.len() - term.len()) as u32))
    } else if team.contains(term) {
        Some(60)
    } else {
        None
    }
}

/// Metric a free-text search sorts by, if it names one.
pub fn sort_metric(term: &str) -> Option<ChartMetric> {
    let lower = term.to_lowercase();
    SORT_KEYWORDS
        .iter()
        .find(|(word, _)| lower.contains(word))
        .map(|(_, metric)| *metric)
}

/// Find teams by number or by a leaderboard word ("best auto", "defense").
///
/// Digits rank matching team numbers by relevance. Other terms sort every
/// team by the first metric word found, falling back to a plain
/// team-number substring match. At most ten hits.
pub fn search_teams(
    term: &str,
    records: &BTreeMap<u32, TeamRecord>,
    rules: &ScoringRules,
) -> Vec<SearchHit> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = if term.chars().all(|c| c.is_ascii_digit()) {
        let mut hits: Vec<SearchHit> = records
            .iter()
            .filter_map(|(team, record)| {
                relevance(&team.to_string(), term)
                    .map(|r| SearchHit::new(*team, record, rules, Some(r)))
            })
            .collect();
        hits.sort_by(|a, b| b.relevance.cmp(&a.relevance));
        hits
    } else if let Some(metric) = sort_metric(term) {
        let mut hits: Vec<SearchHit> = records
            .iter()
            .map(|(team, record)| SearchHit::new(*team, record, rules, None))
            .collect();
        hits.sort_by(|a, b| b.metric(metric).total_cmp(&a.metric(metric)));
        hits
    } else {
        records
            .iter()
            .filter(|(team, _)| team.to_string().contains(term))
            .map(|(team, record)| SearchHit::new(*team, record, rules, None))
            .collect()
    };

    hits.truncate(MAX_SEARCH_RESULTS);
    hits
}
