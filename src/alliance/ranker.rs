use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::{debug, info};

use super::complementarity::{self, Preference};
use super::lists::{ListKind, PickLists};
use super::ranking::{RankingInfo, RankingTable};
use crate::record::TeamRecord;
use crate::scoring::Specialization;

pub const MAX_RECOMMENDATIONS: usize = 5;

/// Score added per defense-list position: rank 1 of n gets n * 500.
const DEFENSE_LIST_BOOST: f64 = 500.0;

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("No data found for Team {0}")]
    MissingTeamData(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationRequest {
    pub my_team: u32,
    pub preference: Preference,
    pub robot_type: Specialization,
}

/// Everything the ranker reads, fetched once per request.
#[derive(Debug, Clone, Default)]
pub struct ScoutingSnapshot {
    /// Teams at the event. When empty, every team with averages is a candidate.
    pub teams: Vec<u32>,
    pub records: BTreeMap<u32, TeamRecord>,
    pub rankings: RankingTable,
    /// Backend defense ratings, applied only for the defense preference.
    pub defense_ratings: BTreeMap<u32, f64>,
    pub selected: BTreeSet<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub team: u32,
    pub score: f64,
    pub avg_score: f64,
    pub ranking: RankingInfo,
    pub specialization: BTreeSet<Specialization>,
    pub details: Vec<String>,
    pub defense_rank: Option<u32>,
    pub avoided: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationSet {
    pub entries: Vec<Recommendation>,
    /// No candidate matched the requested robot type, so the filter was dropped.
    pub robot_type_fallback: bool,
}

fn by_score_desc(a: &Recommendation, b: &Recommendation) -> std::cmp::Ordering {
    b.score.total_cmp(&a.score)
}

fn by_points_desc(a: &Recommendation, b: &Recommendation) -> std::cmp::Ordering {
    b.ranking.points.total_cmp(&a.ranking.points)
}

/// Pick up to five alliance partners for `request.my_team`.
pub fn rank(
    request: &RecommendationRequest,
    snapshot: &ScoutingSnapshot,
    lists: &PickLists,
) -> Result<RecommendationSet, RankError> {
    let mine = snapshot
        .records
        .get(&request.my_team)
        .ok_or(RankError::MissingTeamData(request.my_team))?;

    let mut rankings = snapshot.rankings.clone();
    if request.preference == Preference::Defense {
        rankings.apply_defense_ratings(snapshot.defense_ratings.iter().map(|(t, s)| (*t, *s)));
    }

    let pool: Vec<u32> = if snapshot.teams.is_empty() {
        snapshot.records.keys().copied().collect()
    } else {
        snapshot.teams.clone()
    };

    let mut seen = BTreeSet::new();
    let mut candidates: Vec<Recommendation> = Vec::new();
    for team in pool {
        if !seen.insert(team)
            || team == request.my_team
            || snapshot.selected.contains(&team)
            || lists.contains(ListKind::DoNotPick, team)
        {
            continue;
        }
        let Some(record) = snapshot.records.get(&team) else {
            debug!("Team {} has no averages, skipping", team);
            continue;
        };

        let ranking = rankings.lookup(team);
        let defense_rank = lists.defense_rank(team);
        let avoided = lists.contains(ListKind::Avoid, team);

        let mut details = Vec::new();
        if let Some(rank) = defense_rank {
            details.push(format!("Defense List Rank #{}.", rank));
        }
        if avoided {
            details.push("Note: This team is on your \"Avoid\" list.".to_string());
        }
        details.extend(complementarity::details(mine, record, &ranking));

        candidates.push(Recommendation {
            team,
            score: complementarity::score(mine, record, request.preference, &ranking),
            avg_score: ranking.average_points(),
            ranking,
            specialization: Specialization::detect(record),
            details,
            defense_rank,
            avoided,
        });
    }

    candidates.sort_by(by_points_desc);

    let mut robot_type_fallback = false;
    if request.robot_type != Specialization::Any {
        let narrowed: Vec<Recommendation> = candidates
            .iter()
            .filter(|c| c.specialization.contains(&request.robot_type))
            .cloned()
            .collect();
        if narrowed.is_empty() {
            info!(
                "No {} robots found, showing all robots",
                request.robot_type.label()
            );
            robot_type_fallback = !candidates.is_empty();
        } else {
            candidates = narrowed;
        }
    }

    let defense_len = lists.len(ListKind::Defense);
    let ordered = match request.preference {
        Preference::Defense if defense_len > 0 => {
            let (mut listed, mut others): (Vec<_>, Vec<_>) =
                candidates.into_iter().partition(|c| c.defense_rank.is_some());
            for c in listed.iter_mut() {
                let rank = c.defense_rank.unwrap_or(defense_len as u32);
                c.score += (defense_len as f64 - rank as f64 + 1.0) * DEFENSE_LIST_BOOST;
            }
            listed.sort_by_key(|c| c.defense_rank);
            others.sort_by(by_score_desc);
            listed.extend(others);
            listed
        }
        // Proven scorers first: ranking points, already sorted
        Preference::Offense => candidates,
        Preference::Defense | Preference::Balanced => {
            candidates.sort_by(by_score_desc);
            candidates
        }
    };

    let (mut entries, avoided): (Vec<_>, Vec<_>) = ordered.into_iter().partition(|c| !c.avoided);
    if entries.len() < MAX_RECOMMENDATIONS {
        let needed = MAX_RECOMMENDATIONS - entries.len();
        entries.extend(avoided.into_iter().take(needed));
    }
    entries.truncate(MAX_RECOMMENDATIONS);

    Ok(RecommendationSet {
        entries,
        robot_type_fallback,
    })
}
