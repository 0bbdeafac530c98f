use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

use crate::alliance::{Preference, RankingTable, ScoutingSnapshot};
use crate::backend::BackendClient;
use crate::record::{ColumnAliases, TeamRecord};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamDataset {
    pub team: u32,
    pub matches: Vec<TeamRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub team: u32,
    pub error: String,
}

/// Result of a per-team fan-out once every fetch has settled.
///
/// A team whose fetch failed is in `failures`; a team that simply has no
/// matches is in `datasets` with an empty match list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanIn {
    pub datasets: Vec<TeamDataset>,
    pub failures: Vec<FetchFailure>,
}

impl FanIn {
    pub fn teams_without_data(&self) -> Vec<u32> {
        self.datasets
            .iter()
            .filter(|d| d.matches.is_empty())
            .map(|d| d.team)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run `fetch` for every team with at most `concurrency` requests in
/// flight, wait for all of them, and return datasets in input order.
pub async fn fetch_team_matches<F, Fut, E>(teams: &[u32], concurrency: usize, fetch: F) -> FanIn
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Vec<TeamRecord>, E>>,
    E: Display,
{
    let concurrency = concurrency.max(1);
    let mut futures = FuturesUnordered::new();
    let mut pending = teams.iter().copied().enumerate();
    let mut settled: Vec<(usize, u32, Result<Vec<TeamRecord>, String>)> = Vec::with_capacity(teams.len());

    let start = |(index, team): (usize, u32)| {
        let fut = fetch(team);
        async move { (index, team, fut.await.map_err(|e| e.to_string())) }
    };

    // Fill initial batch
    for next in pending.by_ref().take(concurrency) {
        futures.push(start(next));
    }

    // Process results and feed new tasks
    while let Some(result) = futures.next().await {
        settled.push(result);
        if let Some(next) = pending.next() {
            futures.push(start(next));
        }
    }

    settled.sort_by_key(|(index, _, _)| *index);

    let mut fan_in = FanIn::default();
    for (_, team, result) in settled {
        match result {
            Ok(matches) => {
                debug!("Team {}: {} matches", team, matches.len());
                fan_in.datasets.push(TeamDataset { team, matches });
            }
            Err(error) => {
                warn!("Failed to load data for team {}: {}", team, error);
                fan_in.failures.push(FetchFailure { team, error });
            }
        }
    }
    fan_in
}

/// Match data for several teams from the backend.
pub async fn fetch_match_datasets(
    client: &BackendClient,
    teams: &[u32],
    aliases: &ColumnAliases,
    concurrency: usize,
) -> FanIn {
    fetch_team_matches(teams, concurrency, |team| client.get_match_data(team, aliases)).await
}

/// Averages for several teams, one record per dataset.
pub async fn fetch_team_averages(
    client: &BackendClient,
    teams: &[u32],
    aliases: &ColumnAliases,
    concurrency: usize,
) -> FanIn {
    fetch_team_matches(teams, concurrency, |team| async move {
        client
            .get_team_averages(team, aliases)
            .await
            .map(|record| vec![record])
    })
    .await
}

/// Gather everything the recommender needs in one concurrent round.
///
/// Match counts and defense ratings are optional: if they fail the ranking
/// proceeds with defaults. Anything else failing fails the request.
pub async fn fetch_snapshot(
    client: &BackendClient,
    aliases: &ColumnAliases,
    preference: Preference,
) -> Result<ScoutingSnapshot> {
    let want_defense = preference == Preference::Defense;

    let (rankings, averages, teams, match_counts, selections, defense) = tokio::join!(
        client.get_team_rankings(),
        client.get_all_team_averages(aliases),
        client.get_all_teams(),
        client.get_team_match_counts(),
        client.load_selections(),
        async {
            if want_defense {
                Some(client.get_defense_teams().await)
            } else {
                None
            }
        },
    );

    let rankings = rankings.context("Failed to load team rankings for recommendations")?;
    let records = averages.context("Failed to load team data for recommendations")?;
    let teams = teams.context("Failed to load team list")?;
    let selected: BTreeSet<u32> = selections
        .context("Failed to load alliance selections")?
        .selections
        .selected_teams();

    let match_counts = match_counts.unwrap_or_else(|e| {
        warn!("Match counts unavailable, assuming one match per team: {}", e);
        BTreeMap::new()
    });

    let defense_ratings: BTreeMap<u32, f64> = match defense {
        Some(Ok(ratings)) => ratings.into_iter().map(|(team, r)| (team, r.score)).collect(),
        Some(Err(e)) => {
            warn!("Defense ratings unavailable: {}", e);
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    };

    Ok(ScoutingSnapshot {
        teams,
        records,
        rankings: RankingTable::build(&rankings, &match_counts),
        defense_ratings,
        selected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::keys;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn matches(team: u32, n: u32) -> Vec<TeamRecord> {
        (1..=n)
            .map(|m| {
                let mut record = TeamRecord::for_team(team).with(keys::CORAL_L1, 1.0);
                record.match_number = Some(m);
                record
            })
            .collect()
    }

    #[tokio::test]
    async fn test_fan_in_separates_failures_from_empty() {
        let result = fetch_team_matches(&[10, 20, 30], 2, |team| async move {
            match team {
                10 => Ok(matches(10, 2)),
                20 => Err("connection refused"),
                _ => Ok(Vec::new()),
            }
        })
        .await;

        assert_eq!(result.datasets.len(), 2);
        assert_eq!(result.datasets[0].team, 10);
        assert_eq!(result.teams_without_data(), vec![30]);
        assert_eq!(
            result.failures,
            vec![FetchFailure {
                team: 20,
                error: "connection refused".to_string()
            }]
        );
        assert!(!result.is_complete());
    }

    #[tokio::test]
    async fn test_fan_in_keeps_input_order() {
        // Earlier teams finish last
        let teams = [1, 2, 3, 4, 5];
        let result = fetch_team_matches(&teams, 5, |team| async move {
            tokio::time::sleep(Duration::from_millis(10 * (6 - team as u64))).await;
            Ok::<_, String>(matches(team, 1))
        })
        .await;

        let order: Vec<u32> = result.datasets.iter().map(|d| d.team).collect();
        assert_eq!(order, teams.to_vec());
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_fan_in_bounds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let teams: Vec<u32> = (1..=12).collect();

        let result = fetch_team_matches(&teams, 3, |team| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(matches(team, 1))
            }
        })
        .await;

        assert_eq!(result.datasets.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_fan_in_empty_input() {
        let result = fetch_team_matches(&[], 4, |_| async { Ok::<_, String>(Vec::new()) }).await;
        assert_eq!(result, FanIn::default());
    }
}
