use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Event standing for one team. Rank 1 has the most ranking points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingInfo {
    pub rank: u32,
    pub points: f64,
    pub match_count: u32,
}

impl RankingInfo {
    /// Standing used for teams absent from the rankings.
    pub const UNRANKED: RankingInfo = RankingInfo {
        rank: 999,
        points: 0.0,
        match_count: 1,
    };

    pub fn average_points(&self) -> f64 {
        self.points / self.match_count.max(1) as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankingTable {
    entries: BTreeMap<u32, RankingInfo>,
}

impl RankingTable {
    /// Rank teams by points, highest first. Equal points keep team-number
    /// order. Missing or zero match counts become 1.
    pub fn build(points: &BTreeMap<u32, f64>, match_counts: &BTreeMap<u32, u32>) -> Self {
        let mut ordered: Vec<(u32, f64)> = points
            .iter()
            .map(|(team, pts)| (*team, if pts.is_finite() { *pts } else { 0.0 }))
            .collect();
        ordered.sort_by(|a, b| b.1.total_cmp(&a.1));

        let entries = ordered
            .into_iter()
            .enumerate()
            .map(|(i, (team, points))| {
                let match_count = match_counts.get(&team).copied().filter(|c| *c > 0).unwrap_or(1);
                (
                    team,
                    RankingInfo {
                        rank: i as u32 + 1,
                        points,
                        match_count,
                    },
                )
            })
            .collect();

        Self { entries }
    }

    pub fn lookup(&self, team: u32) -> RankingInfo {
        self.entries.get(&team).copied().unwrap_or(RankingInfo::UNRANKED)
    }

    pub fn contains(&self, team: u32) -> bool {
        self.entries.contains_key(&team)
    }

    /// Add `rating * 50` points to every ranked team with a defense rating.
    /// Rank positions are left as they were.
    pub fn apply_defense_ratings<I>(&mut self, ratings: I)
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        for (team, rating) in ratings {
            if let Some(info) = self.entries.get_mut(&team) {
                if rating.is_finite() {
                    info.points += rating * 50.0;
                }
            }
        }
    }

    /// Teams in rank order.
    pub fn ordered(&self) -> Vec<(u32, RankingInfo)> {
        let mut rows: Vec<(u32, RankingInfo)> =
            self.entries.iter().map(|(team, info)| (*team, *info)).collect();
        rows.sort_by_key(|(_, info)| info.rank);
        rows
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(pairs: &[(u32, f64)]) -> BTreeMap<u32, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_build_ranks_by_points() {
        let table = RankingTable::build(
            &points(&[(254, 80.0), (1678, 120.0), (971, 95.0)]),
            &BTreeMap::from([(1678, 10), (971, 0)]),
        );

        assert_eq!(table.lookup(1678).rank, 1);
        assert_eq!(table.lookup(971).rank, 2);
        assert_eq!(table.lookup(254).rank, 3);
        assert_eq!(table.lookup(1678).match_count, 10);
        assert_eq!(table.lookup(971).match_count, 1);
        assert_eq!(table.lookup(254).match_count, 1);
    }

    #[test]
    fn test_missing_team_is_unranked() {
        let table = RankingTable::build(&points(&[(254, 10.0)]), &BTreeMap::new());
        assert_eq!(table.lookup(9999), RankingInfo::UNRANKED);
        assert!(!table.contains(9999));
    }

    #[test]
    fn test_ties_keep_team_order() {
        let table = RankingTable::build(&points(&[(300, 5.0), (100, 5.0), (200, 5.0)]), &BTreeMap::new());
        let order: Vec<u32> = table.ordered().into_iter().map(|(t, _)| t).collect();
        assert_eq!(order, vec![100, 200, 300]);
    }

    #[test]
    fn test_defense_ratings_boost_points_only() {
        let mut table = RankingTable::build(&points(&[(1, 100.0), (2, 50.0)]), &BTreeMap::new());
        table.apply_defense_ratings([(2, 3.0), (42, 9.0)]);

        assert_eq!(table.lookup(2).points, 200.0);
        assert_eq!(table.lookup(2).rank, 2);
        assert!(!table.contains(42));
    }

    #[test]
    fn test_average_points() {
        let info = RankingInfo { rank: 1, points: 90.0, match_count: 6 };
        assert_eq!(info.average_points(), 15.0);
    }
}
