use serde::Serialize;

use crate::record::{keys, TeamRecord};
use crate::scoring::{leave_bonus_achieved, ClimbLevel};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClimbDistribution {
    pub none: usize,
    pub parked: usize,
    pub shallow: usize,
    pub deep: usize,
}

impl ClimbDistribution {
    pub fn count(&self, level: ClimbLevel) -> usize {
        match level {
            ClimbLevel::None => self.none,
            ClimbLevel::Parked => self.parked,
            ClimbLevel::Shallow => self.shallow,
            ClimbLevel::Deep => self.deep,
        }
    }

    pub(crate) fn record(&mut self, level: ClimbLevel) {
        match level {
            ClimbLevel::None => self.none += 1,
            ClimbLevel::Parked => self.parked += 1,
            ClimbLevel::Shallow => self.shallow += 1,
            ClimbLevel::Deep => self.deep += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.none + self.parked + self.shallow + self.deep
    }

    /// Most frequent level; ties go to the lower level.
    pub fn most_common(&self) -> Option<(ClimbLevel, usize)> {
        if self.total() == 0 {
            return None;
        }
        let mut best = (ClimbLevel::None, self.none);
        for level in [ClimbLevel::Parked, ClimbLevel::Shallow, ClimbLevel::Deep] {
            let count = self.count(level);
            if count > best.1 {
                best = (level, count);
            }
        }
        Some(best)
    }

    pub fn average(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.parked + 2 * self.shallow + 3 * self.deep) as f64 / total as f64
    }

    /// Percent of matches ending anywhere on the barge.
    pub fn success_rate(&self) -> f64 {
        percent(self.total() - self.none, self.total())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AlgaeStat {
    /// Matches with at least one score
    pub matches: usize,
    pub total: f64,
    /// Per match played, not per scoring match
    pub average: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PositioningStats {
    pub match_count: usize,
    pub climb: ClimbDistribution,
    pub leave_succeeded: usize,
    pub leave_rate: f64,
    pub auto_net: AlgaeStat,
    pub auto_processor: AlgaeStat,
    pub teleop_net: AlgaeStat,
    pub teleop_processor: AlgaeStat,
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn algae(matches: &[TeamRecord], key: &str) -> AlgaeStat {
    let mut stat = AlgaeStat::default();
    for record in matches {
        let n = record.number_or_zero(key).trunc();
        if n > 0.0 {
            stat.matches += 1;
            stat.total += n;
        }
    }
    if !matches.is_empty() {
        stat.average = stat.total / matches.len() as f64;
    }
    stat
}

/// Endgame, leave and algae breakdown over one team's matches.
pub fn positioning_stats(matches: &[TeamRecord]) -> PositioningStats {
    let mut climb = ClimbDistribution::default();
    let mut leave_succeeded = 0;

    for record in matches {
        climb.record(ClimbLevel::from_record(record));
        if record.get(keys::LEAVE_BONUS).is_some_and(leave_bonus_achieved) {
            leave_succeeded += 1;
        }
    }

    PositioningStats {
        match_count: matches.len(),
        climb,
        leave_succeeded,
        leave_rate: percent(leave_succeeded, matches.len()),
        auto_net: algae(matches, keys::AUTO_ALGAE_NET),
        auto_processor: algae(matches, keys::AUTO_ALGAE_PROCESSOR),
        teleop_net: algae(matches, keys::ALGAE_NET),
        teleop_processor: algae(matches, keys::ALGAE_PROCESSOR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played(barge: f64, leave: bool, net: f64) -> TeamRecord {
        TeamRecord::for_team(118)
            .with(keys::ENDGAME_BARGE, barge)
            .with(keys::LEAVE_BONUS, leave)
            .with(keys::ALGAE_NET, net)
    }

    #[test]
    fn test_climb_distribution() {
        let stats = positioning_stats(&[
            played(3.0, true, 2.0),
            played(3.0, true, 0.0),
            played(1.0, false, 4.0),
            played(0.0, true, 0.0),
        ]);

        assert_eq!(stats.match_count, 4);
        assert_eq!(stats.climb.deep, 2);
        assert_eq!(stats.climb.most_common(), Some((ClimbLevel::Deep, 2)));
        assert_eq!(stats.climb.average(), 7.0 / 4.0);
        assert_eq!(stats.climb.success_rate(), 75.0);
        assert_eq!(stats.leave_succeeded, 3);
        assert_eq!(stats.leave_rate, 75.0);
    }

    #[test]
    fn test_algae_average_is_per_match_played() {
        let stats = positioning_stats(&[played(0.0, false, 2.0), played(0.0, false, 4.0), played(0.0, false, 0.0)]);
        assert_eq!(stats.teleop_net.matches, 2);
        assert_eq!(stats.teleop_net.total, 6.0);
        assert_eq!(stats.teleop_net.average, 2.0);
        assert_eq!(stats.auto_net, AlgaeStat::default());
    }

    #[test]
    fn test_most_common_tie_prefers_lower_level() {
        let stats = positioning_stats(&[played(1.0, false, 0.0), played(2.0, false, 0.0)]);
        assert_eq!(stats.climb.most_common(), Some((ClimbLevel::Parked, 1)));
    }

    #[test]
    fn test_empty_matches() {
        let stats = positioning_stats(&[]);
        assert_eq!(stats.climb.most_common(), None);
        assert_eq!(stats.leave_rate, 0.0);
        assert_eq!(stats.climb.success_rate(), 0.0);
    }
}
