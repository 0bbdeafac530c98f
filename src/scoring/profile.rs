use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::record::{keys, TeamRecord};

/// Share of scoring volume, in percent, a category must exceed to count as a specialization.
pub const SPECIALIZATION_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClimbLevel {
    None = 0,
    Parked = 1,
    Shallow = 2,
    Deep = 3,
}

impl ClimbLevel {
    /// Threshold a barge value (usually an average over matches) into a level.
    pub fn from_barge(value: f64) -> Self {
        if value >= 2.5 {
            ClimbLevel::Deep
        } else if value >= 1.5 {
            ClimbLevel::Shallow
        } else if value >= 0.5 {
            ClimbLevel::Parked
        } else {
            // Also NaN and negative values
            ClimbLevel::None
        }
    }

    pub fn from_record(record: &TeamRecord) -> Self {
        record
            .number(keys::ENDGAME_BARGE)
            .map(Self::from_barge)
            .unwrap_or(ClimbLevel::None)
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClimbLevel::None => "No Climb",
            ClimbLevel::Parked => "Park",
            ClimbLevel::Shallow => "Shallow Climb",
            ClimbLevel::Deep => "Deep Climb",
        }
    }
}

impl fmt::Display for ClimbLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    AlgaeNet,
    AlgaeProcessor,
    Coral,
    Any,
}

impl Specialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Specialization::AlgaeNet => "algae_net",
            Specialization::AlgaeProcessor => "algae_processor",
            Specialization::Coral => "coral",
            Specialization::Any => "any",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Specialization::AlgaeNet => "Algae Net",
            Specialization::AlgaeProcessor => "Algae Processor",
            Specialization::Coral => "Coral Specialist",
            Specialization::Any => "Balanced",
        }
    }

    /// Tags for every category above the threshold share, or `{Any}`.
    /// Never returns an empty set.
    pub fn detect(record: &TeamRecord) -> BTreeSet<Specialization> {
        let totals = CategoryTotals::from_record(record);
        let mut tags: BTreeSet<Specialization> = totals
            .shares()
            .map(|shares| {
                shares
                    .into_iter()
                    .filter(|(_, pct)| *pct > SPECIALIZATION_THRESHOLD)
                    .map(|(tag, _)| tag)
                    .collect()
            })
            .unwrap_or_default();

        if tags.is_empty() {
            tags.insert(Specialization::Any);
        }
        tags
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Specialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "algae_net" | "net" => Ok(Specialization::AlgaeNet),
            "algae_processor" | "processor" => Ok(Specialization::AlgaeProcessor),
            "coral" => Ok(Specialization::Coral),
            "any" | "balanced" => Ok(Specialization::Any),
            other => Err(format!(
                "unknown robot type '{}' (expected algae_net, algae_processor, coral or any)",
                other
            )),
        }
    }
}

/// Auto plus teleop piece counts per scoring category.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryTotals {
    pub algae_net: f64,
    pub algae_processor: f64,
    pub coral: f64,
}

impl CategoryTotals {
    pub fn from_record(record: &TeamRecord) -> Self {
        Self {
            algae_net: record.sum_of(&[keys::ALGAE_NET, keys::AUTO_ALGAE_NET]),
            algae_processor: record.sum_of(&[keys::ALGAE_PROCESSOR, keys::AUTO_ALGAE_PROCESSOR]),
            coral: record.sum_of(&[
                keys::CORAL_L1,
                keys::CORAL_L2_L3,
                keys::CORAL_L4,
                keys::AUTO_CORAL_L1,
                keys::AUTO_CORAL_L2_L3,
                keys::AUTO_CORAL_L4,
            ]),
        }
    }

    pub fn total(&self) -> f64 {
        self.algae_net + self.algae_processor + self.coral
    }

    /// Percentage share of each category, or `None` when nothing was scored.
    pub fn shares(&self) -> Option<[(Specialization, f64); 3]> {
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            return None;
        }
        Some([
            (Specialization::AlgaeNet, self.algae_net / total * 100.0),
            (Specialization::AlgaeProcessor, self.algae_processor / total * 100.0),
            (Specialization::Coral, self.coral / total * 100.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_climb_boundaries() {
        assert_eq!(ClimbLevel::from_barge(0.0), ClimbLevel::None);
        assert_eq!(ClimbLevel::from_barge(0.49), ClimbLevel::None);
        assert_eq!(ClimbLevel::from_barge(0.5), ClimbLevel::Parked);
        assert_eq!(ClimbLevel::from_barge(1.49), ClimbLevel::Parked);
        assert_eq!(ClimbLevel::from_barge(1.5), ClimbLevel::Shallow);
        assert_eq!(ClimbLevel::from_barge(2.49), ClimbLevel::Shallow);
        assert_eq!(ClimbLevel::from_barge(2.5), ClimbLevel::Deep);
        assert_eq!(ClimbLevel::from_barge(f64::NAN), ClimbLevel::None);
    }

    #[test]
    fn test_climb_from_record_missing_is_none() {
        assert_eq!(ClimbLevel::from_record(&TeamRecord::new()), ClimbLevel::None);
        let record = TeamRecord::new().with(keys::ENDGAME_BARGE, 2.7);
        assert_eq!(ClimbLevel::from_record(&record), ClimbLevel::Deep);
        assert_eq!(ClimbLevel::Deep.level(), 3);
    }

    #[test]
    fn test_detect_single_category() {
        let record = TeamRecord::new().with(keys::ALGAE_NET, 5.0);
        let tags = Specialization::detect(&record);
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec![Specialization::AlgaeNet]);
    }

    #[test]
    fn test_detect_zero_total_is_any() {
        let tags = Specialization::detect(&TeamRecord::new().with(keys::CORAL_L1, 0.0));
        assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec![Specialization::Any]);
    }

    #[test]
    fn test_detect_multi_role() {
        let record = TeamRecord::new()
            .with(keys::CORAL_L4, 4.0)
            .with(keys::AUTO_CORAL_L1, 1.0)
            .with(keys::ALGAE_PROCESSOR, 4.0)
            .with(keys::ALGAE_NET, 1.0);
        let tags = Specialization::detect(&record);
        assert!(tags.contains(&Specialization::Coral));
        assert!(tags.contains(&Specialization::AlgaeProcessor));
        assert!(!tags.contains(&Specialization::AlgaeNet));
    }

    #[test]
    fn test_detect_even_split_still_tags_all() {
        // Three equal shares of 33% each exceed the threshold
        let record = TeamRecord::new()
            .with(keys::CORAL_L1, 2.0)
            .with(keys::ALGAE_PROCESSOR, 2.0)
            .with(keys::ALGAE_NET, 2.0);
        assert_eq!(Specialization::detect(&record).len(), 3);
    }

    #[test]
    fn test_specialization_from_str() {
        assert_eq!("algae_net".parse::<Specialization>(), Ok(Specialization::AlgaeNet));
        assert_eq!("Algae Processor".parse::<Specialization>(), Ok(Specialization::AlgaeProcessor));
        assert_eq!("any".parse::<Specialization>(), Ok(Specialization::Any));
        assert!("hybrid".parse::<Specialization>().is_err());
    }

    proptest! {
        #[test]
        fn prop_climb_is_monotonic(a in -1.0f64..5.0, b in -1.0f64..5.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ClimbLevel::from_barge(lo) <= ClimbLevel::from_barge(hi));
        }

        #[test]
        fn prop_detect_never_empty(net in 0.0f64..10.0, proc_ in 0.0f64..10.0, coral in 0.0f64..10.0) {
            let record = TeamRecord::new()
                .with(keys::ALGAE_NET, net)
                .with(keys::ALGAE_PROCESSOR, proc_)
                .with(keys::CORAL_L2_L3, coral);
            let tags = Specialization::detect(&record);
            prop_assert!(!tags.is_empty());
            prop_assert!(!(tags.contains(&Specialization::Any) && tags.len() > 1));
        }
    }
}
