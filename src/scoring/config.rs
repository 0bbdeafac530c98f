use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::record::keys;

/// Points for one metric: either a per-unit value, or a lookup table keyed
/// by an integer category such as climb level.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RuleValue {
    Flat(f64),
    Tiered(BTreeMap<String, f64>),
}

impl RuleValue {
    pub fn tiered<const N: usize>(tiers: [(i64, f64); N]) -> Self {
        RuleValue::Tiered(tiers.iter().map(|(k, v)| (k.to_string(), *v)).collect())
    }
}

/// Scoring rules for one game, keyed by metric name.
///
/// Tier keys must be quoted in YAML so they parse as strings.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   "Leave Bonus (T/F)": 3
///   "Coral L4 (#)": 5
///   "Endgame Barge": {"0": 0, "1": 2, "2": 6, "3": 12}
///   "Minor Fouls": -2
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ScoringRules {
    rules: BTreeMap<String, RuleValue>,
}

impl Default for ScoringRules {
    /// Reefscape 2025 point values.
    fn default() -> Self {
        let flat = [
            (keys::LEAVE_BONUS, 3.0),
            (keys::AUTO_CORAL_L1, 3.0),
            (keys::AUTO_CORAL_L2_L3, 4.5),
            (keys::AUTO_CORAL_L4, 7.0),
            (keys::AUTO_CORAL_UNCLEAR, 4.0),
            (keys::AUTO_ALGAE_NET, 4.0),
            (keys::AUTO_ALGAE_PROCESSOR, 6.0),
            (keys::CORAL_L1, 2.0),
            (keys::CORAL_L2_L3, 3.5),
            (keys::CORAL_L4, 5.0),
            (keys::CORAL_UNCLEAR, 3.0),
            (keys::ALGAE_NET, 4.0),
            (keys::ALGAE_PROCESSOR, 6.0),
            (keys::MINOR_FOULS, -2.0),
            (keys::MAJOR_FOULS, -5.0),
        ];

        let mut rules: BTreeMap<String, RuleValue> = flat
            .iter()
            .map(|(k, v)| (k.to_string(), RuleValue::Flat(*v)))
            .collect();
        rules.insert(
            keys::ENDGAME_BARGE.to_string(),
            RuleValue::tiered([(0, 0.0), (1, 2.0), (2, 6.0), (3, 12.0)]),
        );

        Self { rules }
    }
}

impl ScoringRules {
    pub fn new() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, rule: RuleValue) -> Self {
        self.rules.insert(key.to_string(), rule);
        self
    }

    pub fn get(&self, key: &str) -> Option<&RuleValue> {
        self.rules.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RuleValue)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Extract rules from a backend game config (`{"scoring_rules": {...}}`).
    pub fn from_game_config(config: &serde_json::Value) -> Option<Self> {
        let rules = config.get("scoring_rules")?;
        serde_json::from_value(rules.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_rules() {
        let rules = ScoringRules::default();
        assert_eq!(rules.get(keys::LEAVE_BONUS), Some(&RuleValue::Flat(3.0)));
        assert_eq!(rules.get(keys::MAJOR_FOULS), Some(&RuleValue::Flat(-5.0)));
        match rules.get(keys::ENDGAME_BARGE) {
            Some(RuleValue::Tiered(tiers)) => assert_eq!(tiers.get("3"), Some(&12.0)),
            other => panic!("expected tiered barge rule, got {:?}", other),
        }
        assert_eq!(rules.len(), 16);
    }

    #[test]
    fn test_rules_serde_roundtrip() {
        let rules = ScoringRules::default();
        let yaml = serde_saphyr::to_string(&rules).unwrap();
        let parsed: ScoringRules = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(rules, parsed);
    }

    #[test]
    fn test_partial_rules_parse() {
        let yaml = r#"
"Coral L4 (#)": 5
"Endgame Barge": {"0": 0, "2": 6}
"#;
        let rules: ScoringRules = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get(keys::CORAL_L4), Some(&RuleValue::Flat(5.0)));
    }

    #[test]
    fn test_from_game_config() {
        let config = json!({
            "game_name": "Reefscape 2025",
            "scoring_rules": {"Coral L1 (#)": 2, "Endgame Barge": {"0": 0, "1": 2}}
        });
        let rules = ScoringRules::from_game_config(&config).unwrap();
        assert_eq!(rules.get(keys::CORAL_L1), Some(&RuleValue::Flat(2.0)));
        assert!(ScoringRules::from_game_config(&json!({})).is_none());
    }
}
