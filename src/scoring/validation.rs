use super::config::{RuleValue, ScoringRules};

/// Validate scoring rules at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(rules: &ScoringRules) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if rules.is_empty() {
        errors.push("scoring: no rules defined".to_string());
    }

    for (key, rule) in rules.iter() {
        if key.trim().is_empty() {
            errors.push("scoring: metric names must not be empty".to_string());
            continue;
        }

        match rule {
            RuleValue::Flat(points) => {
                if !points.is_finite() {
                    errors.push(format!("scoring.\"{}\": points must be a finite number", key));
                }
            }
            RuleValue::Tiered(tiers) => {
                if tiers.is_empty() {
                    errors.push(format!("scoring.\"{}\": tier table is empty", key));
                }
                for (tier, points) in tiers {
                    // The engine looks tiers up by the rounded value's plain decimal form
                    match tier.parse::<i64>() {
                        Ok(n) if n.to_string() == *tier => {}
                        Ok(n) => errors.push(format!(
                            "scoring.\"{}\".\"{}\": tier key must be written as \"{}\"",
                            key, tier, n
                        )),
                        Err(_) => errors.push(format!(
                            "scoring.\"{}\".\"{}\": tier key must be an integer",
                            key, tier
                        )),
                    }
                    if !points.is_finite() {
                        errors.push(format!(
                            "scoring.\"{}\".\"{}\": points must be a finite number",
                            key, tier
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
