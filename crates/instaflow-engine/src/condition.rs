use regex::RegexBuilder;
use tracing::warn;

use instaflow_core::types::{Condition, ConditionOperator, LogicOperator, Variables};

/// Evaluate a single condition against the variables.
///
/// Comparison is case-insensitive. A missing variable compares as `""`.
/// An invalid regex pattern is a non-match, never an error.
pub fn evaluate_condition(condition: &Condition, variables: &Variables) -> bool {
    let actual = variables.get_or_empty(&condition.field);

    match condition.operator {
        ConditionOperator::Contains => contains(actual, &condition.value),
        ConditionOperator::NotContains => !contains(actual, &condition.value),
        ConditionOperator::Equals => equals(actual, &condition.value),
        ConditionOperator::NotEquals => !equals(actual, &condition.value),
        ConditionOperator::Regex => matches_regex(actual, &condition.value),
    }
}

/// Combine conditions with AND / OR. An empty list is always true.
pub fn evaluate_conditions(conditions: &[Condition], logic: LogicOperator, variables: &Variables) -> bool {
    if conditions.is_empty() {
        return true;
    }
    match logic {
        LogicOperator::And => conditions.iter().all(|c| evaluate_condition(c, variables)),
        LogicOperator::Or => conditions.iter().any(|c| evaluate_condition(c, variables)),
    }
}

fn contains(actual: &str, expected: &str) -> bool {
    actual.to_lowercase().contains(&expected.to_lowercase())
}

fn equals(actual: &str, expected: &str) -> bool {
    actual.to_lowercase() == expected.to_lowercase()
}

fn matches_regex(actual: &str, pattern: &str) -> bool {
    match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(actual),
        Err(e) => {
            warn!(pattern, error = %e, "Invalid regex in condition, treating as no match");
            false
        }
    }
}
