//! Env var reconciliation.
//!
//! Callers describe desired env vars as one flat map. A key ending in `-`
//! requests removal of the bare name; every other key is set verbatim. The
//! map is parsed once into an [`EnvVarPlan`] and never inspected again.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Local, TimeZone};

/// Env var stamped with the deploy time on every update.
pub const BUILT_ENV_VAR: &str = "BUILT";

/// Format of the `BUILT` value, second precision.
pub const BUILT_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Key suffix that turns an entry into a removal request.
pub const REMOVAL_SUFFIX: char = '-';

/// Set and remove operations derived from a desired env var map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvVarPlan {
    /// Variables to add or overwrite.
    pub to_set: BTreeMap<String, String>,

    /// Variables to delete.
    pub to_remove: BTreeSet<String>,
}

impl EnvVarPlan {
    /// Build a plan stamped with the current local time.
    pub fn from_desired(desired: &BTreeMap<String, String>) -> Self {
        Self::from_desired_at(desired, Local::now())
    }

    /// Build a plan stamped with the given time.
    ///
    /// `BUILT` is always present in `to_set`. Every key ending in `-` lands
    /// bare in `to_remove`, including `BUILT-` and `-` itself.
    pub fn from_desired_at<Tz>(desired: &BTreeMap<String, String>, at: DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let mut plan = Self::default();

        for (name, value) in desired {
            match name.strip_suffix(REMOVAL_SUFFIX) {
                Some(bare) => {
                    plan.to_remove.insert(bare.to_string());
                }
                None => {
                    plan.to_set.insert(name.clone(), value.clone());
                }
            }
        }

        plan.to_set.insert(
            BUILT_ENV_VAR.to_string(),
            at.format(BUILT_FORMAT).to_string(),
        );

        plan
    }

    /// Value of the `BUILT` marker.
    pub fn built(&self) -> Option<&str> {
        self.to_set.get(BUILT_ENV_VAR).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn desired(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_set_and_remove() {
        let plan = EnvVarPlan::from_desired_at(&desired(&[("A", "2"), ("B-", "")]), at(0));

        assert_eq!(plan.to_set.len(), 2);
        assert_eq!(plan.to_set["A"], "2");
        assert_eq!(plan.built(), Some("19700101T000000"));
        assert_eq!(plan.to_remove, BTreeSet::from(["B".to_string()]));
    }

    #[test]
    fn test_empty_input_still_stamps_built() {
        let plan = EnvVarPlan::from_desired(&BTreeMap::new());
        assert!(plan.built().is_some());
        assert!(plan.to_remove.is_empty());
    }

    #[test]
    fn test_user_built_is_overwritten() {
        let plan = EnvVarPlan::from_desired_at(&desired(&[("BUILT", "mine")]), at(86_400));
        assert_eq!(plan.built(), Some("19700102T000000"));
    }

    #[test]
    fn test_built_removal_is_kept() {
        let plan = EnvVarPlan::from_desired_at(&desired(&[("BUILT-", "")]), at(0));
        assert_eq!(plan.to_remove, BTreeSet::from(["BUILT".to_string()]));
        assert_eq!(plan.built(), Some("19700101T000000"));
    }

    #[test]
    fn test_bare_suffix_removes_empty_name() {
        let plan = EnvVarPlan::from_desired_at(&desired(&[("-", "")]), at(0));
        assert_eq!(plan.to_remove, BTreeSet::from([String::new()]));
        assert_eq!(plan.to_set.len(), 1);
    }

    #[test]
    fn test_set_and_remove_same_name() {
        // Both sides are kept; applying removals last makes the removal win.
        let plan = EnvVarPlan::from_desired_at(&desired(&[("A", "1"), ("A-", "")]), at(0));
        assert_eq!(plan.to_set["A"], "1");
        assert!(plan.to_remove.contains("A"));
    }

    #[test]
    fn test_only_trailing_dash_removes() {
        let plan = EnvVarPlan::from_desired_at(&desired(&[("MY-VAR", "x"), ("X--", "")]), at(0));
        assert_eq!(plan.to_set["MY-VAR"], "x");
        assert!(plan.to_remove.contains("X-"));
    }

    #[test]
    fn test_built_changes_over_time() {
        let input = desired(&[("A", "1")]);
        let first = EnvVarPlan::from_desired_at(&input, at(1_700_000_000));
        let second = EnvVarPlan::from_desired_at(&input, at(1_700_000_001));
        assert_ne!(first.built(), second.built());
        assert_eq!(first.to_set["A"], second.to_set["A"]);
    }

    proptest! {
        #[test]
        fn prop_plan_partitions_keys(
            input in proptest::collection::btree_map(
                "(BUILT|[A-Z][A-Z0-9_]{0,8})?-?",
                "[a-z0-9]{0,8}",
                0..16,
            )
        ) {
            let plan = EnvVarPlan::from_desired_at(&input, at(0));

            prop_assert_eq!(plan.built(), Some("19700101T000000"));
            for (key, value) in &input {
                match key.strip_suffix('-') {
                    Some(bare) => {
                        prop_assert!(plan.to_remove.contains(bare));
                        prop_assert!(!plan.to_set.contains_key(key.as_str()));
                    }
                    // Stamped with the deploy time, checked above.
                    None if key == BUILT_ENV_VAR => {}
                    None => {
                        prop_assert_eq!(plan.to_set.get(key.as_str()), Some(value));
                    }
                }
            }
        }
    }
}
