//! Transform Engine - metric name to tagged record conversion
//!
//! This module owns the matching loop: it finds the first rule for a metric
//! name, assembles the tag set and dispatches the rule's fixup.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::CollectdConfig;
use crate::error::TransformError;
use crate::metrics::TransformStats;

use super::collectd::collectd_rules;
use super::fixups::{fix_disk, fix_load, fix_network};
use super::rules::{Fixup, MetricType, RuleMatch, RuleResult, RuleSet};

/// Transform Engine configuration and state
///
/// The engine is immutable once built and can be shared between threads
/// for concurrent matching.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    rules: RuleSet,
    /// Counters arrive pre-divided into per-second rates
    store_rates: bool,
}

impl TransformEngine {
    /// Create a new TransformEngine with the given rules
    ///
    /// All patterns are compiled here.
    ///
    /// # Errors
    ///
    /// Returns the first pattern compilation failure.
    pub fn new(rules: RuleSet, store_rates: bool) -> RuleResult<Self> {
        rules.compile_all()?;
        Ok(Self { rules, store_rates })
    }

    /// Build the engine with the collectd rule table
    ///
    /// # Example
    ///
    /// ```ignore
    /// use collectd_tagger::config::CollectdConfig;
    /// use collectd_tagger::transformer::TransformEngine;
    ///
    /// let engine = TransformEngine::from_config(&CollectdConfig::new(true))?;
    /// let target = engine.transform("collectd.hostA.cpu-0.cpu-user")?;
    /// ```
    pub fn from_config(config: &CollectdConfig) -> RuleResult<Self> {
        Self::new(collectd_rules(config), config.store_rates)
    }

    /// Get a reference to the rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Whether counters are reported as rates
    pub fn store_rates(&self) -> bool {
        self.store_rates
    }

    /// Transform a single metric name
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no rule matches the name.
    ///
    /// # Errors
    ///
    /// Returns `TransformError` when the matching rule's fixup rejects the
    /// captured values. The error only concerns this metric.
    pub fn transform(&self, name: &str) -> Result<Option<Target>, TransformError> {
        let Some(rule_match) = self.rules.find_match(name)? else {
            tracing::trace!(metric = %name, "No matching rule found");
            return Ok(None);
        };

        let mut target = Target::from_match(&rule_match);
        self.apply_fixup(rule_match.fixup(), &mut target)?;

        tracing::trace!(
            metric = %name,
            rule = %target.rule,
            target_type = ?target.target_type,
            "Metric tagged"
        );

        Ok(Some(target))
    }

    /// Transform a sample, carrying its value and timestamp along
    pub fn transform_sample(
        &self,
        name: &str,
        value: Option<f64>,
        timestamp: Option<i64>,
    ) -> Result<Option<Target>, TransformError> {
        Ok(self.transform(name)?.map(|mut target| {
            target.value = value;
            target.timestamp = timestamp;
            target
        }))
    }

    /// Transform a batch of metric names
    ///
    /// Unmatched names are dropped. A metric rejected by its fixup is logged
    /// and skipped; the rest of the batch is still processed.
    pub fn transform_all<'a, I>(&self, names: I, stats: &TransformStats) -> Vec<Target>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut targets = Vec::new();

        for name in names {
            stats.record_line();
            match self.transform(name) {
                Ok(Some(target)) => {
                    stats.record_match(&target.rule);
                    targets.push(target);
                }
                Ok(None) => stats.record_unmatched(),
                Err(e) => {
                    tracing::warn!(metric = %name, error = %e, "Dropping metric");
                    stats.record_rejected();
                }
            }
        }

        targets
    }

    fn apply_fixup(&self, fixup: Fixup, target: &mut Target) -> Result<(), TransformError> {
        match fixup {
            Fixup::None => Ok(()),
            Fixup::Disk => fix_disk(target, self.store_rates),
            Fixup::Load => {
                fix_load(target);
                Ok(())
            }
            Fixup::Network => fix_network(target, self.store_rates),
        }
    }
}

/// A tagged metric record built from one rule match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    /// The metric name that matched
    pub name: String,
    /// Name of the rule that matched
    pub rule: String,
    /// Tags after assembly and fixup
    pub tags: BTreeMap<String, String>,
    /// Value type; set by the rule or by its fixup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<MetricType>,
    /// Sample value, when read from a data line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Sample timestamp (seconds since epoch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl Target {
    /// Build a target from captures and static tags of a match
    pub fn from_match(rule_match: &RuleMatch<'_>) -> Self {
        Self {
            name: rule_match.as_str().to_string(),
            rule: rule_match.rule.name.clone(),
            tags: rule_match.tags(),
            target_type: rule_match.target_type(),
            value: None,
            timestamp: None,
        }
    }

    /// Get a tag value
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Set a tag, replacing any previous value
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Remove a tag, returning its value
    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    /// Get a tag a fixup cannot work without
    pub fn required_tag(&self, field: &'static str) -> Result<&str, TransformError> {
        self.tag(field).ok_or_else(|| TransformError::MissingTag {
            field,
            rule: self.rule.clone(),
        })
    }

    /// Error for a tag value outside a fixup's lookup table
    pub fn unknown_subtype(&self, field: &'static str, value: &str) -> TransformError {
        TransformError::UnknownSubtype {
            field,
            value: value.to_string(),
            rule: self.rule.clone(),
        }
    }

    /// Tags with `target_type` folded in, as emitted downstream
    pub fn all_tags(&self) -> BTreeMap<String, String> {
        let mut tags = self.tags.clone();
        if let Some(target_type) = self.target_type {
            tags.insert("target_type".to_string(), target_type.as_str().to_string());
        }
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::rules::Rule;

    fn engine(store_rates: bool) -> TransformEngine {
        TransformEngine::from_config(&CollectdConfig::new(store_rates)).unwrap()
    }

    #[test]
    fn test_cpu_metric() {
        let target = engine(false)
            .transform("collectd.hostA.cpu-0.cpu-user")
            .unwrap()
            .unwrap();

        assert_eq!(target.rule, "cpu");
        assert_eq!(target.name, "collectd.hostA.cpu-0.cpu-user");
        assert_eq!(target.tag("server"), Some("hostA"));
        assert_eq!(target.tag("core"), Some("0"));
        assert_eq!(target.tag("type"), Some("user"));
        assert_eq!(target.tag("collectd_plugin"), Some("cpu"));
        assert_eq!(target.tag("unit"), Some("Jiff"));
        assert_eq!(target.tag("what"), Some("cpu_usage"));
        assert_eq!(target.target_type, Some(MetricType::GaugePct));
    }

    #[test]
    fn test_unmatched_metric() {
        let result = engine(false)
            .transform("collectd.hostA.unknownplugin.value")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unknown_network_subtype_is_an_error() {
        let result = engine(true).transform("collectd.hostA.interface-eth0.if_bogus.rx");
        match result {
            Err(TransformError::UnknownSubtype { field, value, rule }) => {
                assert_eq!(field, "wt");
                assert_eq!(value, "bogus");
                assert_eq!(rule, "interface");
            }
            other => panic!("Expected UnknownSubtype, got {:?}", other),
        }
    }

    #[test]
    fn test_transform_all_skips_rejected_metrics() {
        let engine = engine(false);
        let stats = TransformStats::for_rules(engine.rules());

        let targets = engine.transform_all(
            [
                "collectd.hostA.disk-sda.disk_bogus.read",
                "collectd.hostA.nothing.here",
                "collectd.hostA.memory.memory-used",
                "collectd.hostA.disk-sda.disk_ops.write",
            ],
            &stats,
        );

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].rule, "memory");
        assert_eq!(targets[1].rule, "disk");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.lines, 4);
        assert_eq!(snapshot.matched, 2);
        assert_eq!(snapshot.unmatched, 1);
        assert_eq!(snapshot.rejected, 1);
        assert_eq!(snapshot.per_rule.get("disk"), Some(&1));
    }

    #[test]
    fn test_transform_sample_carries_value() {
        let target = engine(false)
            .transform_sample("collectd.hostA.users.users", Some(3.0), Some(1_700_000_000))
            .unwrap()
            .unwrap();
        assert_eq!(target.value, Some(3.0));
        assert_eq!(target.timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_new_rejects_invalid_pattern() {
        let rules = RuleSet::from_rules(vec![Rule::new("broken", r"^collectd\.(")]);
        assert!(TransformEngine::new(rules, false).is_err());
    }

    #[test]
    fn test_invalid_prefix_fails_construction() {
        let config = CollectdConfig::new(false).with_prefix(r"^collectd[");
        assert!(TransformEngine::from_config(&config).is_err());
    }

    #[test]
    fn test_all_tags_includes_target_type() {
        let target = engine(true)
            .transform("collectd.hostA.interface-eth0.if_octets.rx")
            .unwrap()
            .unwrap();
        let tags = target.all_tags();
        assert_eq!(tags.get("target_type").map(String::as_str), Some("rate"));
        assert!(!target.tags.contains_key("target_type"));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransformEngine>();
    }
}
