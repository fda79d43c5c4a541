//! Internal processing statistics for collectd-tagger
//!
//! Counts what happened to each input line so a run can be summarized.
//!
//! # Counters
//!
//! - `lines` - data lines read (blank and comment lines excluded)
//! - `matched` - metrics a rule matched and tagged
//! - `unmatched` - metrics no rule matched
//! - `rejected` - metrics a fixup rejected
//! - `invalid` - lines that could not be parsed
//! - `per_rule` - matches per rule name

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::transformer::RuleSet;

/// Thread-safe counter using atomic operations
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    /// Create a new counter initialized to 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// Increment the counter by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Clone for Counter {
    fn clone(&self) -> Self {
        Self {
            value: AtomicU64::new(self.get()),
        }
    }
}

/// Processing statistics
///
/// The per-rule map is fixed when the stats are created, so recording never
/// needs a lock.
#[derive(Debug, Clone, Default)]
pub struct TransformStats {
    lines: Counter,
    matched: Counter,
    unmatched: Counter,
    rejected: Counter,
    invalid: Counter,
    per_rule: HashMap<String, Counter>,
}

impl TransformStats {
    /// Create stats with a per-rule counter for every rule in the set
    pub fn for_rules(rules: &RuleSet) -> Self {
        Self {
            per_rule: rules
                .iter()
                .map(|rule| (rule.name.clone(), Counter::new()))
                .collect(),
            ..Self::default()
        }
    }

    /// Record a data line
    pub fn record_line(&self) {
        self.lines.inc();
    }

    /// Record a metric tagged by the named rule
    pub fn record_match(&self, rule: &str) {
        self.matched.inc();
        match self.per_rule.get(rule) {
            Some(counter) => counter.inc(),
            None => tracing::debug!(rule = %rule, "Match for a rule without a counter"),
        }
    }

    /// Record a metric no rule matched
    pub fn record_unmatched(&self) {
        self.unmatched.inc();
    }

    /// Record a metric rejected by a fixup
    pub fn record_rejected(&self) {
        self.rejected.inc();
    }

    /// Record a line that failed to parse
    pub fn record_invalid(&self) {
        self.invalid.inc();
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lines: self.lines.get(),
            matched: self.matched.get(),
            unmatched: self.unmatched.get(),
            rejected: self.rejected.get(),
            invalid: self.invalid.get(),
            per_rule: self
                .per_rule
                .iter()
                .map(|(name, counter)| (name.clone(), counter.get()))
                .collect(),
        }
    }
}

/// Plain copy of [`TransformStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub lines: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub rejected: u64,
    pub invalid: u64,
    pub per_rule: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    /// Log the summary at info level
    pub fn log_summary(&self) {
        tracing::info!(
            lines = self.lines,
            matched = self.matched,
            unmatched = self.unmatched,
            rejected = self.rejected,
            invalid = self.invalid,
            "Processing finished"
        );

        for (rule, count) in self.per_rule.iter().filter(|(_, count)| **count > 0) {
            tracing::debug!(rule = %rule, matches = count, "Rule matches");
        }
    }
}
