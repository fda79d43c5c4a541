//! Rule-based metric tagging module
//!
//! This module provides rule definitions for turning flat metric names into
//! tagged metric records. A rule pairs a regex with named capture groups, a
//! declared target type, static tags and an optional fixup.
//!
//! # Example
//!
//! ```ignore
//! use collectd_tagger::transformer::rules::{Fixup, MetricType, Rule, RuleSet};
//!
//! let rules = RuleSet::from_rules(vec![
//!     Rule::builder("memory", r"^collectd\.(?P<server>[^.]+)\.memory\.memory[-.](?P<type>[^.]+)$")
//!         .target_type(MetricType::Gauge)
//!         .tag("unit", "B")
//!         .build(),
//! ]);
//!
//! rules.compile_all()?;
//! ```

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::error::RuleError;

/// Result type for rule operations
pub type RuleResult<T> = Result<T, RuleError>;

/// Value type of an emitted metric
///
/// Rules without a declared type leave it to their fixup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricType {
    /// A value that can go up and down
    Gauge,
    /// A monotonically increasing value
    Counter,
    /// A gauge expressed as a percentage
    GaugePct,
    /// A counter already divided into a per-second rate
    Rate,
}

impl MetricType {
    /// Returns the wire representation
    ///
    /// # Example
    ///
    /// ```ignore
    /// use collectd_tagger::transformer::rules::MetricType;
    ///
    /// assert_eq!(MetricType::GaugePct.as_str(), "gauge_pct");
    /// assert_eq!(MetricType::Rate.as_str(), "rate");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
            MetricType::GaugePct => "gauge_pct",
            MetricType::Rate => "rate",
        }
    }
}

impl Serialize for MetricType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Post-match tag correction attached to a rule
///
/// Dispatched by the transform engine with a `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixup {
    /// Tags are emitted as assembled
    #[default]
    None,
    /// Disk I/O sub-metrics, see [`super::fixups::fix_disk`]
    Disk,
    /// Load averages, see [`super::fixups::fix_load`]
    Load,
    /// Interface traffic, see [`super::fixups::fix_network`]
    Network,
}

impl Fixup {
    /// Whether the rule has any fixup at all
    pub fn is_none(&self) -> bool {
        matches!(self, Fixup::None)
    }
}

/// Metric tagging rule
///
/// Named capture groups in `pattern` become tags of the emitted record.
/// Static `tags` are layered on top of them.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    /// Short identifier used in logs and statistics
    pub name: String,

    /// Regex matched against the full metric name
    pub pattern: String,

    /// Declared value type, if any
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub target_type: Option<MetricType>,

    /// Static tags added to every match
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    /// Correction applied after tag assembly
    #[serde(skip_serializing_if = "Fixup::is_none")]
    pub fixup: Fixup,

    #[serde(skip)]
    compiled_pattern: OnceCell<Regex>,
}

impl Rule {
    /// Create a new rule with the given name and pattern
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            target_type: None,
            tags: BTreeMap::new(),
            fixup: Fixup::None,
            compiled_pattern: OnceCell::new(),
        }
    }

    /// Create a new rule builder for fluent configuration
    pub fn builder(name: impl Into<String>, pattern: impl Into<String>) -> RuleBuilder {
        RuleBuilder::new(name, pattern)
    }

    /// Compile the regex pattern
    ///
    /// This method lazily compiles the pattern on first call.
    /// Subsequent calls return the cached compiled regex.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidPattern` if the pattern is not valid regex.
    pub fn compile(&self) -> RuleResult<&Regex> {
        self.compiled_pattern.get_or_try_init(|| {
            Regex::new(&self.pattern).map_err(|e| RuleError::InvalidPattern {
                pattern: self.pattern.clone(),
                source: e,
            })
        })
    }

    /// Check if the rule pattern has been compiled
    pub fn is_compiled(&self) -> bool {
        self.compiled_pattern.get().is_some()
    }

    /// Check if the rule matches the given metric name
    ///
    /// # Returns
    ///
    /// Returns `Some(RuleMatch)` if the pattern matches, `None` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if pattern compilation fails.
    pub fn matches<'a>(&'a self, input: &'a str) -> RuleResult<Option<RuleMatch<'a>>> {
        let regex = self.compile()?;
        Ok(regex.captures(input).map(|caps| RuleMatch {
            rule: self,
            regex,
            captures: caps,
        }))
    }
}

/// Builder for creating Rule instances with fluent API
pub struct RuleBuilder {
    name: String,
    pattern: String,
    target_type: Option<MetricType>,
    tags: BTreeMap<String, String>,
    fixup: Fixup,
}

impl RuleBuilder {
    /// Create a new rule builder
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            target_type: None,
            tags: BTreeMap::new(),
            fixup: Fixup::None,
        }
    }

    /// Set the declared target type
    pub fn target_type(mut self, target_type: MetricType) -> Self {
        self.target_type = Some(target_type);
        self
    }

    /// Add a static tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Attach a fixup
    pub fn fixup(mut self, fixup: Fixup) -> Self {
        self.fixup = fixup;
        self
    }

    /// Build the rule
    pub fn build(self) -> Rule {
        Rule {
            name: self.name,
            pattern: self.pattern,
            target_type: self.target_type,
            tags: self.tags,
            fixup: self.fixup,
            compiled_pattern: OnceCell::new(),
        }
    }
}

/// Result of a successful rule match
pub struct RuleMatch<'a> {
    /// The rule that matched
    pub rule: &'a Rule,
    regex: &'a Regex,
    /// The regex captures from the match
    pub captures: regex::Captures<'a>,
}

impl<'a> RuleMatch<'a> {
    /// Get the full matched string
    pub fn as_str(&self) -> &str {
        self.captures.get(0).map(|m| m.as_str()).unwrap_or("")
    }

    /// Get a capture group by name
    pub fn name(&self, name: &str) -> Option<&str> {
        self.captures.name(name).map(|m| m.as_str())
    }

    /// Assemble the tag set for this match
    ///
    /// Every named group that took part in the match becomes a tag, then the
    /// rule's static tags are inserted over them.
    pub fn tags(&self) -> BTreeMap<String, String> {
        let mut tags: BTreeMap<String, String> = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|group| {
                self.captures
                    .name(group)
                    .map(|m| (group.to_string(), m.as_str().to_string()))
            })
            .collect();

        for (k, v) in &self.rule.tags {
            tags.insert(k.clone(), v.clone());
        }

        tags
    }

    /// Get the declared target type
    pub fn target_type(&self) -> Option<MetricType> {
        self.rule.target_type
    }

    /// Get the fixup to apply
    pub fn fixup(&self) -> Fixup {
        self.rule.fixup
    }
}

/// Ordered collection of tagging rules
///
/// The first matching rule wins, so declaration order matters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new empty rule set
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a rule set from a vector of rules
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Get the number of rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Compile all rule patterns
    ///
    /// Called once at construction so a bad pattern is a startup failure
    /// rather than a per-metric one.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::RuleCompileFailed` for the first pattern that
    /// fails to compile.
    pub fn compile_all(&self) -> RuleResult<()> {
        for (index, rule) in self.rules.iter().enumerate() {
            rule.compile().map_err(|e| RuleError::RuleCompileFailed {
                index,
                name: rule.name.clone(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Find the first rule that matches the input
    ///
    /// Returns `Some(RuleMatch)` for the first matching rule, `None` if no rules match.
    pub fn find_match<'a>(&'a self, input: &'a str) -> RuleResult<Option<RuleMatch<'a>>> {
        for rule in &self.rules {
            if let Some(m) = rule.matches(input)? {
                return Ok(Some(m));
            }
        }
        Ok(None)
    }

    /// Iterate over all rules
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Get a reference to the underlying rules
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Get a rule by index
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self {
            rules: iter.into_iter().collect(),
        }
    }
}
