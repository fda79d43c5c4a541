//! Metric tagging module
//!
//! This module turns flat collectd metric names into tagged records based on
//! an ordered rule table.
//!
//! # Components
//!
//! - `rules`: rule, rule set and metric type definitions
//! - `collectd`: the collectd rule table
//! - `fixups`: per-plugin tag corrections
//! - `engine`: first-match loop and tag assembly
//! - `formatter`: text / JSON / YAML record output

pub mod collectd;
pub mod engine;
pub mod fixups;
pub mod formatter;
pub mod rules;

pub use collectd::collectd_rules;
pub use engine::{Target, TransformEngine};
pub use formatter::RecordFormatter;
pub use rules::{Fixup, MetricType, Rule, RuleBuilder, RuleMatch, RuleResult, RuleSet};
