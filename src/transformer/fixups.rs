//! Tag fixups for collectd plugins
//!
//! Each fixup rewrites the raw tokens a rule captured (`wt`, `dir`) into
//! final tags. Disk and network lookups are closed: an unexpected token means
//! collectd changed its naming and the metric is rejected. Load lookups are
//! open and fall back to `unknown`.

use crate::error::TransformError;

use super::engine::Target;
use super::rules::MetricType;

type TagTable = &'static [(&'static str, &'static str)];

const DISK_MERGED: TagTable = &[("unit", "Req"), ("type", "merged")];
const DISK_OCTETS: TagTable = &[("unit", "B")];
const DISK_OPS: TagTable = &[("unit", "Req"), ("type", "executed")];
const DISK_TIME: TagTable = &[("unit", "ms")];

/// Tags merged in for each disk sub-metric
fn disk_tags(wt: &str) -> Option<TagTable> {
    match wt {
        "merged" => Some(DISK_MERGED),
        "octets" => Some(DISK_OCTETS),
        "ops" => Some(DISK_OPS),
        "time" => Some(DISK_TIME),
        _ => None,
    }
}

/// Normalize disk I/O sub-metrics (`merged`, `octets`, `ops`, `time`)
///
/// # Errors
///
/// `UnknownSubtype` for any other `wt`; the target is left untouched.
pub fn fix_disk(target: &mut Target, store_rates: bool) -> Result<(), TransformError> {
    let wt = target.required_tag("wt")?;
    let extra = disk_tags(wt).ok_or_else(|| target.unknown_subtype("wt", wt))?;

    for (key, value) in extra {
        target.set_tag(*key, *value);
    }

    if store_rates {
        target.target_type = Some(MetricType::Rate);
        if let Some(unit) = target.tags.get_mut("unit") {
            unit.push_str("/s");
        }
    } else {
        target.target_type = Some(MetricType::Counter);
    }

    target.remove_tag("wt");
    Ok(())
}

/// Normalize load averages (`shortterm`, `midterm`, `longterm`)
///
/// Never fails: unrecognized or missing `wt` becomes `type=unknown`.
pub fn fix_load(target: &mut Target) {
    let kind = match target.tag("wt") {
        Some("shortterm") => "01",
        Some("midterm") => "05",
        Some("longterm") => "15",
        other => {
            tracing::debug!(wt = ?other, metric = %target.name, "Unrecognized load average");
            "unknown"
        }
    };

    target.set_tag("unit", "load");
    target.set_tag("type", kind);
    target.remove_tag("wt");
}

fn network_unit(wt: &str) -> Option<&'static str> {
    match wt {
        "packets" => Some("Pckt"),
        "errors" => Some("Err"),
        "octets" => Some("B"),
        _ => None,
    }
}

fn network_direction(dir: &str) -> Option<&'static str> {
    match dir {
        "rx" => Some("in"),
        "tx" => Some("out"),
        _ => None,
    }
}

/// Normalize interface traffic (`packets`, `errors`, `octets` x `rx`, `tx`)
///
/// # Errors
///
/// `UnknownSubtype` for an unexpected `wt` or `dir`. Both lookups run before
/// the target is modified.
pub fn fix_network(target: &mut Target, store_rates: bool) -> Result<(), TransformError> {
    let wt = target.required_tag("wt")?;
    let unit = network_unit(wt).ok_or_else(|| target.unknown_subtype("wt", wt))?;

    let dir = target.required_tag("dir")?;
    let direction = network_direction(dir).ok_or_else(|| target.unknown_subtype("dir", dir))?;

    if store_rates {
        target.target_type = Some(MetricType::Rate);
        target.set_tag("unit", format!("{}/s", unit));
    } else {
        target.target_type = Some(MetricType::Counter);
        target.set_tag("unit", unit);
    }

    target.set_tag("direction", direction);
    target.remove_tag("wt");
    target.remove_tag("dir");
    Ok(())
}
