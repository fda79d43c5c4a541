//! collectd rule table
//!
//! Rules for the metric names collectd's graphite writer produces, e.g.
//! `collectd.<host>.cpu-0.cpu-user` or `collectd.<host>.interface-eth0.if_octets.rx`.
//! Every pattern is the configured prefix followed by a plugin suffix
//! anchored with `$`. Suffixes are distinguished by literal plugin names, so
//! at most one rule matches a given name, but they are still tried in order.

use crate::config::CollectdConfig;

use super::rules::{Fixup, MetricType, Rule, RuleSet};

/// Build the collectd rule table for the given settings
///
/// Patterns are compiled by [`super::TransformEngine::new`], which reports a
/// bad prefix as a construction error.
pub fn collectd_rules(config: &CollectdConfig) -> RuleSet {
    let prefix = config.prefix();
    let rule = |name: &str, suffix: &str| Rule::builder(name, format!("{}{}", prefix, suffix));

    RuleSet::from_rules(vec![
        rule(
            "cpu",
            r"(?P<server>[^.]+)\.(?P<collectd_plugin>cpu)[-.](?P<core>[^.]+)\.cpu[-.](?P<type>[^.]+)$",
        )
        .target_type(MetricType::GaugePct)
        .tag("unit", "Jiff")
        .tag("what", "cpu_usage")
        .build(),
        rule(
            "load",
            r"(?P<server>.+?)\.(?P<collectd_plugin>load)\.load\.(?P<wt>.*)$",
        )
        .target_type(MetricType::Gauge)
        .fixup(Fixup::Load)
        .build(),
        rule(
            "interface",
            r"(?P<server>[^.]+)\.interface[-.](?P<device>[^.]+)\.if_(?P<wt>[^.]+)\.(?P<dir>[^.]+)$",
        )
        .target_type(MetricType::Counter)
        .tag("collectd_plugin", "network")
        .fixup(Fixup::Network)
        .build(),
        rule(
            "memory",
            r"(?P<server>[^.]+)\.memory\.memory[-.](?P<type>[^.]+)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "B")
        .tag("where", "system_memory")
        .build(),
        rule(
            "df",
            r"(?P<server>[^.]+)\.df[-.](?P<mountpoint>[^.]+)\.df_complex[-.](?P<type>[^.]+)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "B")
        .build(),
        // type comes from the fixup
        rule(
            "disk",
            r"(?P<server>[^.]+)\.(?P<collectd_plugin>disk)[-.](?P<device>[^.]+)\.disk_(?P<wt>[^.]+)\.(?P<operation>[^.]+)$",
        )
        .fixup(Fixup::Disk)
        .build(),
        rule(
            "irq",
            r"(?P<server>.+?)\.(?P<collectd_plugin>irq)\.irq[-.](?P<wt>.*)$",
        )
        .target_type(MetricType::Counter)
        .tag("unit", "calls")
        .tag("what", "irq_calls")
        .build(),
        rule(
            "processes_state",
            r"(?P<server>.+?)\.(?P<collectd_plugin>processes)\.ps_state[-.](?P<state>.*)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "procs")
        .tag("what", "procs_in_state")
        .build(),
        rule(
            "processes_fork_rate",
            r"(?P<server>.+?)\.(?P<collectd_plugin>processes)\.(?P<value>fork_rate)$",
        )
        .target_type(MetricType::Counter)
        .tag("unit", "procs")
        .tag("what", "fork_rate")
        .build(),
        rule("swap", r"(?P<server>[^.]+)\.swap\.swap[-.](?P<type>[^.]+)$")
            .target_type(MetricType::Gauge)
            .tag("unit", "B")
            .tag("where", "swap")
            .build(),
        rule(
            "swap_io",
            r"(?P<server>[^.]+)\.swap\.swap_io[-.](?P<dir>[^.]+)$",
        )
        .target_type(MetricType::Counter)
        .tag("unit", "B")
        .tag("where", "swap_io")
        .build(),
        rule(
            "tcpconns",
            r"(?P<server>.+?)\.(?P<collectd_plugin>tcpconns)[-.](?P<port>\d+)[-.]local\.tcp_connections[-.](?P<state>.*)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "connections")
        .tag("what", "tcp_connections_in_state")
        .build(),
        rule(
            "contextswitch",
            r"(?P<server>.+?)\.(?P<collectd_plugin>contextswitch)\.(?P<value>contextswitch)$",
        )
        .target_type(MetricType::Counter)
        .tag("unit", "fork/s")
        .tag("what", "contextswitch")
        .build(),
        rule(
            "users",
            r"(?P<server>.+?)\.(?P<collectd_plugin>users)\.(?P<value>users)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "users")
        .tag("what", "users_logged")
        .build(),
        rule(
            "entropy",
            r"(?P<server>.+?)\.(?P<collectd_plugin>entropy)\.(?P<value>entropy)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "bits")
        .tag("what", "entropy")
        .build(),
        rule(
            "conntrack",
            r"(?P<server>.+?)\.(?P<collectd_plugin>conntrack)\.(?P<value>conntrack)$",
        )
        .target_type(MetricType::Gauge)
        .tag("unit", "entries")
        .tag("what", "conntrack")
        .build(),
    ])
}
