//! Counter extraction from service discovery messages.
//!
//! The discovery action answers with a sentence rather than structured
//! data, and its wording changed between backend versions. Each counter has
//! an ordered list of patterns; the first one that matches supplies the
//! value. New wordings are new table rows.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::DiscoveryCounters;

type Setter = fn(&mut DiscoveryCounters, u64);

struct CounterRule {
    name: &'static str,
    patterns: Vec<Regex>,
    set: Setter,
}

fn rule(name: &'static str, patterns: &[&str], set: Setter) -> CounterRule {
    CounterRule {
        name,
        patterns: patterns
            .iter()
            .map(|p| Regex::new(p).unwrap_or_else(|_| unreachable!()))
            .collect(),
        set,
    }
}

static RULES: Lazy<Vec<CounterRule>> = Lazy::new(|| {
    vec![
        rule("added", &[r"Added (\d+),"], |c, n| c.added = Some(n)),
        rule("removed", &[r"[Rr]emoved (\d+),"], |c, n| c.removed = Some(n)),
        rule("kept", &[r"[Kk]ept (\d+),"], |c, n| c.kept = Some(n)),
        // 1.6 replaced "New Count N" with "N new".
        rule(
            "new_count",
            &[r"New Count (\d+)\s*$", r"\b(\d+) new\b"],
            |c, n| c.new_count = Some(n),
        ),
    ]
});

/// Scrape the discovery counters out of `message`.
pub fn parse_counters(message: &str) -> DiscoveryCounters {
    let mut counters = DiscoveryCounters::default();
    for rule in RULES.iter() {
        let value = rule.patterns.iter().find_map(|pattern| {
            pattern
                .captures(message)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
        });
        match value {
            Some(n) => (rule.set)(&mut counters, n),
            None => tracing::trace!(counter = rule.name, "no pattern matched"),
        }
    }
    counters
}
