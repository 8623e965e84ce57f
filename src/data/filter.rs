use std::collections::BTreeSet;

use super::model::{DateRange, FilterSelection, HierarchyRule, Record};

// ---------------------------------------------------------------------------
// Date range
// ---------------------------------------------------------------------------

/// Records whose order date lies within `range` (inclusive).
/// An inverted range yields nothing.
pub fn filter_by_date(records: &[Record], range: &DateRange) -> Vec<Record> {
    if range.is_inverted() {
        return Vec::new();
    }
    records
        .iter()
        .filter(|r| range.contains(r.order_date))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Region → State → City
// ---------------------------------------------------------------------------

fn member(set: &BTreeSet<String>, value: &str) -> bool {
    set.contains(value)
}

/// Apply the geographic selection under the given rule.
pub fn filter_by_hierarchy(
    records: &[Record],
    selection: &FilterSelection,
    rule: HierarchyRule,
) -> Vec<Record> {
    if selection.is_empty() {
        return records.to_vec();
    }
    let keep = |r: &Record| match rule {
        HierarchyRule::Conjunctive => conjunctive(selection, r),
        HierarchyRule::Branching => branching(selection, r),
    };
    records.iter().filter(|&r| keep(r)).cloned().collect()
}

/// Every non-empty set must contain the record's value.
fn conjunctive(sel: &FilterSelection, r: &Record) -> bool {
    (sel.regions.is_empty() || member(&sel.regions, &r.region))
        && (sel.states.is_empty() || member(&sel.states, &r.state))
        && (sel.cities.is_empty() || member(&sel.cities, &r.city))
}

/// Emptiness-pattern table. Checked top to bottom; the first match wins, so
/// some combinations ignore a non-empty set.
fn branching(sel: &FilterSelection, r: &Record) -> bool {
    let (reg, st, ci) = (
        !sel.regions.is_empty(),
        !sel.states.is_empty(),
        !sel.cities.is_empty(),
    );
    let in_region = || member(&sel.regions, &r.region);
    let in_state = || member(&sel.states, &r.state);
    let in_city = || member(&sel.cities, &r.city);

    if !reg && !st && !ci {
        true
    } else if !st && !ci {
        in_region()
    } else if !reg && !ci {
        in_state()
    } else if st && ci {
        // Region deliberately not consulted here.
        in_state() && in_city()
    } else if reg && ci {
        in_region() && in_city()
    } else if reg && st {
        in_region() && in_state()
    } else if ci {
        in_city()
    } else {
        in_region() && in_state() && in_city()
    }
}

// ---------------------------------------------------------------------------
// Cascading widget options
// ---------------------------------------------------------------------------

/// Values offered at each hierarchy level given the levels above it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyOptions {
    pub regions: BTreeSet<String>,
    pub states: BTreeSet<String>,
    pub cities: BTreeSet<String>,
}

impl HierarchyOptions {
    /// Regions come from `records`; states from the region-restricted set;
    /// cities from the region- and state-restricted set.
    pub fn compute(records: &[Record], selection: &FilterSelection) -> Self {
        let mut opts = HierarchyOptions::default();
        for r in records {
            opts.regions.insert(r.region.clone());
            if !selection.regions.is_empty() && !selection.regions.contains(&r.region) {
                continue;
            }
            opts.states.insert(r.state.clone());
            if !selection.states.is_empty() && !selection.states.contains(&r.state) {
                continue;
            }
            opts.cities.insert(r.city.clone());
        }
        opts
    }

    /// Drop selected values that are no longer offered. Returns `true` if
    /// anything was removed.
    pub fn prune(&self, selection: &mut FilterSelection) -> bool {
        let before = (
            selection.regions.len(),
            selection.states.len(),
            selection.cities.len(),
        );
        selection.regions.retain(|v| self.regions.contains(v));
        selection.states.retain(|v| self.states.contains(v));
        selection.cities.retain(|v| self.cities.contains(v));
        before
            != (
                selection.regions.len(),
                selection.states.len(),
                selection.cities.len(),
            )
    }
}
