use std::collections::BTreeMap;

use crate::models::{AggregatedSeries, Record, YearPoint};

/// Yearly arithmetic mean of the positive and negative composites.
///
/// Years with no matching records are omitted, never zero-filled; a gap in
/// the series means a gap in the data. Unscoreable records (non-finite
/// composite) are skipped, so the output carries no NaN.
pub fn aggregate(subset: &[&Record]) -> AggregatedSeries {
    let mut groups: BTreeMap<i32, (f64, f64, usize)> = BTreeMap::new();
    for record in subset {
        if !record.is_scoreable() {
            continue;
        }
        let entry = groups.entry(record.year()).or_insert((0.0, 0.0, 0));
        entry.0 += record.positive;
        entry.1 += record.negative;
        entry.2 += 1;
    }

    groups
        .into_iter()
        .map(|(year, (pos, neg, n))| YearPoint {
            year,
            positive: pos / n as f64,
            negative: neg / n as f64,
        })
        .collect()
}
