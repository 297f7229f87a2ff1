use crate::models::{FilterState, Record};

/// Subset of `records` matching `state`, in store order. Pure; an empty
/// result is a valid answer, not a failure.
pub fn filter_records<'a>(records: &'a [Record], state: &FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| matches(r, state)).collect()
}

fn matches(record: &Record, state: &FilterState) -> bool {
    state.source_type.matches(&record.source_type)
        && state.publisher.matches(&record.publisher)
        && state.years.contains(record.year())
}
