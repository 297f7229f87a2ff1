use std::collections::BTreeSet;

use tracing::info;

use crate::models::{FilterState, FilterUpdate, Selection, ValidationError, YearRange};
use crate::store::RecordStore;

/// Owns the single authoritative filter state. All mutation funnels through
/// the two apply paths below; between calls the held state always satisfies
/// the invariants (ordered year range within global bounds), so readers never
/// observe anything half-applied.
pub struct FilterStateMachine {
    state: FilterState,
    bounds: YearRange,
    source_types: BTreeSet<String>,
    publishers: BTreeSet<String>,
}

impl FilterStateMachine {
    /// Starts wide open over the store's full year range.
    pub fn new(store: &RecordStore) -> Self {
        let bounds = store.bounds();
        Self {
            state: FilterState::wide_open(bounds),
            bounds,
            source_types: store.source_types().clone(),
            publishers: store.publishers().clone(),
        }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn bounds(&self) -> YearRange {
        self.bounds
    }

    pub fn source_types(&self) -> &BTreeSet<String> {
        &self.source_types
    }

    pub fn publishers(&self) -> &BTreeSet<String> {
        &self.publishers
    }

    /// UI-origin change. The controls constrain their own input domain, so
    /// labels are committed as-is and a stray year range is clamped into the
    /// global bounds rather than rejected. Never fails.
    pub fn apply_direct(&mut self, update: FilterUpdate) -> FilterState {
        let mut next = self.state.clone();
        if let Some(label) = update.source_type {
            next.source_type = Selection::from(label);
        }
        if let Some(label) = update.publisher {
            next.publisher = Selection::from(label);
        }
        if let Some((lo, hi)) = update.year_range {
            next.years = YearRange::new(lo, hi).clamped_to(self.bounds);
        }
        self.commit(next, "direct")
    }

    /// Chat-origin change. Every present field must pass membership and
    /// bounds validation; the first violation rejects the whole update and
    /// the current state stays untouched.
    pub fn apply_from_chat(
        &mut self,
        update: FilterUpdate,
    ) -> Result<FilterState, ValidationError> {
        let mut next = self.state.clone();

        if let Some(label) = &update.source_type {
            next.source_type = if label == "All" {
                Selection::All
            } else if self.source_types.contains(label) {
                Selection::Only(label.clone())
            } else {
                return Err(ValidationError::UnknownSourceType(label.clone()));
            };
        }

        if let Some(label) = &update.publisher {
            next.publisher = if label == "All" {
                Selection::All
            } else if self.publishers.contains(label) {
                Selection::Only(label.clone())
            } else {
                return Err(ValidationError::UnknownPublisher(label.clone()));
            };
        }

        if let Some((lo, hi)) = update.year_range {
            if lo > hi {
                return Err(ValidationError::InvertedYearRange { min: lo, max: hi });
            }
            for year in [lo, hi] {
                if !self.bounds.contains(year) {
                    return Err(ValidationError::YearOutOfBounds {
                        year,
                        min: self.bounds.min,
                        max: self.bounds.max,
                    });
                }
            }
            next.years = YearRange::new(lo, hi);
        }

        Ok(self.commit(next, "chat"))
    }

    fn commit(&mut self, next: FilterState, origin: &str) -> FilterState {
        debug_assert!(next.years.min <= next.years.max);
        debug_assert!(self.bounds.contains(next.years.min) && self.bounds.contains(next.years.max));
        if next != self.state {
            info!(
                "Filter state committed - origin={}, source_type={}, publisher={}, years={}-{}",
                origin, next.source_type, next.publisher, next.years.min, next.years.max
            );
        }
        self.state = next;
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RawRecord, RecordStore};

    fn row(date: &str, source_type: &str, publisher: &str) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            source_type: source_type.to_string(),
            publisher: publisher.to_string(),
            happiness: Some(0.5),
            love: Some(0.5),
            surprise: Some(0.5),
            anger: Some(0.5),
            disgust: Some(0.5),
            fear: Some(0.5),
            sadness: Some(0.5),
        }
    }

    fn machine() -> FilterStateMachine {
        let store = RecordStore::from_rows(vec![
            row("2015-01-01", "News", "The Daily"),
            row("2019-06-15", "Blog", "Substack A"),
            row("2023-12-31", "News", "The Herald"),
        ])
        .unwrap();
        FilterStateMachine::new(&store)
    }

    #[test]
    fn starts_wide_open_over_global_bounds() {
        let m = machine();
        assert_eq!(m.state(), &FilterState::wide_open(YearRange::new(2015, 2023)));
    }

    #[test]
    fn direct_update_clamps_years_into_bounds() {
        let mut m = machine();
        let state = m.apply_direct(FilterUpdate {
            year_range: Some((1990, 2050)),
            ..Default::default()
        });
        assert_eq!(state.years, YearRange::new(2015, 2023));
    }

    #[test]
    fn direct_update_normalizes_an_inverted_pair() {
        let mut m = machine();
        let state = m.apply_direct(FilterUpdate {
            year_range: Some((2021, 2017)),
            ..Default::default()
        });
        assert_eq!(state.years, YearRange::new(2017, 2021));
    }

    #[test]
    fn direct_update_is_idempotent() {
        let mut m = machine();
        let update = FilterUpdate {
            source_type: Some("News".to_string()),
            year_range: Some((2016, 2020)),
            ..Default::default()
        };
        let once = m.apply_direct(update.clone());
        let twice = m.apply_direct(update);
        assert_eq!(once, twice);
    }

    #[test]
    fn chat_update_rejects_unknown_publisher_atomically() {
        let mut m = machine();
        let before = m.state().clone();
        let err = m
            .apply_from_chat(FilterUpdate {
                source_type: Some("News".to_string()),
                publisher: Some("Nonexistent Weekly".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownPublisher("Nonexistent Weekly".to_string())
        );
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn chat_update_rejects_out_of_bounds_years() {
        let mut m = machine();
        let before = m.state().clone();
        let err = m
            .apply_from_chat(FilterUpdate {
                year_range: Some((1990, 2000)),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ValidationError::YearOutOfBounds { year: 1990, .. }));
        assert_eq!(m.state(), &before);
    }

    #[test]
    fn chat_update_rejects_inverted_range() {
        let mut m = machine();
        let err = m
            .apply_from_chat(FilterUpdate {
                year_range: Some((2021, 2017)),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, ValidationError::InvertedYearRange { min: 2021, max: 2017 });
    }

    #[test]
    fn chat_update_applies_all_fields_together() {
        let mut m = machine();
        let state = m
            .apply_from_chat(FilterUpdate {
                source_type: Some("Blog".to_string()),
                publisher: Some("All".to_string()),
                year_range: Some((2018, 2020)),
            })
            .unwrap();
        assert_eq!(state.source_type, Selection::Only("Blog".to_string()));
        assert_eq!(state.publisher, Selection::All);
        assert_eq!(state.years, YearRange::new(2018, 2020));
    }

    #[test]
    fn empty_chat_update_keeps_the_state() {
        let mut m = machine();
        let before = m.state().clone();
        let after = m.apply_from_chat(FilterUpdate::default()).unwrap();
        assert_eq!(after, before);
    }
}
