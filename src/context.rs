use crate::aggregate::aggregate;
use crate::filter::filter_records;
use crate::models::{AggregatedSeries, ChatOutcome, FilterState, FilterUpdate, YearRange};
use crate::state::FilterStateMachine;
use crate::store::RecordStore;
use crate::translate::Translator;

/// Process-scoped owner of the store, the state machine, and the translator.
/// Initialized once at startup, torn down at process exit. Both event
/// handlers take `&mut self`, so mutations are serialized by construction;
/// a read between them always sees the last committed state.
pub struct ExplorerContext {
    store: RecordStore,
    machine: FilterStateMachine,
    translator: Translator,
}

impl ExplorerContext {
    pub fn new(store: RecordStore, translator: Translator) -> Self {
        let machine = FilterStateMachine::new(&store);
        Self {
            store,
            machine,
            translator,
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn state(&self) -> &FilterState {
        self.machine.state()
    }

    pub fn bounds(&self) -> YearRange {
        self.machine.bounds()
    }

    /// Dropdown/slider-origin event.
    pub fn handle_filter_change(&mut self, update: FilterUpdate) -> FilterState {
        self.machine.apply_direct(update)
    }

    /// Free-text event; the one path that talks to the network. The state
    /// visible to readers does not change until the reply has been validated
    /// and committed.
    pub async fn handle_chat(&mut self, text: &str) -> ChatOutcome {
        self.translator.translate(text, &mut self.machine).await
    }

    /// Yearly series under the current filters. Pure read; never fails, an
    /// empty series just means nothing matched.
    pub fn series(&self) -> AggregatedSeries {
        aggregate(&filter_records(self.store.records(), self.machine.state()))
    }

    /// Chart-title line for the UI layer.
    pub fn headline(&self) -> String {
        let s = self.machine.state();
        format!(
            "Sentiment trends for {} by {} from {} to {}",
            s.source_type, s.publisher, s.years.min, s.years.max
        )
    }
}
