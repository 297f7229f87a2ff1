//! Core engine for an interactive sentiment explorer: an immutable record
//! store, a validated filter state machine, yearly mean-sentiment
//! aggregation, and a translator that turns free-text requests into filter
//! updates by way of a language model.
//!
//! Rendering, widget layout, and transport live elsewhere; this crate
//! exposes plain values (a filter state, an aggregated series) and consumes
//! plain events (filter changes, chat text).

pub mod aggregate;
pub mod config;
pub mod context;
pub mod filter;
pub mod llm;
pub mod models;
pub mod prompts;
pub mod state;
pub mod store;
pub mod translate;

pub use context::ExplorerContext;
pub use models::{
    AggregatedSeries, ChatOutcome, FilterState, FilterUpdate, RejectReason, Selection,
    ValidationError, YearPoint, YearRange,
};
