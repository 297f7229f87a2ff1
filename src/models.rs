use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One sentiment observation as scored by the upstream pipeline.
///
/// `positive`/`negative` are derived at load time: each is the mean of the
/// *finite* raw scores in its group, NaN when the whole group is missing.
#[derive(Debug, Clone)]
pub struct Record {
    pub date: NaiveDate,
    pub source_type: String,
    pub publisher: String,
    pub happiness: f64,
    pub love: f64,
    pub surprise: f64,
    pub anger: f64,
    pub disgust: f64,
    pub fear: f64,
    pub sadness: f64,
    pub positive: f64,
    pub negative: f64,
}

impl Record {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Whether the record can take part in aggregation. Records that lost a
    /// whole score group upstream stay in the store but are never averaged,
    /// so the output series stays NaN-free.
    pub fn is_scoreable(&self) -> bool {
        self.positive.is_finite() && self.negative.is_finite()
    }
}

/// One filter dimension: the wildcard or a single category label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Selection {
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(s) => s == label,
        }
    }
}

impl From<String> for Selection {
    fn from(s: String) -> Self {
        if s == "All" {
            Selection::All
        } else {
            Selection::Only(s)
        }
    }
}

impl From<Selection> for String {
    fn from(s: Selection) -> String {
        match s {
            Selection::All => "All".to_string(),
            Selection::Only(v) => v,
        }
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::All => write!(f, "All"),
            Selection::Only(v) => write!(f, "{}", v),
        }
    }
}

/// Inclusive calendar-year span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

impl YearRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// Normalize an arbitrary pair into `bounds`: swap if inverted, then
    /// clamp both ends. The result always satisfies the state invariant.
    pub fn clamped_to(self, bounds: YearRange) -> YearRange {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        YearRange {
            min: lo.clamp(bounds.min, bounds.max),
            max: hi.clamp(bounds.min, bounds.max),
        }
    }
}

/// The current selection. Value type; transitions replace it wholesale, so a
/// reader never sees a half-applied update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub source_type: Selection,
    pub publisher: Selection,
    pub years: YearRange,
}

impl FilterState {
    /// Both wildcards over the full data range.
    pub fn wide_open(bounds: YearRange) -> Self {
        Self {
            source_type: Selection::All,
            publisher: Selection::All,
            years: bounds,
        }
    }
}

/// Partial change to the filter state. Also the shape the language model is
/// asked to reply with; an absent key means "leave that dimension alone".
/// Unknown keys in a reply are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_range: Option<(i32, i32)>,
}

impl FilterUpdate {
    pub fn is_empty(&self) -> bool {
        self.source_type.is_none() && self.publisher.is_none() && self.year_range.is_none()
    }
}

/// One point of the yearly output series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearPoint {
    pub year: i32,
    pub positive: f64,
    pub negative: f64,
}

/// Yearly mean-sentiment series, ascending by year. Empty when nothing
/// matches the active filter.
pub type AggregatedSeries = Vec<YearPoint>;

/// Why a chat-proposed update was refused. A single bad field rejects the
/// whole update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown source type '{0}'")]
    UnknownSourceType(String),
    #[error("unknown publisher '{0}'")]
    UnknownPublisher(String),
    #[error("year {year} is outside the data range {min}-{max}")]
    YearOutOfBounds { year: i32, min: i32, max: i32 },
    #[error("year range {min}-{max} is inverted")]
    InvertedYearRange { min: i32, max: i32 },
}

/// Result of one chat submission.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Applied {
        state: FilterState,
        raw_reply: String,
    },
    Rejected {
        reason: RejectReason,
        raw_reply: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Transport failure, timeout, or non-success response from the provider.
    ServiceUnavailable,
    /// Reply was not the expected JSON object.
    MalformedReply,
    /// Reply parsed but a field failed validation.
    InvalidUpdate(ValidationError),
}

impl RejectReason {
    /// Stable code for the UI layer; Display carries the detail.
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::ServiceUnavailable => "service_unavailable",
            RejectReason::MalformedReply => "malformed_reply",
            RejectReason::InvalidUpdate(_) => "invalid_update",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::ServiceUnavailable => {
                write!(f, "language model service unavailable")
            }
            RejectReason::MalformedReply => {
                write!(f, "could not interpret the reply as filter changes")
            }
            RejectReason::InvalidUpdate(e) => write!(f, "{}", e),
        }
    }
}
