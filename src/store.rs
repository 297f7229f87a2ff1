use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::models::{Record, YearRange};

/// Row shape produced by the upstream ETL export. Field names mirror the
/// spreadsheet columns it was merged from.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Source Type")]
    pub source_type: String,
    #[serde(rename = "Publication Title")]
    pub publisher: String,
    #[serde(rename = "Happiness", default)]
    pub happiness: Option<f64>,
    #[serde(rename = "Love", default)]
    pub love: Option<f64>,
    #[serde(rename = "Surprise", default)]
    pub surprise: Option<f64>,
    #[serde(rename = "Anger", default)]
    pub anger: Option<f64>,
    #[serde(rename = "Disgust", default)]
    pub disgust: Option<f64>,
    #[serde(rename = "Fear", default)]
    pub fear: Option<f64>,
    #[serde(rename = "Sadness", default)]
    pub sadness: Option<f64>,
}

/// Immutable in-memory record table. Built once at startup; afterwards only
/// read, so it is safe to share without synchronization.
#[derive(Debug)]
pub struct RecordStore {
    records: Vec<Record>,
    bounds: YearRange,
    source_types: BTreeSet<String>,
    publishers: BTreeSet<String>,
}

impl RecordStore {
    /// Load the JSON table exported by the ETL step. Any structural problem
    /// (missing column, unparsable date, empty table) is a hard failure; the
    /// store is never half-ready.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading record table - path={}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading record table {}", path.display()))?;
        let rows: Vec<RawRecord> = serde_json::from_str(&text)
            .with_context(|| format!("decoding record table {}", path.display()))?;
        Self::from_rows(rows)
    }

    pub fn from_rows(rows: Vec<RawRecord>) -> Result<Self> {
        if rows.is_empty() {
            bail!("record table is empty; cannot derive year bounds");
        }

        let mut records = Vec::with_capacity(rows.len());
        let mut source_types = BTreeSet::new();
        let mut publishers = BTreeSet::new();
        let mut unscoreable = 0usize;

        for (i, row) in rows.into_iter().enumerate() {
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .with_context(|| format!("unparsable date '{}' in row {}", row.date, i))?;

            let positive = mean_finite(&[row.happiness, row.love, row.surprise]);
            let negative = mean_finite(&[row.anger, row.disgust, row.fear, row.sadness]);

            source_types.insert(row.source_type.clone());
            publishers.insert(row.publisher.clone());

            let record = Record {
                date,
                source_type: row.source_type,
                publisher: row.publisher,
                happiness: row.happiness.unwrap_or(f64::NAN),
                love: row.love.unwrap_or(f64::NAN),
                surprise: row.surprise.unwrap_or(f64::NAN),
                anger: row.anger.unwrap_or(f64::NAN),
                disgust: row.disgust.unwrap_or(f64::NAN),
                fear: row.fear.unwrap_or(f64::NAN),
                sadness: row.sadness.unwrap_or(f64::NAN),
                positive,
                negative,
            };
            if !record.is_scoreable() {
                unscoreable += 1;
            }
            records.push(record);
        }

        let min_year = records.iter().map(Record::year).min().unwrap();
        let max_year = records.iter().map(Record::year).max().unwrap();
        let bounds = YearRange::new(min_year, max_year);

        if unscoreable > 0 {
            warn!(
                "Records without usable scores - excluded_from_aggregation={}",
                unscoreable
            );
        }
        info!(
            "Record store ready - records={}, years={}-{}, source_types={}, publishers={}",
            records.len(),
            bounds.min,
            bounds.max,
            source_types.len(),
            publishers.len()
        );

        Ok(Self {
            records,
            bounds,
            source_types,
            publishers,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Global year bounds derived at load time.
    pub fn bounds(&self) -> YearRange {
        self.bounds
    }

    pub fn source_types(&self) -> &BTreeSet<String> {
        &self.source_types
    }

    pub fn publishers(&self) -> &BTreeSet<String> {
        &self.publishers
    }

    /// Dropdown choices for the UI layer, wildcard first.
    pub fn source_type_options(&self) -> Vec<String> {
        options_with_all(&self.source_types)
    }

    pub fn publisher_options(&self) -> Vec<String> {
        options_with_all(&self.publishers)
    }
}

fn options_with_all(labels: &BTreeSet<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(labels.len() + 1);
    out.push("All".to_string());
    out.extend(labels.iter().cloned());
    out
}

/// Mean over the finite inputs only; NaN when none are usable.
fn mean_finite(values: &[Option<f64>]) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values.iter().flatten() {
        if v.is_finite() {
            sum += v;
            n += 1;
        }
    }
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(date: &str, source_type: &str, publisher: &str, pos: f64, neg: f64) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            source_type: source_type.to_string(),
            publisher: publisher.to_string(),
            happiness: Some(pos),
            love: Some(pos),
            surprise: Some(pos),
            anger: Some(neg),
            disgust: Some(neg),
            fear: Some(neg),
            sadness: Some(neg),
        }
    }

    #[test]
    fn composites_are_means_of_finite_inputs() {
        let mut r = row("2020-05-01", "News", "The Daily", 0.6, 0.2);
        r.love = None;
        r.surprise = Some(f64::NAN);
        let store = RecordStore::from_rows(vec![r]).unwrap();
        let rec = &store.records()[0];
        assert!((rec.positive - 0.6).abs() < 1e-12);
        assert!((rec.negative - 0.2).abs() < 1e-12);
        assert!(rec.is_scoreable());
    }

    #[test]
    fn record_without_any_positive_score_is_unscoreable() {
        let mut r = row("2020-05-01", "News", "The Daily", 0.6, 0.2);
        r.happiness = None;
        r.love = None;
        r.surprise = None;
        let store = RecordStore::from_rows(vec![r]).unwrap();
        assert!(!store.records()[0].is_scoreable());
    }

    #[test]
    fn bounds_and_categories_come_from_the_data() {
        let store = RecordStore::from_rows(vec![
            row("2017-01-05", "News", "The Daily", 0.5, 0.5),
            row("2021-11-20", "Blog", "Substack A", 0.5, 0.5),
        ])
        .unwrap();
        assert_eq!(store.bounds(), YearRange::new(2017, 2021));
        assert!(store.source_types().contains("Blog"));
        assert!(store.publishers().contains("The Daily"));
        assert_eq!(store.source_type_options()[0], "All");
    }

    #[test]
    fn empty_table_is_a_hard_failure() {
        assert!(RecordStore::from_rows(Vec::new()).is_err());
    }

    #[test]
    fn bad_date_is_a_hard_failure() {
        let rows = vec![row("05/01/2020", "News", "The Daily", 0.5, 0.5)];
        let err = RecordStore::from_rows(rows).unwrap_err();
        assert!(format!("{:#}", err).contains("unparsable date"));
    }

    #[test]
    fn load_decodes_upstream_column_names() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"Date": "2019-03-01", "Source Type": "News", "Publication Title": "The Daily",
                "Happiness": 0.8, "Love": 0.8, "Surprise": 0.8,
                "Anger": 0.2, "Disgust": 0.2, "Fear": 0.2, "Sadness": 0.2}}]"#
        )
        .unwrap();
        let store = RecordStore::load(file.path()).unwrap();
        assert_eq!(store.len(), 1);
        assert!((store.records()[0].positive - 0.8).abs() < 1e-12);
    }

    #[test]
    fn load_fails_on_missing_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"Date": "2019-03-01", "Source Type": "News"}}]"#).unwrap();
        assert!(RecordStore::load(file.path()).is_err());
    }
}
