//! Per-workout time series construction.
//!
//! For one workout, this module:
//! - Selects the records whose start falls inside the workout window
//! - Groups them by record type, keeping every record for audit
//! - Builds one time-ordered series per type, optionally restricted to
//!   a set of sources and with duplicate timestamps collapsed

use crate::types::{Record, RecordValue, Workout};
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

// ============================================================================
// Options
// ============================================================================

/// Which record sources feed the series
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SourceFilter {
    /// No restriction
    #[default]
    All,
    /// Only records whose source name is in the set
    Only(BTreeSet<String>),
}

impl SourceFilter {
    /// Restrict series to the given source names
    ///
    /// An empty list is rejected; use [`SourceFilter::All`] for no restriction.
    pub fn only<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        let filter = SourceFilter::Only(names);
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            SourceFilter::All => Ok(()),
            SourceFilter::Only(names) if names.is_empty() => Err(Error::InvalidArgument(
                "source filter must name at least one source".into(),
            )),
            SourceFilter::Only(names) if names.iter().any(|n| n.trim().is_empty()) => Err(
                Error::InvalidArgument("source filter contains a blank source name".into()),
            ),
            SourceFilter::Only(_) => Ok(()),
        }
    }

    pub fn accepts(&self, source_name: &str) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(names) => names.contains(source_name),
        }
    }
}

/// How records are matched to a type group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TypeMatch {
    /// Record type must equal the group key byte for byte
    #[default]
    Exact,
    /// Record type only has to contain the group key. Older tooling grouped
    /// this way, so a key like "Rate" also absorbs "HeartRate" records.
    Substring,
}

impl TypeMatch {
    pub fn matches(self, key: &str, rec_type: &str) -> bool {
        match self {
            TypeMatch::Exact => key == rec_type,
            TypeMatch::Substring => rec_type.contains(key),
        }
    }
}

/// Options for building workout series
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeriesOptions {
    /// Collapse series entries that share a timestamp, keeping the first
    pub remove_duplicates: bool,
    pub sources: SourceFilter,
    pub type_match: TypeMatch,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            sources: SourceFilter::All,
            type_match: TypeMatch::Exact,
        }
    }
}

impl SeriesOptions {
    pub fn validate(&self) -> Result<()> {
        self.sources.validate()
    }
}

// ============================================================================
// Output
// ============================================================================

/// Time-ordered values of one record type
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum Series {
    Numeric(Vec<(DateTime<FixedOffset>, f64)>),
    Categorical(Vec<(DateTime<FixedOffset>, RecordValue)>),
}

impl Series {
    pub fn len(&self) -> usize {
        match self {
            Series::Numeric(points) => points.len(),
            Series::Categorical(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, Series::Categorical(_))
    }

    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        match self {
            Series::Numeric(points) => points.iter().map(|(t, _)| *t).collect(),
            Series::Categorical(points) => points.iter().map(|(t, _)| *t).collect(),
        }
    }

    pub fn as_numeric(&self) -> Option<&[(DateTime<FixedOffset>, f64)]> {
        match self {
            Series::Numeric(points) => Some(points),
            Series::Categorical(_) => None,
        }
    }

    /// Drop later points sharing a timestamp with an earlier one
    ///
    /// Points must already be sorted by time, so equal instants are adjacent.
    fn dedup_timestamps(&mut self) {
        match self {
            Series::Numeric(points) => points.dedup_by(|later, first| later.0 == first.0),
            Series::Categorical(points) => points.dedup_by(|later, first| later.0 == first.0),
        }
    }
}

/// Records and series that belong to one workout
#[derive(Clone, Debug)]
pub struct WorkoutSeries {
    pub workout: Arc<Workout>,
    /// Every record inside the window, grouped by type
    pub records: BTreeMap<String, Vec<Arc<Record>>>,
    /// Series per type; a type is missing when the source filter removed all of it
    pub timeseries: BTreeMap<String, Series>,
    /// Unit of the first record of each type
    pub units: BTreeMap<String, Option<String>>,
}

impl WorkoutSeries {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Series named like a category type keep their original values
pub fn is_category_type(rec_type: &str) -> bool {
    rec_type.to_lowercase().contains("category")
}

/// Build the series bundle for one workout
pub fn build_workout_series(
    workout: &Arc<Workout>,
    records: &[Arc<Record>],
    options: &SeriesOptions,
) -> Result<WorkoutSeries> {
    options.validate()?;

    let mut inside: Vec<&Arc<Record>> = records
        .iter()
        .filter(|r| workout.contains(r.start_date()))
        .collect();
    // Stable, so equal start times keep input order
    inside.sort_by_key(|r| r.start_date());

    let keys: BTreeSet<&str> = inside.iter().map(|r| r.rec_type()).collect();

    let mut by_type = BTreeMap::new();
    let mut timeseries = BTreeMap::new();
    let mut units = BTreeMap::new();

    for key in keys {
        let group: Vec<Arc<Record>> = inside
            .iter()
            .filter(|r| options.type_match.matches(key, r.rec_type()))
            .map(|r| Arc::clone(r))
            .collect();

        // Exact matching always yields at least the record that produced `key`
        let Some(first) = group.first() else {
            continue;
        };
        units.insert(key.to_string(), first.unit().map(str::to_string));

        let candidates: Vec<&Arc<Record>> = group
            .iter()
            .filter(|r| options.sources.accepts(r.source_name()))
            .collect();

        if !candidates.is_empty() {
            let mut series = to_series(key, &candidates)?;
            if options.remove_duplicates {
                series.dedup_timestamps();
            }
            timeseries.insert(key.to_string(), series);
        }

        by_type.insert(key.to_string(), group);
    }

    tracing::debug!(
        "Workout {} at {}: {} records in {} types",
        workout.activity_type(),
        workout.start_date(),
        inside.len(),
        by_type.len()
    );

    Ok(WorkoutSeries {
        workout: Arc::clone(workout),
        records: by_type,
        timeseries,
        units,
    })
}

fn to_series(key: &str, candidates: &[&Arc<Record>]) -> Result<Series> {
    if is_category_type(key) {
        return Ok(Series::Categorical(
            candidates
                .iter()
                .map(|r| (r.start_date(), r.value().clone()))
                .collect(),
        ));
    }

    let points = candidates
        .iter()
        .map(|r| {
            r.value()
                .to_f64()
                .map(|v| (r.start_date(), v))
                .map_err(|_| Error::MalformedValue {
                    field: key.to_string(),
                    value: r.value().to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Series::Numeric(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support::*;

    const HR: &str = "HKQuantityTypeIdentifierHeartRate";

    fn window() -> Arc<Workout> {
        Arc::new(workout(
            "HKWorkoutActivityTypeRunning",
            "2020-05-01 10:00:00 +0000",
            "2020-05-01 10:30:00 +0000",
        ))
    }

    fn hr(source: &str, time: &str, value: &str) -> Arc<Record> {
        Arc::new(record(HR, source, &format!("2020-05-01 {} +0000", time), value))
    }

    fn boundary_records() -> Vec<Arc<Record>> {
        vec![
            hr("A", "10:31:00", "150"),
            hr("A", "10:15:00", "140"),
            hr("A", "09:59:00", "90"),
            hr("A", "10:30:00", "145"),
            hr("A", "10:00:00", "100"),
            hr("A", "10:15:00", "141"),
        ]
    }

    #[test]
    fn test_boundaries_and_duplicates() {
        let bundle =
            build_workout_series(&window(), &boundary_records(), &SeriesOptions::default())
                .unwrap();

        assert_eq!(bundle.records[HR].len(), 4);
        let series = bundle.timeseries[HR].as_numeric().unwrap();
        assert_eq!(series.len(), 3);
        let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
        // First 10:15 record in input order wins
        assert_eq!(values, vec![100.0, 140.0, 145.0]);
        assert_eq!(bundle.units[HR].as_deref(), Some("count/min"));

        let stamps = bundle.timeseries[HR].timestamps();
        assert!(stamps.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_keep_duplicates() {
        let options = SeriesOptions {
            remove_duplicates: false,
            ..SeriesOptions::default()
        };
        let bundle = build_workout_series(&window(), &boundary_records(), &options).unwrap();
        assert_eq!(bundle.timeseries[HR].len(), 4);
        assert_eq!(bundle.timeseries[HR].len(), bundle.records[HR].len());
    }

    #[test]
    fn test_records_sorted_by_start() {
        let bundle =
            build_workout_series(&window(), &boundary_records(), &SeriesOptions::default())
                .unwrap();
        let starts: Vec<_> = bundle.records[HR].iter().map(|r| r.start_date()).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_same_instant_in_other_offset_is_duplicate() {
        let records = vec![
            hr("A", "10:10:00", "120"),
            Arc::new(record(HR, "B", "2020-05-01 12:10:00 +0200", "121")),
        ];
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();
        assert_eq!(bundle.records[HR].len(), 2);
        assert_eq!(bundle.timeseries[HR].len(), 1);
    }

    #[test]
    fn test_no_records_in_window() {
        let records = vec![hr("A", "09:00:00", "80"), hr("A", "11:00:00", "80")];
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();
        assert!(bundle.is_empty());
        assert!(bundle.timeseries.is_empty());
        assert!(bundle.units.is_empty());
    }

    #[test]
    fn test_source_filter_only_affects_series() {
        let records = vec![
            hr("Watch", "10:05:00", "120"),
            hr("Phone", "10:06:00", "121"),
            Arc::new(record(
                "HKQuantityTypeIdentifierStepCount",
                "Phone",
                "2020-05-01 10:07:00 +0000",
                "30",
            )),
        ];
        let options = SeriesOptions {
            sources: SourceFilter::only(["Watch"]).unwrap(),
            ..SeriesOptions::default()
        };
        let bundle = build_workout_series(&window(), &records, &options).unwrap();

        assert_eq!(bundle.records.len(), 2);
        assert_eq!(bundle.units.len(), 2);
        assert_eq!(bundle.records[HR].len(), 2);
        assert_eq!(bundle.timeseries[HR].len(), 1);
        assert!(!bundle
            .timeseries
            .contains_key("HKQuantityTypeIdentifierStepCount"));
        assert!(bundle
            .records
            .contains_key("HKQuantityTypeIdentifierStepCount"));
    }

    #[test]
    fn test_empty_source_filter_rejected() {
        assert!(matches!(
            SourceFilter::only(Vec::<String>::new()),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            SourceFilter::only([" "]),
            Err(Error::InvalidArgument(_))
        ));

        let options = SeriesOptions {
            sources: SourceFilter::Only(BTreeSet::new()),
            ..SeriesOptions::default()
        };
        assert!(matches!(
            build_workout_series(&window(), &boundary_records(), &options),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_category_series_keep_labels() {
        let stand = "HKCategoryTypeIdentifierAppleStandHour";
        let records = vec![Arc::new(category_record(
            stand,
            "Watch",
            "2020-05-01 10:20:00 +0000",
            "HKCategoryValueAppleStandHourStood",
        ))];
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();

        let series = &bundle.timeseries[stand];
        assert!(series.is_categorical());
        assert!(series.as_numeric().is_none());
        assert_eq!(bundle.units[stand], None);
        match series {
            Series::Categorical(points) => assert_eq!(
                points[0].1,
                RecordValue::Category("HKCategoryValueAppleStandHourStood".into())
            ),
            other => panic!("Expected categorical series, got {:?}", other),
        }
    }

    #[test]
    fn test_numeric_series_coerce_unitless_numbers() {
        let records = vec![Arc::new(category_record(
            "HKQuantityTypeIdentifierVO2Max",
            "Watch",
            "2020-05-01 10:20:00 +0000",
            "42.5",
        ))];
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();
        let points = bundle.timeseries["HKQuantityTypeIdentifierVO2Max"]
            .as_numeric()
            .unwrap();
        assert_eq!(points[0].1, 42.5);
    }

    #[test]
    fn test_non_numeric_label_in_quantity_type_fails() {
        let records = vec![Arc::new(category_record(
            "HKQuantityTypeIdentifierVO2Max",
            "Watch",
            "2020-05-01 10:20:00 +0000",
            "high",
        ))];
        assert!(matches!(
            build_workout_series(&window(), &records, &SeriesOptions::default()),
            Err(Error::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_exact_match_keeps_overlapping_names_apart() {
        let records = vec![
            Arc::new(record("Rate", "A", "2020-05-01 10:01:00 +0000", "1")),
            Arc::new(record("HeartRate", "A", "2020-05-01 10:02:00 +0000", "2")),
        ];
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();
        assert_eq!(bundle.records["Rate"].len(), 1);
        assert_eq!(bundle.records["HeartRate"].len(), 1);
    }

    #[test]
    fn test_substring_match_absorbs_longer_names() {
        let records = vec![
            Arc::new(record("Rate", "A", "2020-05-01 10:01:00 +0000", "1")),
            Arc::new(record("HeartRate", "A", "2020-05-01 10:02:00 +0000", "2")),
        ];
        let options = SeriesOptions {
            type_match: TypeMatch::Substring,
            ..SeriesOptions::default()
        };
        let bundle = build_workout_series(&window(), &records, &options).unwrap();
        assert_eq!(bundle.records["Rate"].len(), 2);
        assert_eq!(bundle.records["HeartRate"].len(), 1);
        assert_eq!(bundle.timeseries["Rate"].len(), 2);
    }

    #[test]
    fn test_bundle_shares_records() {
        let records = boundary_records();
        let bundle =
            build_workout_series(&window(), &records, &SeriesOptions::default()).unwrap();
        let grouped = &bundle.records[HR][0];
        assert!(records.iter().any(|r| Arc::ptr_eq(r, grouped)));
    }

    #[test]
    fn test_is_category_type_ignores_case() {
        assert!(is_category_type("HKCategoryTypeIdentifierSleepAnalysis"));
        assert!(is_category_type("mindful_CATEGORY"));
        assert!(!is_category_type("HKQuantityTypeIdentifierHeartRate"));
    }
}
