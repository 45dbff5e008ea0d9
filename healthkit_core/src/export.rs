//! Export of workout series to CSV and a JSON summary.
//!
//! Files are written to a temp file in the target directory, synced, and
//! then renamed over the destination so a crash never leaves half a file.

use crate::series::{Series, WorkoutSeries};
use crate::types::Workout;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the series CSV
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "type")]
    rec_type: &'a str,
    timestamp: String,
    value: String,
    unit: Option<&'a str>,
}

/// Per-workout overview written to `summary.json`
#[derive(Clone, Debug, Serialize)]
pub struct WorkoutSummary {
    pub activity_type: String,
    pub source_name: String,
    pub start: String,
    pub end: String,
    pub duration: f64,
    pub duration_unit: String,
    pub records: BTreeMap<String, usize>,
    pub series: BTreeMap<String, usize>,
    pub units: BTreeMap<String, Option<String>>,
}

impl From<&WorkoutSeries> for WorkoutSummary {
    fn from(bundle: &WorkoutSeries) -> Self {
        let w = &bundle.workout;
        WorkoutSummary {
            activity_type: w.activity_type().to_string(),
            source_name: w.source_name().to_string(),
            start: w.start_date().to_rfc3339(),
            end: w.end_date().to_rfc3339(),
            duration: w.duration(),
            duration_unit: w.duration_unit().to_string(),
            records: bundle
                .records
                .iter()
                .map(|(k, v)| (k.clone(), v.len()))
                .collect(),
            series: bundle
                .timeseries
                .iter()
                .map(|(k, s)| (k.clone(), s.len()))
                .collect(),
            units: bundle.units.clone(),
        }
    }
}

/// Summaries ordered by workout start
pub fn summarize(bundles: &[WorkoutSeries]) -> Vec<WorkoutSummary> {
    let mut ordered: Vec<&WorkoutSeries> = bundles.iter().collect();
    ordered.sort_by_key(|b| b.workout.start_date());
    ordered.into_iter().map(WorkoutSummary::from).collect()
}

/// File name for a workout's series CSV, e.g. `003_Running_20200501T100000.csv`
pub fn series_file_name(index: usize, workout: &Workout) -> String {
    let activity = workout
        .activity_type()
        .trim_start_matches("HKWorkoutActivityType");
    let activity: String = activity
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!(
        "{:03}_{}_{}.csv",
        index,
        activity,
        workout.start_date().format("%Y%m%dT%H%M%S")
    )
}

/// Write every series of a bundle as `type,timestamp,value,unit` rows
///
/// Rows are grouped by type (alphabetical) and ordered by time within a type.
/// Returns the number of rows written.
pub fn write_series_csv(bundle: &WorkoutSeries, path: &Path) -> Result<usize> {
    let temp = temp_file_for(path)?;
    let mut writer = csv::Writer::from_writer(temp.as_file());
    let mut rows = 0;

    for (rec_type, series) in &bundle.timeseries {
        let unit = bundle.units.get(rec_type).and_then(|u| u.as_deref());
        match series {
            Series::Numeric(points) => {
                for (at, value) in points {
                    writer.serialize(CsvRow {
                        rec_type,
                        timestamp: at.to_rfc3339(),
                        value: value.to_string(),
                        unit,
                    })?;
                    rows += 1;
                }
            }
            Series::Categorical(points) => {
                for (at, value) in points {
                    writer.serialize(CsvRow {
                        rec_type,
                        timestamp: at.to_rfc3339(),
                        value: value.to_string(),
                        unit,
                    })?;
                    rows += 1;
                }
            }
        }
    }

    writer.flush()?;
    drop(writer);
    persist(temp, path)?;

    tracing::debug!("Wrote {} series rows to {:?}", rows, path);
    Ok(rows)
}

/// Write summaries as pretty JSON
pub fn write_summary_json(summaries: &[WorkoutSummary], path: &Path) -> Result<()> {
    let temp = temp_file_for(path)?;
    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, summaries)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    persist(temp, path)?;

    tracing::info!("Saved summary of {} workouts to {:?}", summaries.len(), path);
    Ok(())
}

fn temp_file_for(path: &Path) -> Result<NamedTempFile> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    Ok(NamedTempFile::new_in(parent)?)
}

fn persist(temp: NamedTempFile, path: &Path) -> Result<()> {
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
