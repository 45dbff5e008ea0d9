//! Series construction for every workout of an export.

use crate::pool::{PoolConfig, WorkerPool};
use crate::progress::ProgressSink;
use crate::series::{build_workout_series, SeriesOptions, WorkoutSeries};
use crate::types::{Record, Workout};
use crate::{Error, Result};
use std::sync::Arc;

/// Build one [`WorkoutSeries`] per workout on a bounded worker pool
///
/// Every workout appears exactly once in the output. If one workout fails,
/// the whole batch fails with [`Error::Workout`] naming it.
pub fn build_all_workout_series(
    workouts: &[Arc<Workout>],
    records: &[Arc<Record>],
    pool: &PoolConfig,
    options: &SeriesOptions,
    progress: &dyn ProgressSink,
) -> Result<Vec<WorkoutSeries>> {
    options.validate()?;

    tracing::info!(
        "Building series for {} workouts from {} records",
        workouts.len(),
        records.len()
    );

    let workers = WorkerPool::new(pool)?;
    let bundles = workers.run("Workout", workouts, progress, |index, workout| {
        build_workout_series(workout, records, options).map_err(|e| Error::Workout {
            index,
            activity_type: workout.activity_type().to_string(),
            start: workout.start_date().to_rfc3339(),
            source: Box::new(e),
        })
    })?;

    let empty = bundles.iter().filter(|b| b.is_empty()).count();
    if empty > 0 {
        tracing::debug!("{} workouts have no records in their window", empty);
    }

    Ok(bundles)
}
