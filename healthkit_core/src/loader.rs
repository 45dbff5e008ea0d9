//! Tag loading: raw attribute maps to typed records and workouts.
//!
//! Construction runs on a bounded worker pool because full exports hold
//! millions of records. One malformed tag fails the whole load.

use crate::pool::{PoolConfig, WorkerPool};
use crate::progress::ProgressSink;
use crate::types::{Attributes, Record, Workout};
use crate::{Error, Result};
use std::sync::Arc;

/// Types that can be built from the attributes of one export tag
pub trait FromAttributes: Sized {
    fn from_attributes(attrs: &Attributes) -> Result<Self>;
}

/// Convert every attribute map of one tag kind
///
/// A construction failure is reported as [`Error::Tag`] carrying the tag
/// label and the index of the offending item.
pub fn load_tags<T>(
    items: &[Attributes],
    label: &str,
    pool: &PoolConfig,
    progress: &dyn ProgressSink,
) -> Result<Vec<T>>
where
    T: FromAttributes + Send,
{
    tracing::debug!("Loading {} {} tags", items.len(), label);

    let workers = WorkerPool::new(pool)?;
    let loaded = workers.run(label, items, progress, |index, attrs| {
        T::from_attributes(attrs).map_err(|e| Error::Tag {
            tag: label.to_string(),
            index,
            source: Box::new(e),
        })
    })?;

    tracing::info!("Loaded {} {} tags", loaded.len(), label);
    Ok(loaded)
}

/// Load `Record` tags into shared records
pub fn load_records(
    items: &[Attributes],
    pool: &PoolConfig,
    progress: &dyn ProgressSink,
) -> Result<Vec<Arc<Record>>> {
    let records: Vec<Record> = load_tags(items, "Record", pool, progress)?;
    Ok(records.into_iter().map(Arc::new).collect())
}

/// Load `Workout` tags into shared workouts
pub fn load_workouts(
    items: &[Attributes],
    pool: &PoolConfig,
    progress: &dyn ProgressSink,
) -> Result<Vec<Arc<Workout>>> {
    let workouts: Vec<Workout> = load_tags(items, "Workout", pool, progress)?;
    Ok(workouts.into_iter().map(Arc::new).collect())
}
