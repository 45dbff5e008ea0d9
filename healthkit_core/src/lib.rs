#![forbid(unsafe_code)]

//! Core pipeline for turning a health data export into per-workout series.
//!
//! This crate provides:
//! - Domain types (records, workouts)
//! - Concurrent tag loading from attribute maps
//! - Workout/record association and series building
//! - Tag dump input, CSV/JSON export, configuration

pub mod types;
pub mod error;
pub mod timestamp;
pub mod progress;
pub mod pool;
pub mod loader;
pub mod series;
pub mod batch;
pub mod tags;
pub mod export;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use pool::{PoolConfig, WorkerPool};
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use loader::{load_records, load_tags, load_workouts, FromAttributes};
pub use series::{
    build_workout_series, Series, SeriesOptions, SourceFilter, TypeMatch, WorkoutSeries,
};
pub use batch::build_all_workout_series;
pub use tags::{read_tag_dump, TagDump};
