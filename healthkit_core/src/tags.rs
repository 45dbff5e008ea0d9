//! Tag dump reader.
//!
//! The XML reader hands tags over as JSON Lines, one tag per line:
//!
//! ```text
//! {"tag":"Record","attributes":{"type":"HKQuantityTypeIdentifierHeartRate", ...}}
//! {"tag":"Workout","attributes":{"workoutActivityType":"HKWorkoutActivityTypeRunning", ...}}
//! ```
//!
//! Tags other than `Record` and `Workout` are skipped. A line that is not a
//! valid tag fails the read, so a truncated dump is never taken as complete.

use crate::types::Attributes;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// One line of the dump
#[derive(Debug, Serialize, Deserialize)]
pub struct TagLine {
    pub tag: String,
    pub attributes: Attributes,
}

/// Attribute maps of a dump, split by tag kind
#[derive(Debug, Default)]
pub struct TagDump {
    pub records: Vec<Attributes>,
    pub workouts: Vec<Attributes>,
    /// Lines with any other tag name
    pub skipped: usize,
}

impl TagDump {
    fn push(&mut self, line: TagLine) {
        match line.tag.as_str() {
            "Record" => self.records.push(line.attributes),
            "Workout" => self.workouts.push(line.attributes),
            other => {
                tracing::trace!("Skipping {} tag", other);
                self.skipped += 1;
            }
        }
    }
}

/// Read every tag of a dump from `path`
pub fn read_tag_dump(path: &Path) -> Result<TagDump> {
    let file = File::open(path)?;
    let dump = read_tag_lines(BufReader::new(file))?;
    tracing::info!(
        "Read {} records and {} workouts from {:?}",
        dump.records.len(),
        dump.workouts.len(),
        path
    );
    Ok(dump)
}

/// Read tags from any buffered reader
pub fn read_tag_lines<R: BufRead>(reader: R) -> Result<TagDump> {
    let mut dump = TagDump::default();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        let tag: TagLine = serde_json::from_str(&line).map_err(|e| Error::TagDump {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        dump.push(tag);
    }

    if dump.skipped > 0 {
        tracing::debug!("Skipped {} tags of other kinds", dump.skipped);
    }
    Ok(dump)
}

/// Write tags as JSON Lines, the inverse of [`read_tag_lines`]
pub fn write_tag_lines<W: Write>(mut writer: W, tags: &[TagLine]) -> Result<()> {
    for tag in tags {
        let line = serde_json::to_string(tag)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
