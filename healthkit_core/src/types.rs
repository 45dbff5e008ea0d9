//! Core domain types for the health export pipeline.
//!
//! This module defines the two leaf entities read from an export:
//! - Records (one logged measurement, quantity or category)
//! - Workouts (one logged exercise session with summary metrics)
//!
//! Both are built from a raw attribute map and never change afterwards.

use crate::loader::FromAttributes;
use crate::timestamp::parse_timestamp;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Raw attributes of one export tag, as handed over by the XML reader
pub type Attributes = HashMap<String, String>;

// ============================================================================
// Attribute helpers
// ============================================================================

fn required<'a>(attrs: &'a Attributes, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::MissingField(key.to_string()))
}

fn optional(attrs: &Attributes, key: &str) -> Option<String> {
    attrs.get(key).cloned()
}

fn required_number(attrs: &Attributes, key: &str) -> Result<f64> {
    parse_number(key, required(attrs, key)?)
}

fn required_timestamp(attrs: &Attributes, key: &str) -> Result<DateTime<FixedOffset>> {
    parse_timestamp(key, required(attrs, key)?)
}

pub(crate) fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::MalformedValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

// ============================================================================
// Record
// ============================================================================

/// Value carried by a record
///
/// A record with a unit is a quantity; a record without one is categorical
/// and keeps the label exactly as exported.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Quantity(f64),
    Category(String),
}

impl RecordValue {
    /// Numeric view of the value, parsing categorical labels if needed
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            RecordValue::Quantity(v) => Ok(*v),
            RecordValue::Category(label) => parse_number("value", label),
        }
    }

    pub fn as_quantity(&self) -> Option<f64> {
        match self {
            RecordValue::Quantity(v) => Some(*v),
            RecordValue::Category(_) => None,
        }
    }
}

impl fmt::Display for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Quantity(v) => write!(f, "{}", v),
            RecordValue::Category(label) => f.write_str(label),
        }
    }
}

/// One logged health measurement
#[derive(Clone, Debug, Serialize)]
pub struct Record {
    rec_type: String,
    source_name: String,
    source_version: String,
    device: Option<String>,
    unit: Option<String>,
    creation_date: DateTime<FixedOffset>,
    start_date: DateTime<FixedOffset>,
    end_date: DateTime<FixedOffset>,
    value: RecordValue,
}

impl Record {
    /// Build a record from the attributes of a `Record` tag
    pub fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let rec_type = required(attrs, "type")?.to_string();
        let source_name = required(attrs, "sourceName")?.to_string();
        let unit = optional(attrs, "unit");
        let creation_date = required_timestamp(attrs, "creationDate")?;
        let start_date = required_timestamp(attrs, "startDate")?;
        let end_date = required_timestamp(attrs, "endDate")?;

        let raw_value = required(attrs, "value")?;
        let value = match unit {
            Some(_) => RecordValue::Quantity(parse_number("value", raw_value)?),
            None => RecordValue::Category(raw_value.to_string()),
        };

        Ok(Self {
            rec_type,
            source_name,
            source_version: required(attrs, "sourceVersion")?.to_string(),
            device: optional(attrs, "device"),
            unit,
            creation_date,
            start_date,
            end_date,
            value,
        })
    }

    pub fn rec_type(&self) -> &str {
        &self.rec_type
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_version(&self) -> &str {
        &self.source_version
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Unit of measure; `None` marks a categorical record
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    pub fn creation_date(&self) -> DateTime<FixedOffset> {
        self.creation_date
    }

    pub fn start_date(&self) -> DateTime<FixedOffset> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<FixedOffset> {
        self.end_date
    }

    pub fn value(&self) -> &RecordValue {
        &self.value
    }

    pub fn is_categorical(&self) -> bool {
        self.unit.is_none()
    }
}

impl FromAttributes for Record {
    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        Record::from_attributes(attrs)
    }
}

// ============================================================================
// Workout
// ============================================================================

/// One logged exercise session
#[derive(Clone, Debug, Serialize)]
pub struct Workout {
    activity_type: String,
    duration: f64,
    duration_unit: String,
    total_distance: f64,
    total_distance_unit: String,
    total_energy_burned: f64,
    total_energy_burned_unit: String,
    source_name: String,
    source_version: String,
    device: Option<String>,
    creation_date: DateTime<FixedOffset>,
    start_date: DateTime<FixedOffset>,
    end_date: DateTime<FixedOffset>,
}

impl Workout {
    /// Build a workout from the attributes of a `Workout` tag
    ///
    /// Fails with `MalformedTimestamp` when `endDate` precedes `startDate`.
    pub fn from_attributes(attrs: &Attributes) -> Result<Self> {
        let start_date = required_timestamp(attrs, "startDate")?;
        let end_date = required_timestamp(attrs, "endDate")?;
        if end_date < start_date {
            return Err(Error::MalformedTimestamp {
                field: "endDate".into(),
                value: format!("{} (before startDate {})", end_date, start_date),
            });
        }

        Ok(Self {
            activity_type: required(attrs, "workoutActivityType")?.to_string(),
            duration: required_number(attrs, "duration")?,
            duration_unit: required(attrs, "durationUnit")?.to_string(),
            total_distance: required_number(attrs, "totalDistance")?,
            total_distance_unit: required(attrs, "totalDistanceUnit")?.to_string(),
            total_energy_burned: required_number(attrs, "totalEnergyBurned")?,
            total_energy_burned_unit: required(attrs, "totalEnergyBurnedUnit")?.to_string(),
            source_name: required(attrs, "sourceName")?.to_string(),
            source_version: required(attrs, "sourceVersion")?.to_string(),
            device: optional(attrs, "device"),
            creation_date: required_timestamp(attrs, "creationDate")?,
            start_date,
            end_date,
        })
    }

    pub fn activity_type(&self) -> &str {
        &self.activity_type
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn duration_unit(&self) -> &str {
        &self.duration_unit
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn total_distance_unit(&self) -> &str {
        &self.total_distance_unit
    }

    pub fn total_energy_burned(&self) -> f64 {
        self.total_energy_burned
    }

    pub fn total_energy_burned_unit(&self) -> &str {
        &self.total_energy_burned_unit
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn source_version(&self) -> &str {
        &self.source_version
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn creation_date(&self) -> DateTime<FixedOffset> {
        self.creation_date
    }

    pub fn start_date(&self) -> DateTime<FixedOffset> {
        self.start_date
    }

    pub fn end_date(&self) -> DateTime<FixedOffset> {
        self.end_date
    }

    /// Whether `instant` lies inside the session window, both ends inclusive
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.start_date <= instant && instant <= self.end_date
    }
}

impl FromAttributes for Workout {
    fn from_attributes(attrs: &Attributes) -> Result<Self> {
        Workout::from_attributes(attrs)
    }
}
