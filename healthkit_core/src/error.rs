//! Error types for the healthkit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for healthkit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required attribute was absent from a tag
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// A timestamp attribute did not match the export format
    #[error("Malformed timestamp in '{field}': {value:?}")]
    MalformedTimestamp { field: String, value: String },

    /// A numeric attribute (or series value) was not a number
    #[error("Malformed value in '{field}': {value:?}")]
    MalformedValue { field: String, value: String },

    /// Caller supplied an unusable option
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Construction of one tag failed during loading
    #[error("Failed to load {tag} #{index}: {source}")]
    Tag {
        tag: String,
        index: usize,
        #[source]
        source: Box<Error>,
    },

    /// Building the series of one workout failed
    #[error("Failed to build series for workout #{index} ({activity_type} at {start}): {source}")]
    Workout {
        index: usize,
        activity_type: String,
        start: String,
        #[source]
        source: Box<Error>,
    },

    /// A line of the tag dump could not be decoded
    #[error("Tag dump error at line {line}: {message}")]
    TagDump { line: usize, message: String },

    /// Worker pool could not be created
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Walk through `Tag`/`Workout` wrappers to the underlying cause
    pub fn root(&self) -> &Error {
        match self {
            Error::Tag { source, .. } | Error::Workout { source, .. } => source.root(),
            other => other,
        }
    }
}
