use thiserror::Error;

/// Converting a local wall-clock reading to UTC failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    #[error("could not parse {value:?} with format {format:?}")]
    Parse { value: String, format: &'static str },

    /// The reading falls into a DST gap in the local zone.
    #[error("{0} does not exist in the local time zone")]
    Nonexistent(String),
}

/// A state result that cannot be turned into a managed item.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("state {key:?} is not an object")]
    NotAnObject { key: String },

    #[error("state {key:?} is missing {field:?}")]
    MissingField { key: String, field: &'static str },

    #[error("state {key:?} has a {field:?} that is not a {expected}")]
    WrongType {
        key: String,
        field: &'static str,
        expected: &'static str,
    },

    #[error("state {key:?}: {source}")]
    StartTime {
        key: String,
        #[source]
        source: TimeError,
    },
}
