//! Error types for the datalake ingestion worker.
//!
//! This crate provides:
//! - [`DlError`] - Top-level error enum for all worker errors
//! - Domain-specific errors ([`QueueError`], [`StoreError`], [`TransformError`])
//! - [`ProcessingStage`] for attaching "where did it fail" context to logs
//!
//! Retry policy in the worker is flat: every error is retried the same way.
//! The variants below exist so that failures can be logged and alerted on
//! with enough detail, not to drive differentiated retry decisions.

use thiserror::Error;

/// Top-level error type for the ingestion worker.
#[derive(Error, Debug)]
pub enum DlError {
    /// Queue-related errors (receive, delete, attributes)
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Object store errors (read, decode, encode, write)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Transform errors (partition date extraction)
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// An error tagged with the processing stage that produced it
    #[error("{stage} stage failed: {source}")]
    Staged {
        stage: ProcessingStage,
        #[source]
        source: Box<DlError>,
    },
}

/// Queue-related errors.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Failed to connect to the queue backend
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Failed to receive messages
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Failed to delete (acknowledge) a message
    #[error("Delete failed: {0}")]
    Delete(String),

    /// Failed to read queue attributes
    #[error("Attributes unavailable: {0}")]
    Attributes(String),
}

/// Object store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object does not exist
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Credentials rejected or insufficient permissions
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Source object is not valid newline-delimited JSON
    #[error("Invalid record batch in {location}: {message}")]
    InvalidFormat { location: String, message: String },

    /// Columnar encoding failed
    #[error("Encoding failed for {location}: {message}")]
    Encode { location: String, message: String },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other backend failure (network, throttling, misconfiguration)
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Transform errors.
#[derive(Error, Debug)]
pub enum TransformError {
    /// A value in the date column could not be interpreted as a timestamp
    #[error("Unparseable value in date field '{field}' at row {row}: {value}")]
    UnparseableDate {
        field: String,
        row: usize,
        value: String,
    },

    /// The date column has a type that cannot hold a timestamp
    #[error("Date field '{field}' has unsupported type {data_type}")]
    UnsupportedDateType { field: String, data_type: String },
}

/// Stage of per-message handling where an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Downloading and decoding the source object
    Read,

    /// Computing the partition layout
    Transform,

    /// Encoding and uploading the columnar output
    Write,

    /// Deleting the message from the queue
    Ack,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "Read"),
            Self::Transform => write!(f, "Transform"),
            Self::Write => write!(f, "Write"),
            Self::Ack => write!(f, "Ack"),
        }
    }
}

impl DlError {
    /// Tag this error with the stage that produced it.
    ///
    /// An existing tag is kept, so the innermost stage wins.
    pub fn at_stage(self, stage: ProcessingStage) -> Self {
        match self {
            DlError::Staged { .. } => self,
            other => DlError::Staged {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// The error with any stage tag removed.
    pub fn inner(&self) -> &DlError {
        match self {
            DlError::Staged { source, .. } => source.inner(),
            other => other,
        }
    }

    /// Stage that produced this error: the tag if present, otherwise a
    /// guess from the variant.
    pub fn stage(&self) -> Option<ProcessingStage> {
        match self {
            DlError::Staged { stage, .. } => Some(*stage),
            DlError::Queue(QueueError::Delete(_)) => Some(ProcessingStage::Ack),
            DlError::Queue(_) => None,
            DlError::Store(StoreError::Encode { .. }) => Some(ProcessingStage::Write),
            DlError::Store(_) => None,
            DlError::Transform(_) => Some(ProcessingStage::Transform),
            DlError::Config(_) | DlError::Other(_) => None,
        }
    }
}

/// Result type alias using DlError.
pub type Result<T> = std::result::Result<T, DlError>;
