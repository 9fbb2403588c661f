//! Partition layout and transform output types.

use crate::Batch;
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Key-prefix segment of the form `year=Y/month=MM/day=DD/`.
///
/// The empty path means the output is written unpartitioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PartitionPath(String);

impl PartitionPath {
    /// The empty (unpartitioned) path.
    pub fn unpartitioned() -> Self {
        Self(String::new())
    }

    /// Daily partition for `date`; month and day are zero-padded to two digits.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!(
            "year={}/month={:02}/day={:02}/",
            date.year(),
            date.month(),
            date.day()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unpartitioned(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PartitionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the transform stage. Created per invocation, never cached.
#[derive(Debug, Clone)]
pub struct TransformResult {
    /// Records to write; same content as the input batch
    pub batch: Batch,

    /// Where under the output prefix the batch lands
    pub partition_path: PartitionPath,
}
