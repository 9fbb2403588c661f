//! Queue message and object reference types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A message received from the notification queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message ID
    pub id: String,

    /// Raw message body
    pub body: String,

    /// Handle used to delete (acknowledge) the message
    pub receipt_handle: String,

    /// Approximate number of times the queue has delivered this message
    pub receive_count: u32,
}

impl QueueMessage {
    /// Create a message with a receive count of 1.
    pub fn new(
        id: impl Into<String>,
        body: impl Into<String>,
        receipt_handle: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
            receipt_handle: receipt_handle.into(),
            receive_count: 1,
        }
    }

    /// Set the approximate receive count.
    pub fn with_receive_count(mut self, count: u32) -> Self {
        self.receive_count = count;
        self
    }
}

/// Location of an object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Bucket name
    pub bucket: String,

    /// Object key within the bucket
    pub key: String,
}

impl ObjectReference {
    /// Create a new object reference.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Identity used by the dedup ledger: `{bucket}/{key}`.
    pub fn file_id(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }

    /// Last `/`-separated segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// One record of an object-store event notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub s3: EventEntity,
}

/// The `s3` section of an event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntity {
    pub bucket: EventBucket,
    pub object: EventObject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventBucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    pub key: String,
}

impl EventRecord {
    /// The object this record points at.
    pub fn reference(&self) -> ObjectReference {
        ObjectReference::new(&self.s3.bucket.name, &self.s3.object.key)
    }
}

/// Parsed form of a queue message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Store event envelope. Never empty; the first record is the one that counts.
    Envelope(Vec<EventRecord>),

    /// Body taken verbatim (trimmed) as an object key.
    RawKey(String),
}

impl MessageBody {
    /// Interpret a raw message body.
    ///
    /// The body is an envelope only when it is a JSON object with a non-empty
    /// `Records` array whose first element carries `s3.bucket.name` and
    /// `s3.object.key`. Anything else is a raw key. Later records that do not
    /// have the expected shape are dropped rather than failing the envelope.
    pub fn parse(body: &str) -> Self {
        match parse_envelope(body) {
            Some(records) => MessageBody::Envelope(records),
            None => MessageBody::RawKey(body.trim().to_string()),
        }
    }

    /// Reference derived from this body; raw keys resolve against `default_bucket`.
    pub fn reference(&self, default_bucket: &str) -> ObjectReference {
        match self {
            MessageBody::Envelope(records) => match records.first() {
                Some(record) => record.reference(),
                None => ObjectReference::new(default_bucket, ""),
            },
            MessageBody::RawKey(key) => ObjectReference::new(default_bucket, key),
        }
    }
}

fn parse_envelope(body: &str) -> Option<Vec<EventRecord>> {
    let value: Value = serde_json::from_str(body).ok()?;
    let raw_records = value.get("Records")?.as_array()?;
    let (first, rest) = raw_records.split_first()?;

    let first: EventRecord = serde_json::from_value(first.clone()).ok()?;
    let mut records = Vec::with_capacity(raw_records.len());
    records.push(first);
    records.extend(
        rest.iter()
            .filter_map(|r| serde_json::from_value::<EventRecord>(r.clone()).ok()),
    );
    Some(records)
}
