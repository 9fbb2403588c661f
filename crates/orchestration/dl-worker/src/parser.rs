//! Message body interpretation.

use dl_types::{MessageBody, ObjectReference, QueueMessage};
use tracing::debug;

/// Resolves queue messages to the object they announce.
#[derive(Debug, Clone)]
pub struct MessageParser {
    raw_bucket: String,
}

impl MessageParser {
    /// Create a parser; bare-key bodies resolve against `raw_bucket`.
    pub fn new(raw_bucket: impl Into<String>) -> Self {
        Self {
            raw_bucket: raw_bucket.into(),
        }
    }

    pub fn raw_bucket(&self) -> &str {
        &self.raw_bucket
    }

    /// Resolve `message` to exactly one object reference.
    ///
    /// Never fails. A body that is not an event envelope is taken as a key
    /// in the raw bucket; a bad key surfaces later as a read failure.
    pub fn resolve(&self, message: &QueueMessage) -> ObjectReference {
        let body = MessageBody::parse(&message.body);

        match &body {
            MessageBody::Envelope(records) if records.len() > 1 => {
                debug!(
                    message_id = %message.id,
                    records = records.len(),
                    "Envelope carries several records, using the first"
                );
            }
            MessageBody::Envelope(_) => {}
            MessageBody::RawKey(_) => {
                debug!(message_id = %message.id, "Body is not an event envelope, treating as key");
            }
        }

        body.reference(&self.raw_bucket)
    }
}
