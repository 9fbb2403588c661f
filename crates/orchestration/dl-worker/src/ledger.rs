//! Process-local record of claimed files.

use std::collections::HashSet;

/// Set of `{bucket}/{key}` identities this process has claimed.
///
/// An entry is added before processing starts and removed only when every
/// attempt failed, so a successful file stays claimed for the lifetime of
/// the process and later deliveries of it are acknowledged without work.
///
/// The ledger is neither persisted nor shared: it prevents duplicate
/// processing within one running instance only.
#[derive(Debug, Default)]
pub struct DedupLedger {
    entries: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `file_id`. Returns false if it was already claimed.
    pub fn claim(&mut self, file_id: &str) -> bool {
        if self.entries.contains(file_id) {
            return false;
        }
        self.entries.insert(file_id.to_string())
    }

    /// Release a claim so a redelivery starts from scratch.
    pub fn release(&mut self, file_id: &str) -> bool {
        self.entries.remove(file_id)
    }

    pub fn contains(&self, file_id: &str) -> bool {
        self.entries.contains(file_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
