//! Raw content cache
//!
//! Every fetched page is stored as a raw capture keyed by (source, local-id)
//! together with a SHA-256 hash of its decoded text. Re-runs consult the
//! cache before touching the network; re-fetches of unchanged pages leave the
//! processed flag alone, while changed pages are flagged for reprocessing.

use crate::storage::{CaptureWrite, RawCapture, Storage, StorageResult};
use sha2::{Digest, Sha256};

/// Computes the hex-encoded SHA-256 hash of capture text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of storing a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOutcome {
    /// Hash of the stored text
    pub hash: String,
    /// What the write did to the stored row
    pub write: CaptureWrite,
}

impl StoreOutcome {
    /// Returns true if the capture needs (re)processing after this store
    pub fn needs_processing(&self) -> bool {
        !matches!(self.write, CaptureWrite::Unchanged)
    }
}

/// Cache operations available on every storage backend
pub trait RawCache {
    /// Looks up the live capture for a key
    fn lookup(&self, source: &str, local_id: &str) -> StorageResult<Option<RawCapture>>;

    /// Stores decoded text for a key and returns its hash
    fn store(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        text: &str,
    ) -> StorageResult<StoreOutcome>;

    /// Marks a capture as folded into the catalog
    fn mark_processed(&mut self, source: &str, local_id: &str) -> StorageResult<()>;

    /// Lists captures for a source still awaiting processing
    fn pending(&self, source: &str) -> StorageResult<Vec<RawCapture>>;
}

impl<S: Storage + ?Sized> RawCache for S {
    fn lookup(&self, source: &str, local_id: &str) -> StorageResult<Option<RawCapture>> {
        self.get_capture(source, local_id)
    }

    fn store(
        &mut self,
        source: &str,
        local_id: &str,
        url: &str,
        text: &str,
    ) -> StorageResult<StoreOutcome> {
        let hash = content_hash(text);
        let write = self.put_capture(source, local_id, url, text, &hash)?;
        tracing::trace!("Stored capture {}/{}: {:?}", source, local_id, write);
        Ok(StoreOutcome { hash, write })
    }

    fn mark_processed(&mut self, source: &str, local_id: &str) -> StorageResult<()> {
        self.mark_capture_processed(source, local_id)
    }

    fn pending(&self, source: &str) -> StorageResult<Vec<RawCapture>> {
        self.pending_captures(source)
    }
}
