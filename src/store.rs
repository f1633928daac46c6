use std::sync::Arc;

use dashmap::DashMap;

use crate::TranscriptEntry;

/// In-memory transcript store keyed by video ID
///
/// Clones share the same underlying map, so one instance can be handed to
/// every request handler. Entries are wrapped in `Arc` so a reader never
/// holds a shard lock while it works with the transcript.
#[derive(Debug, Clone, Default)]
pub struct TranscriptStore {
    inner: Arc<DashMap<String, Arc<Vec<TranscriptEntry>>>>,
}

impl TranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a transcript, replacing any previous one for the same video
    pub fn insert(&self, video_id: impl Into<String>, entries: Vec<TranscriptEntry>) {
        self.inner.insert(video_id.into(), Arc::new(entries));
    }

    /// Look up a previously fetched transcript
    pub fn get(&self, video_id: &str) -> Option<Arc<Vec<TranscriptEntry>>> {
        self.inner.get(video_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
