use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use log::{debug, trace};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

#[derive(Debug, Default)]
struct Entries {
    blobs: HashMap<String, Arc<Blob>>,
    order: VecDeque<String>,
    bytes: usize,
}

/// In-memory blobs reachable under `/blob/<key>`, keyed by a hash of their
/// content.
///
/// Once the held bytes exceed `budget`, the least recently registered blobs
/// are revoked. Blobs registered through the same [`BlobScope`] are never
/// revoked for each other, so a page always links to blobs that exist.
#[derive(Debug)]
pub struct ObjectUrls {
    budget: usize,
    entries: Mutex<Entries>,
}

/// Registrations made while rendering one page.
#[derive(Debug)]
pub struct BlobScope<'a> {
    urls: &'a ObjectUrls,
    pinned: HashSet<String>,
}

fn key_for(bytes: &[u8], content_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_type.as_bytes());
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

impl ObjectUrls {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            entries: Mutex::default(),
        }
    }

    pub fn scope(&self) -> BlobScope<'_> {
        BlobScope {
            urls: self,
            pinned: HashSet::new(),
        }
    }

    fn insert(&self, bytes: Vec<u8>, content_type: &'static str, pinned: &HashSet<String>) -> String {
        let key = key_for(&bytes, content_type);
        let mut guard = self.lock();
        let entries = &mut *guard;

        if let Some(position) = entries.order.iter().position(|held| *held == key) {
            if let Some(held) = entries.order.remove(position) {
                entries.order.push_back(held);
            }
            trace!("Reusing blob {key}");
            return key;
        }

        let size = bytes.len();
        let mut index = 0;
        while entries.bytes + size > self.budget && index < entries.order.len() {
            if pinned.contains(&entries.order[index]) {
                index += 1;
                continue;
            }
            if let Some(oldest) = entries.order.remove(index) {
                if let Some(blob) = entries.blobs.remove(&oldest) {
                    entries.bytes -= blob.bytes.len();
                }
                trace!("Revoking blob {oldest}");
            }
        }

        entries.bytes += size;
        entries.order.push_back(key.clone());
        entries.blobs.insert(
            key.clone(),
            Arc::new(Blob {
                bytes,
                content_type,
            }),
        );
        debug!(
            "Registered blob {key} ({} blobs, {} bytes held)",
            entries.order.len(),
            entries.bytes
        );

        key
    }

    pub fn get(&self, key: &str) -> Option<Arc<Blob>> {
        self.lock().blobs.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // the map stays consistent even if a holder panicked
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobScope<'_> {
    /// Stores `bytes` and returns the url they are served under.
    pub fn register(&mut self, bytes: Vec<u8>, content_type: &'static str) -> String {
        let key = self.urls.insert(bytes, content_type, &self.pinned);
        let url = format!("/blob/{key}");
        self.pinned.insert(key);
        url
    }
}
