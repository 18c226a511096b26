//! Persisted dashboard cache: one pretty-printed JSON document on disk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

use crate::domain::{CacheDocument, SiteRecord};

#[async_trait]
pub trait SiteStore: Send + Sync {
    /// Read the cached document. `None` on a missing or malformed file; a
    /// corrupt cache is treated exactly like an absent one.
    async fn load(&self) -> Option<CacheDocument>;

    /// Overwrite the cached document wholesale.
    async fn save(&self, doc: &CacheDocument) -> Result<()>;

    /// Replace the record matching `updated.name` and recompute the derived
    /// fields. No-op when the name is unknown.
    fn merge_site(&self, doc: CacheDocument, updated: SiteRecord) -> CacheDocument {
        merge_site(doc, updated)
    }
}

pub fn merge_site(mut doc: CacheDocument, updated: SiteRecord) -> CacheDocument {
    if let Some(slot) = doc.sites.iter_mut().find(|s| s.name == updated.name) {
        *slot = updated;
        doc.rebuild_derived();
    }
    doc
}

/// Flat-file store. Reads and writes are not locked across processes; the
/// pipeline serializes access within this process.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SiteStore for JsonFileStore {
    async fn load(&self) -> Option<CacheDocument> {
        let json = fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str(&json) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cache file unreadable, treating as absent");
                None
            }
        }
    }

    async fn save(&self, doc: &CacheDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("creating cache directory")?;
            }
        }
        let json = serde_json::to_string_pretty(doc).context("serializing cache document")?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing cache file {}", self.path.display()))
    }
}

/// In-memory store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    doc: tokio::sync::RwLock<Option<CacheDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(doc: CacheDocument) -> Self {
        Self {
            doc: tokio::sync::RwLock::new(Some(doc)),
        }
    }
}

#[async_trait]
impl SiteStore for MemoryStore {
    async fn load(&self) -> Option<CacheDocument> {
        self.doc.read().await.clone()
    }

    async fn save(&self, doc: &CacheDocument) -> Result<()> {
        *self.doc.write().await = Some(doc.clone());
        Ok(())
    }
}
