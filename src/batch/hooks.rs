//! Collaborator interfaces the pipeline and batch processor call out to.
//!
//! Hooks are invoked from blocking worker threads, so they are plain
//! synchronous traits. A failing hook fails the current attempt, which the
//! batch processor may retry.

use crate::error::Result;
use crate::model::{ExtractedImage, StoredAsset};
use crate::pipeline::DeckResult;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Uploads extracted images and hands back where they went.
pub trait AssetStore: Send + Sync {
    fn store(&self, project_id: &str, image: &ExtractedImage) -> Result<StoredAsset>;
}

/// Generates narration for a processed deck.
pub trait NarrationHook: Send + Sync {
    fn generate(&self, deck: &DeckResult, options: Option<&Value>) -> Result<()>;
}

/// Persists a processed deck.
pub trait ProjectSink: Send + Sync {
    fn save(&self, deck: &DeckResult) -> Result<()>;
}

/// Optional collaborators for a batch processor. Absent hooks are skipped.
#[derive(Clone, Default)]
pub struct BatchHooks {
    pub store: Option<Arc<dyn AssetStore>>,
    pub narration: Option<Arc<dyn NarrationHook>>,
    pub sink: Option<Arc<dyn ProjectSink>>,
}

impl BatchHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_narration(mut self, narration: Arc<dyn NarrationHook>) -> Self {
        self.narration = Some(narration);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProjectSink>) -> Self {
        self.sink = Some(sink);
        self
    }
}

impl std::fmt::Debug for BatchHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHooks")
            .field("store", &self.store.is_some())
            .field("narration", &self.narration.is_some())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}

/// Asset store that keeps byte counts in memory under
/// `<project>/slide-<n>/<filename>` keys.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    objects: Mutex<BTreeMap<String, usize>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        match self.objects.lock() {
            Ok(objects) => objects.keys().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().keys().cloned().collect(),
        }
    }
}

impl AssetStore for MemoryAssetStore {
    fn store(&self, project_id: &str, image: &ExtractedImage) -> Result<StoredAsset> {
        let key = format!(
            "{}/slide-{}/{}",
            project_id, image.slide_number, image.filename
        );
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| crate::Error::Collaborator("asset store lock poisoned".to_string()))?;
        objects.insert(key.clone(), image.size());
        Ok(StoredAsset {
            url: Some(format!("memory://{}", key)),
            key,
        })
    }
}
