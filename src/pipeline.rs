//! Single-deck processing pipeline.
//!
//! Opens a container, extracts metadata and slide content, converts
//! animations and lays out the deck timeline. Stages always run in that
//! order and report increasing progress.

use crate::animation::{extract_and_convert, AnimationBatch};
use crate::batch::AssetStore;
use crate::container::DeckContainer;
use crate::error::{Error, Result};
use crate::extract::{count_shapes, detect_layout, extract_images, extract_text};
use crate::metadata::extract_metadata;
use crate::model::{calculate_stats, DeckMetadata, DeckStats, ExtractedSlide, ImageAsset, ShapeCounts};
use crate::timeline::{generate_timeline, DeckTimeline, DurationPolicy, TimelineProject, WordRatePolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Feature toggles for one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessOptions {
    /// Run the image extractor and report assets
    pub extract_images: bool,

    /// Run the text extractor
    pub process_text: bool,

    /// Classify slide layouts
    pub detect_layouts: bool,

    /// Nominate a stored image as the deck thumbnail
    pub generate_thumbnails: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            extract_images: true,
            process_text: true,
            detect_layouts: true,
            generate_thumbnails: false,
        }
    }
}

impl ProcessOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_images(mut self, extract: bool) -> Self {
        self.extract_images = extract;
        self
    }

    pub fn with_text(mut self, process: bool) -> Self {
        self.process_text = process;
        self
    }

    pub fn with_layouts(mut self, detect: bool) -> Self {
        self.detect_layouts = detect;
        self
    }

    pub fn with_thumbnails(mut self, generate: bool) -> Self {
        self.generate_thumbnails = generate;
        self
    }
}

/// Image assets reported for a deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckAssets {
    pub images: Vec<ImageAsset>,
}

/// Everything extracted from one deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckResult {
    pub project_id: String,
    pub metadata: DeckMetadata,
    pub slides: Vec<ExtractedSlide>,
    pub assets: DeckAssets,
    /// Converted animations, one batch per slide in slide order
    pub animations: Vec<AnimationBatch>,
    pub timeline: DeckTimeline,
    pub stats: DeckStats,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Storage URL or key of the image nominated as thumbnail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl DeckResult {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Timeline length in milliseconds.
    pub fn total_duration(&self) -> u64 {
        self.timeline.total_duration
    }

    /// Keys of every image handed to the asset store.
    pub fn storage_keys(&self) -> Vec<String> {
        self.assets
            .images
            .iter()
            .filter_map(|i| i.storage_key.clone())
            .collect()
    }

    /// Build an editable timeline project from this deck.
    pub fn to_project(&self) -> TimelineProject {
        TimelineProject::from_deck(self)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to compact JSON.
    pub fn to_json_compact(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Deck pipeline with its collaborators.
///
/// # Example
///
/// ```no_run
/// use deckflow::pipeline::{DeckProcessor, ProcessOptions};
/// use deckflow::timeline::FixedDurationPolicy;
/// use std::sync::Arc;
///
/// let processor = DeckProcessor::new(ProcessOptions::default().with_images(false))
///     .with_policy(Arc::new(FixedDurationPolicy(8000)));
/// let data = std::fs::read("deck.pptx")?;
/// let result = processor.process(data, "project-1", &mut |stage, pct| {
///     println!("{stage}: {pct}%");
/// })?;
/// println!("{} ms", result.total_duration());
/// # Ok::<(), deckflow::Error>(())
/// ```
#[derive(Clone)]
pub struct DeckProcessor {
    options: ProcessOptions,
    store: Option<Arc<dyn AssetStore>>,
    policy: Arc<dyn DurationPolicy>,
}

impl DeckProcessor {
    pub fn new(options: ProcessOptions) -> Self {
        Self {
            options,
            store: None,
            policy: Arc::new(WordRatePolicy::default()),
        }
    }

    /// Upload extracted images through this store.
    pub fn with_store(mut self, store: Arc<dyn AssetStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_store_opt(mut self, store: Option<Arc<dyn AssetStore>>) -> Self {
        self.store = store;
        self
    }

    /// Decide slide durations with this policy.
    pub fn with_policy(mut self, policy: Arc<dyn DurationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn options(&self) -> &ProcessOptions {
        &self.options
    }

    /// Process a deck end to end.
    pub fn process(
        &self,
        data: Vec<u8>,
        project_id: &str,
        progress: &mut dyn FnMut(&str, u8),
    ) -> Result<DeckResult> {
        self.process_cancellable(data, project_id, progress, &|| false)
    }

    /// Process a deck, checking `cancelled` between stages.
    ///
    /// Returns [`Error::Cancelled`] at the first stage boundary after the
    /// flag turns true.
    pub fn process_cancellable(
        &self,
        data: Vec<u8>,
        project_id: &str,
        progress: &mut dyn FnMut(&str, u8),
        cancelled: &dyn Fn() -> bool,
    ) -> Result<DeckResult> {
        let start = Instant::now();
        let checkpoint = || {
            if cancelled() {
                Err(Error::Cancelled(project_id.to_string()))
            } else {
                Ok(())
            }
        };

        progress("opening", 5);
        let container = DeckContainer::open(data)?;
        checkpoint()?;

        progress("metadata", 10);
        let mut metadata = extract_metadata(&container);
        let slide_count = container.slide_paths().len();
        checkpoint()?;

        let mut slides = Vec::with_capacity(slide_count);
        let mut images = Vec::new();
        let mut shapes = ShapeCounts::default();
        let mut warnings = Vec::new();

        for number in 1..=slide_count {
            let (slide, slide_images) = self.extract_slide(&container, number, project_id)?;
            images.extend(slide_images);
            shapes += count_shapes(&container, number);
            slides.push(slide);

            let pct = 10 + (60 * number / slide_count) as u8;
            progress(&format!("slide {}/{}", number, slide_count), pct);
            checkpoint()?;
        }
        metadata.reconcile_slide_count(slides.len());

        progress("animations", 80);
        let animations: Vec<AnimationBatch> = (1..=slide_count)
            .map(|number| {
                let batch = extract_and_convert(&container, number);
                for warning in &batch.warnings {
                    warnings.push(format!("Slide {}: {}", number, warning));
                }
                if batch.skipped > 0 {
                    warnings.push(format!(
                        "Slide {}: {} timing nodes skipped",
                        number, batch.skipped
                    ));
                }
                batch
            })
            .collect();
        checkpoint()?;

        progress("timeline", 90);
        let timeline = generate_timeline(&slides, self.policy.as_ref());

        let thumbnail = if self.options.generate_thumbnails {
            let nominated = images
                .iter()
                .find_map(|i: &ImageAsset| i.url.clone().or_else(|| i.storage_key.clone()));
            if nominated.is_none() {
                warnings.push("No stored image available for a thumbnail".to_string());
            }
            nominated
        } else {
            None
        };

        let elapsed = start.elapsed().as_millis() as u64;
        let mut stats = calculate_stats(&slides, &images, elapsed);
        stats.shapes = shapes.shapes;
        stats.charts = shapes.charts;
        stats.tables = shapes.tables;

        log::debug!(
            "processed {} ({} slides, {} images) in {} ms",
            project_id,
            slides.len(),
            images.len(),
            elapsed
        );
        progress("completed", 100);

        Ok(DeckResult {
            project_id: project_id.to_string(),
            metadata,
            slides,
            assets: DeckAssets { images },
            animations,
            timeline,
            stats,
            warnings,
            thumbnail,
        })
    }

    fn extract_slide(
        &self,
        container: &DeckContainer,
        number: usize,
        project_id: &str,
    ) -> Result<(ExtractedSlide, Vec<ImageAsset>)> {
        let mut slide = ExtractedSlide::new(number);

        if self.options.process_text {
            slide = slide.with_text(extract_text(container, number));
        }
        if self.options.detect_layouts {
            slide.layout = Some(detect_layout(container, number));
        }

        let mut assets = Vec::new();
        if self.options.extract_images {
            for image in extract_images(container, number) {
                let stored = match &self.store {
                    Some(store) => Some(store.store(project_id, &image)?),
                    None => None,
                };
                assets.push(ImageAsset::from_extracted(&image, stored));
            }
            slide.images = Some(assets.clone());
        }

        Ok((slide, assets))
    }
}

impl std::fmt::Debug for DeckProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckProcessor")
            .field("options", &self.options)
            .field("store", &self.store.is_some())
            .finish()
    }
}

/// Process a deck with default collaborators.
///
/// Fails with [`Error::ContainerFormat`] when the bytes cannot be opened;
/// problems inside individual parts degrade to defaults and warnings.
pub fn process_deck(
    data: Vec<u8>,
    project_id: &str,
    options: &ProcessOptions,
    progress: &mut dyn FnMut(&str, u8),
) -> Result<DeckResult> {
    DeckProcessor::new(options.clone()).process(data, project_id, progress)
}
