//! Descriptor to keyframe conversion.

use super::descriptor::{extract_animations, AnimationDescriptor};
use super::effects::{Effect, Keyframe};
use crate::container::DeckContainer;
use serde::{Deserialize, Serialize};

/// Keyframes generated for one descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedAnimation {
    pub target_id: String,
    /// Keyframes with the delay folded in
    pub keyframes: Vec<Keyframe>,
    /// Original duration plus delay, in milliseconds
    pub duration: u64,
    pub delay: u64,
    pub original_type: String,
    pub original_effect: String,
    /// False when the effect was unknown and the fade mapping was used
    pub supported: bool,
}

impl ConvertedAnimation {
    /// End of the last keyframe, relative to the animation's time origin.
    pub fn end_time(&self) -> f64 {
        self.keyframes
            .iter()
            .map(|k| k.time)
            .fold(self.duration as f64, f64::max)
    }
}

/// Conversion results for a list of descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationBatch {
    pub total: usize,
    pub supported: usize,
    pub unsupported: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub descriptors: Vec<AnimationDescriptor>,
    pub converted: Vec<ConvertedAnimation>,
    pub warnings: Vec<String>,
    /// Timing nodes that could not be parsed
    pub skipped: usize,
}

/// Convert one descriptor through the effect table.
///
/// Unknown effects use the fade mapping and are marked unsupported. Every
/// keyframe is shifted by the descriptor's delay in both cases.
pub fn convert(descriptor: &AnimationDescriptor) -> ConvertedAnimation {
    let (effect, supported) = match Effect::from_name(&descriptor.effect) {
        Some(effect) => (effect, true),
        None => {
            log::warn!(
                "unsupported animation effect '{}' on element {}, using fade",
                descriptor.effect,
                descriptor.target_id
            );
            (Effect::Fade, false)
        }
    };

    let delay = descriptor.delay as f64;
    let keyframes = effect
        .keyframes(descriptor)
        .into_iter()
        .map(|mut k| {
            k.time += delay;
            k
        })
        .collect();

    ConvertedAnimation {
        target_id: descriptor.target_id.clone(),
        keyframes,
        duration: descriptor.duration.saturating_add(descriptor.delay),
        delay: descriptor.delay,
        original_type: descriptor.category.as_str().to_string(),
        original_effect: descriptor.effect.clone(),
        supported,
    }
}

/// Convert each descriptor in order, counting unsupported effects.
///
/// Descriptors that target the same element are converted independently
/// and kept in descriptor order.
pub fn convert_batch(descriptors: &[AnimationDescriptor]) -> AnimationBatch {
    let mut batch = AnimationBatch {
        total: descriptors.len(),
        ..Default::default()
    };

    for descriptor in descriptors {
        let converted = convert(descriptor);
        if converted.supported {
            batch.supported += 1;
        } else {
            batch.unsupported += 1;
            batch.warnings.push(format!(
                "Animation '{}' is not supported on element {}",
                descriptor.effect, descriptor.target_id
            ));
        }
        batch.converted.push(converted);
    }

    batch
}

/// Extract a slide's animations and convert them.
pub fn extract_and_convert(container: &DeckContainer, slide_number: usize) -> AnimationBatch {
    let extracted = extract_animations(container, slide_number);
    let mut batch = convert_batch(&extracted.descriptors);
    batch.descriptors = extracted.descriptors;
    batch.skipped = extracted.skipped;
    batch
}
