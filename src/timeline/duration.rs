//! Slide duration policies.

use crate::model::ExtractedSlide;

/// Decides how long a slide stays on screen.
pub trait DurationPolicy: Send + Sync {
    /// Duration of one slide in milliseconds. Must be greater than zero.
    fn slide_duration(&self, slide: &ExtractedSlide) -> u64;
}

/// Reading-speed estimate over the slide's words, bounded below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordRatePolicy {
    pub words_per_minute: u32,
    /// Floor applied to short or empty slides
    pub minimum_ms: u64,
}

impl Default for WordRatePolicy {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            minimum_ms: 5000,
        }
    }
}

impl DurationPolicy for WordRatePolicy {
    fn slide_duration(&self, slide: &ExtractedSlide) -> u64 {
        let words = slide.word_count() as u64;
        let rate = u64::from(self.words_per_minute.max(1));
        let reading = (words * 60_000).div_ceil(rate);
        reading.max(self.minimum_ms).max(1)
    }
}

/// Same duration for every slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDurationPolicy(pub u64);

impl DurationPolicy for FixedDurationPolicy {
    fn slide_duration(&self, _slide: &ExtractedSlide) -> u64 {
        self.0.max(1)
    }
}
