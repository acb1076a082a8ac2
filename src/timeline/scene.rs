//! Deck-level scene timeline.

use super::duration::DurationPolicy;
use crate::model::ExtractedSlide;
use serde::{Deserialize, Serialize};

/// Transition applied between consecutive scenes.
pub const DEFAULT_TRANSITION: &str = "fade";

/// One slide's span on the deck timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// `scene_<slide number>`
    pub scene_id: String,
    pub slide_number: usize,
    pub start_time: u64,
    pub end_time: u64,
    pub duration: u64,
    pub transitions: Vec<String>,
}

/// Scenes laid end to end, one per slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckTimeline {
    pub total_duration: u64,
    pub scenes: Vec<Scene>,
}

impl DeckTimeline {
    /// Scene covering time `t`, start-inclusive and end-exclusive.
    pub fn scene_at(&self, t: u64) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.start_time <= t && t < s.end_time)
    }

    pub fn scene_for_slide(&self, slide_number: usize) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.slide_number == slide_number)
    }
}

/// Lay the slides out back to back in slide order.
///
/// Each scene starts where the previous one ends, so the total duration is
/// the sum of the policy's per-slide durations. No slides yields an empty
/// timeline of zero length.
pub fn generate_timeline(slides: &[ExtractedSlide], policy: &dyn DurationPolicy) -> DeckTimeline {
    let mut current = 0u64;
    let scenes = slides
        .iter()
        .map(|slide| {
            let duration = policy.slide_duration(slide).max(1);
            let scene = Scene {
                scene_id: format!("scene_{}", slide.slide_number),
                slide_number: slide.slide_number,
                start_time: current,
                end_time: current.saturating_add(duration),
                duration,
                transitions: vec![DEFAULT_TRANSITION.to_string()],
            };
            current = current.saturating_add(duration);
            scene
        })
        .collect();

    DeckTimeline {
        total_duration: current,
        scenes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::duration::FixedDurationPolicy;

    fn slides(n: usize) -> Vec<ExtractedSlide> {
        (1..=n).map(ExtractedSlide::new).collect()
    }

    #[test]
    fn test_empty_deck_has_empty_timeline() {
        let timeline = generate_timeline(&[], &FixedDurationPolicy(4000));
        assert_eq!(timeline, DeckTimeline::default());
        assert_eq!(timeline.total_duration, 0);
    }

    #[test]
    fn test_scenes_are_contiguous() {
        let timeline = generate_timeline(&slides(3), &FixedDurationPolicy(4000));

        assert_eq!(timeline.scenes.len(), 3);
        assert_eq!(timeline.total_duration, 12_000);
        assert_eq!(timeline.scenes[0].scene_id, "scene_1");
        assert_eq!(timeline.scenes[0].start_time, 0);
        for pair in timeline.scenes.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
        }
        assert!(timeline.scenes.iter().all(|s| s.end_time > s.start_time));
        assert_eq!(timeline.scenes[2].transitions, vec!["fade"]);
    }

    #[test]
    fn test_extreme_durations_saturate() {
        let timeline = generate_timeline(&slides(3), &FixedDurationPolicy(u64::MAX / 2));
        assert_eq!(timeline.total_duration, u64::MAX);
        assert_eq!(timeline.scenes[2].end_time, u64::MAX);
        assert_eq!(timeline.scenes[1].start_time, u64::MAX / 2);
    }

    #[test]
    fn test_scene_lookup() {
        let timeline = generate_timeline(&slides(2), &FixedDurationPolicy(1000));
        assert_eq!(timeline.scene_at(0).map(|s| s.slide_number), Some(1));
        assert_eq!(timeline.scene_at(1000).map(|s| s.slide_number), Some(2));
        assert!(timeline.scene_at(2000).is_none());
        assert_eq!(timeline.scene_for_slide(2).map(|s| s.start_time), Some(1000));
    }
}
