//! Animation extraction and keyframe conversion.
//!
//! Slide timing trees are parsed into [`AnimationDescriptor`]s, which the
//! effect table maps onto generic [`Keyframe`] sequences.
//!
//! # Example
//!
//! ```
//! use deckflow::animation::{convert, AnimationCategory, AnimationDescriptor};
//!
//! let descriptor = AnimationDescriptor::new(AnimationCategory::Entrance, "fade", "4")
//!     .with_delay(250);
//! let converted = convert(&descriptor);
//! assert_eq!(converted.duration, 750);
//! assert_eq!(converted.keyframes[0].time, 250.0);
//! ```

mod converter;
mod descriptor;
mod effects;

pub use converter::{convert, convert_batch, extract_and_convert, AnimationBatch, ConvertedAnimation};
pub use descriptor::{
    extract_animations, AnimationCategory, AnimationDescriptor, Direction, SlideAnimations,
    TargetType, Trigger, DEFAULT_DURATION_MS,
};
pub use effects::{Easing, Effect, Keyframe, KeyframeProperty, FLY_OFFSET};

#[cfg(test)]
pub(crate) use descriptor::fixtures as descriptor_fixtures;
