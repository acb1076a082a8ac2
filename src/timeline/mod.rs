//! Timeline model.
//!
//! [`generate_timeline`] lays a deck's slides out as contiguous scenes;
//! [`TimelineProject`] is the editable document of layers, elements and
//! keyframes built on top of it.
//!
//! # Example
//!
//! ```
//! use deckflow::timeline::{Element, ElementKind, TimelineProject};
//!
//! let mut project = TimelineProject::with_standard_layers("Demo");
//! let id = project
//!     .add_element(Element::new(ElementKind::Text, 1000.0, 3000.0), "overlay-layer")
//!     .unwrap();
//! assert_eq!(project.elements_at_time(1000.0)[0].id, id);
//! assert!(project.elements_at_time(4000.0).is_empty());
//! ```

mod duration;
mod project;
mod scene;

pub use duration::{DurationPolicy, FixedDurationPolicy, WordRatePolicy};
pub use project::{
    Element, ElementKind, ElementPatch, ElementProperties, Layer, LayerKind, LayerPatch,
    PlaybackState, Resolution, TimelineProject, Vec2, MAX_ZOOM, MIN_ZOOM, SLIDES_LAYER,
    TEXT_LAYER, ZOOM_STEP,
};
pub use scene::{generate_timeline, DeckTimeline, Scene, DEFAULT_TRANSITION};
