//! Editable timeline project: layers, elements and keyframes.

use super::scene::Scene;
use crate::animation::Keyframe;
use crate::error::{Error, Result};
use crate::pipeline::DeckResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Multiplicative step of `zoom_in` / `zoom_out`
pub const ZOOM_STEP: f64 = 1.5;

/// Id of the layer `from_deck` places scene elements on.
pub const SLIDES_LAYER: &str = "slides";
/// Id of the layer `from_deck` places slide text on.
pub const TEXT_LAYER: &str = "text";

// Tolerance for keyframe times that went through float shifts.
const TIME_EPSILON: f64 = 1e-6;

fn clamped_zoom<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let level = f64::deserialize(deserializer)?;
    Ok(level.clamp(MIN_ZOOM, MAX_ZOOM))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Kind of content a layer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Video,
    Audio,
    Text,
    Image,
    Overlay,
    Slides,
}

/// Type tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Video,
    Audio,
    Text,
    Image,
    Shape,
    Scene,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

/// Static visual properties of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementProperties {
    pub opacity: f64,
    pub scale: Vec2,
    pub position: Vec2,
    pub rotation: f64,
    pub z_index: i32,
    pub visible: bool,
    pub locked: bool,
}

impl Default for ElementProperties {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            scale: Vec2 { x: 1.0, y: 1.0 },
            position: Vec2::default(),
            rotation: 0.0,
            z_index: 0,
            visible: true,
            locked: false,
        }
    }
}

/// A timed unit placed on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Owning layer, set by the project on insertion
    pub layer_id: String,
    #[serde(default)]
    pub name: String,
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub properties: ElementProperties,
    /// Type-specific payload
    #[serde(default)]
    pub data: Value,
    /// Absolute timeline times, in insertion order
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl Element {
    /// Create an element with a fresh id and default properties.
    pub fn new(kind: ElementKind, start_time: f64, duration: f64) -> Self {
        Self {
            id: new_id(),
            kind,
            layer_id: String::new(),
            name: String::new(),
            start_time,
            duration,
            properties: ElementProperties::default(),
            data: Value::Null,
            keyframes: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn with_properties(mut self, properties: ElementProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_keyframes(mut self, keyframes: Vec<Keyframe>) -> Self {
        self.keyframes = keyframes;
        self
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Start-inclusive, end-exclusive.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time()
    }

    fn spans(&self, t: f64) -> bool {
        t >= self.start_time - TIME_EPSILON && t <= self.end_time() + TIME_EPSILON
    }

    /// Move the element and its keyframes to a new start.
    fn shift_to(&mut self, start_time: f64) {
        let delta = start_time - self.start_time;
        self.start_time = start_time;
        for keyframe in &mut self.keyframes {
            keyframe.time += delta;
        }
    }

    fn check(&self) -> Result<()> {
        if self.duration.is_nan() || self.duration <= 0.0 {
            return Err(Error::InvalidEdit(format!(
                "element {} has non-positive duration {}",
                self.id, self.duration
            )));
        }
        if let Some(k) = self.keyframes.iter().find(|k| !self.spans(k.time)) {
            return Err(Error::InvalidEdit(format!(
                "keyframe at {} lies outside element {} ({}..{})",
                k.time,
                self.id,
                self.start_time,
                self.end_time()
            )));
        }
        Ok(())
    }
}

/// Partial update for an element. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementPatch {
    pub name: Option<String>,
    /// Keyframes move with the element
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
    pub properties: Option<ElementProperties>,
    pub data: Option<Value>,
}

/// An independently toggleable track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub visible: bool,
    pub locked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            visible: true,
            locked: false,
            color: None,
            elements: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    fn position_of(&self, element_id: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.id == element_id)
    }
}

/// Partial update for a layer. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerPatch {
    pub name: Option<String>,
    pub kind: Option<LayerKind>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// In-memory editing document.
///
/// All state changes go through the methods below; callers only ever get
/// shared references to layers and elements. The project duration always
/// equals the latest element end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineProject {
    id: String,
    name: String,
    duration: f64,
    fps: u32,
    resolution: Resolution,
    layers: Vec<Layer>,
    current_time: f64,
    #[serde(deserialize_with = "clamped_zoom")]
    zoom_level: f64,
    selected_element_ids: BTreeSet<String>,
    clipboard: Vec<Element>,
    playback: PlaybackState,
    #[serde(rename = "loop")]
    looping: bool,
}

impl TimelineProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            duration: 0.0,
            fps: 30,
            resolution: Resolution::default(),
            layers: Vec::new(),
            current_time: 0.0,
            zoom_level: 1.0,
            selected_element_ids: BTreeSet::new(),
            clipboard: Vec::new(),
            playback: PlaybackState::Stopped,
            looping: false,
        }
    }

    /// New project with the editor's default video, audio and overlay layers.
    pub fn with_standard_layers(name: impl Into<String>) -> Self {
        let mut project = Self::new(name);
        project.layers = vec![
            Layer::new("video-layer", "Video", LayerKind::Video).with_color("#3b82f6"),
            Layer::new("audio-layer", "Audio", LayerKind::Audio).with_color("#10b981"),
            Layer::new("overlay-layer", "Overlay", LayerKind::Overlay).with_color("#f59e0b"),
        ];
        project
    }

    /// Build a project from a processed deck.
    ///
    /// Every scene becomes an element on the `slides` layer carrying the
    /// slide's converted animations as keyframes offset by the scene start.
    /// Slides with text also get a text element on the `text` layer.
    pub fn from_deck(deck: &DeckResult) -> Self {
        let mut project = Self::new(deck.metadata.title.clone());
        let mut slides_layer = Layer::new(SLIDES_LAYER, "Slides", LayerKind::Slides);
        let mut text_layer = Layer::new(TEXT_LAYER, "Text", LayerKind::Text);

        for (index, scene) in deck.timeline.scenes.iter().enumerate() {
            let slide = deck
                .slides
                .iter()
                .find(|s| s.slide_number == scene.slide_number);
            let animations = deck.animations.get(index);

            let element = scene_element(scene, slide.and_then(|s| s.title.clone()), animations);
            let span = element.duration;
            slides_layer.elements.push(element);

            if let Some(slide) = slide.filter(|s| !s.text.trim().is_empty()) {
                let mut text = Element::new(ElementKind::Text, scene.start_time as f64, span)
                    .with_id(format!("text_{}", scene.slide_number))
                    .with_name(format!("Slide {} text", scene.slide_number))
                    .with_data(json!({
                        "text": slide.text,
                        "bulletPoints": slide.bullet_points,
                    }));
                text.layer_id = TEXT_LAYER.to_string();
                text_layer.elements.push(text);
            }
        }

        project.layers = vec![slides_layer, text_layer];
        project.recompute_duration();
        project
    }

    // ---- accessors ----

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Latest element end in milliseconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps.max(1);
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == layer_id)
    }

    fn layer_mut(&mut self, layer_id: &str) -> Result<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| l.id == layer_id)
            .ok_or_else(|| Error::LayerNotFound(layer_id.to_string()))
    }

    pub fn element(&self, element_id: &str) -> Option<&Element> {
        self.elements().find(|e| e.id == element_id)
    }

    fn element_mut(&mut self, element_id: &str) -> Result<&mut Element> {
        self.layers
            .iter_mut()
            .flat_map(|l| l.elements.iter_mut())
            .find(|e| e.id == element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))
    }

    /// Every element across all layers, in layer order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.layers.iter().flat_map(|l| l.elements.iter())
    }

    /// Id of the layer holding the element.
    pub fn find_layer_of(&self, element_id: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|l| l.position_of(element_id).is_some())
            .map(|l| l.id.as_str())
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn clipboard(&self) -> &[Element] {
        &self.clipboard
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Recompute the project duration from element ends and return it.
    pub fn recompute_duration(&mut self) -> f64 {
        self.duration = self.elements().map(Element::end_time).fold(0.0, f64::max);
        self.duration
    }

    // ---- elements ----

    /// Insert an element into a layer and return its id.
    ///
    /// An empty id is replaced with a generated one. A negative start is
    /// clamped to zero, keyframes moving with it.
    pub fn add_element(&mut self, mut element: Element, layer_id: &str) -> Result<String> {
        self.layer_mut(layer_id)?;
        if element.id.is_empty() {
            element.id = new_id();
        }
        if self.element(&element.id).is_some() {
            return Err(Error::DuplicateElement(element.id));
        }
        if element.start_time < 0.0 {
            element.shift_to(0.0);
        }
        element.check()?;

        element.layer_id = layer_id.to_string();
        let id = element.id.clone();
        self.layer_mut(layer_id)?.elements.push(element);
        self.recompute_duration();
        Ok(id)
    }

    /// Remove an element wherever it lives.
    pub fn remove_element(&mut self, element_id: &str) -> Result<Element> {
        let element = self
            .take_element(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?;
        self.selected_element_ids.remove(element_id);
        self.recompute_duration();
        Ok(element)
    }

    /// Apply a patch. The whole patch is rejected when the resulting span
    /// would not contain the element's keyframes.
    pub fn update_element(&mut self, element_id: &str, patch: ElementPatch) -> Result<()> {
        let element = self.element_mut(element_id)?;

        let mut candidate = element.clone();
        if let Some(start) = patch.start_time {
            candidate.shift_to(start.max(0.0));
        }
        if let Some(duration) = patch.duration {
            candidate.duration = duration;
        }
        if let Some(name) = patch.name {
            candidate.name = name;
        }
        if let Some(properties) = patch.properties {
            candidate.properties = properties;
        }
        if let Some(data) = patch.data {
            candidate.data = data;
        }
        candidate.check()?;

        *element = candidate;
        self.recompute_duration();
        Ok(())
    }

    /// Move an element to a new start time and, optionally, another layer.
    ///
    /// The target layer and element are verified before anything changes,
    /// so a failed move leaves the project as it was.
    pub fn move_element(
        &mut self,
        element_id: &str,
        new_start_time: f64,
        target_layer_id: &str,
    ) -> Result<()> {
        self.layer_mut(target_layer_id)?;
        let source = self
            .find_layer_of(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?
            .to_string();
        let start = new_start_time.max(0.0);

        if source == target_layer_id {
            self.element_mut(element_id)?.shift_to(start);
        } else if let Some(mut element) = self.take_element(element_id) {
            element.shift_to(start);
            element.layer_id = target_layer_id.to_string();
            self.layer_mut(target_layer_id)?.elements.push(element);
        }

        self.recompute_duration();
        Ok(())
    }

    /// Clone an element right after itself on the same layer.
    pub fn duplicate_element(&mut self, element_id: &str) -> Result<String> {
        let original = self
            .element(element_id)
            .ok_or_else(|| Error::ElementNotFound(element_id.to_string()))?;

        let mut copy = original.clone();
        let layer_id = copy.layer_id.clone();
        copy.id = new_id();
        copy.shift_to(original.end_time());

        let id = copy.id.clone();
        self.insert_after(&layer_id, element_id, copy)?;
        self.recompute_duration();
        Ok(id)
    }

    /// Split an element at `at`, which must fall strictly inside it.
    ///
    /// The original keeps the left part; the returned id names the right
    /// part. Keyframes are partitioned by time, a keyframe exactly at the
    /// cut belonging to both halves.
    pub fn split_element(&mut self, element_id: &str, at: f64) -> Result<String> {
        let element = self.element_mut(element_id)?;
        if at.is_nan() || at <= element.start_time || at >= element.end_time() {
            return Err(Error::InvalidEdit(format!(
                "split point {} is outside element {} ({}..{})",
                at,
                element_id,
                element.start_time,
                element.end_time()
            )));
        }

        let mut right = element.clone();
        right.id = new_id();
        right.start_time = at;
        right.duration = element.end_time() - at;
        right.keyframes.retain(|k| k.time >= at);

        element.duration = at - element.start_time;
        element.keyframes.retain(|k| k.time <= at);

        let layer_id = element.layer_id.clone();
        let id = right.id.clone();
        self.insert_after(&layer_id, element_id, right)?;
        Ok(id)
    }

    /// Append a keyframe. Its time must lie within the element's span.
    pub fn add_keyframe(&mut self, element_id: &str, keyframe: Keyframe) -> Result<()> {
        let element = self.element_mut(element_id)?;
        if !element.spans(keyframe.time) {
            return Err(Error::InvalidEdit(format!(
                "keyframe at {} lies outside element {} ({}..{})",
                keyframe.time,
                element_id,
                element.start_time,
                element.end_time()
            )));
        }
        element.keyframes.push(keyframe);
        Ok(())
    }

    /// Elements active at `t` across all layers.
    pub fn elements_at_time(&self, t: f64) -> Vec<&Element> {
        self.elements().filter(|e| e.is_active_at(t)).collect()
    }

    fn take_element(&mut self, element_id: &str) -> Option<Element> {
        self.layers.iter_mut().find_map(|layer| {
            layer
                .position_of(element_id)
                .map(|i| layer.elements.remove(i))
        })
    }

    fn insert_after(&mut self, layer_id: &str, anchor_id: &str, element: Element) -> Result<()> {
        let layer = self.layer_mut(layer_id)?;
        let index = layer
            .position_of(anchor_id)
            .map_or(layer.elements.len(), |i| i + 1);
        layer.elements.insert(index, element);
        Ok(())
    }

    // ---- selection ----

    /// Add an element to the selection. Selecting twice is harmless.
    pub fn select_element(&mut self, element_id: &str) -> Result<()> {
        if self.element(element_id).is_none() {
            return Err(Error::ElementNotFound(element_id.to_string()));
        }
        self.selected_element_ids.insert(element_id.to_string());
        Ok(())
    }

    /// Returns whether the element was selected.
    pub fn deselect_element(&mut self, element_id: &str) -> bool {
        self.selected_element_ids.remove(element_id)
    }

    pub fn clear_selection(&mut self) {
        self.selected_element_ids.clear();
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.selected_element_ids.iter().map(String::as_str)
    }

    /// Selected elements in layer order.
    pub fn selected_elements(&self) -> Vec<&Element> {
        self.elements()
            .filter(|e| self.selected_element_ids.contains(&e.id))
            .collect()
    }

    // ---- playback ----

    /// Move the playhead, clamped to zero.
    pub fn seek(&mut self, time: f64) {
        self.current_time = time.max(0.0);
    }

    pub fn play(&mut self) {
        self.playback = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.playback == PlaybackState::Playing {
            self.playback = PlaybackState::Paused;
        }
    }

    /// Stop playback and rewind to zero.
    pub fn stop(&mut self) {
        self.playback = PlaybackState::Stopped;
        self.current_time = 0.0;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    // ---- zoom ----

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom_level * ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom_level / ZOOM_STEP)
    }

    /// Set the zoom level, clamped to `[0.1, 10]`. NaN is ignored.
    pub fn set_zoom(&mut self, level: f64) -> f64 {
        if !level.is_nan() {
            self.zoom_level = level.clamp(MIN_ZOOM, MAX_ZOOM);
        }
        self.zoom_level
    }

    // ---- clipboard ----

    /// Snapshot the named elements into the clipboard, replacing it.
    /// Unknown ids are ignored; returns how many were copied.
    pub fn copy_elements(&mut self, element_ids: &[&str]) -> usize {
        self.clipboard = element_ids
            .iter()
            .filter_map(|id| self.element(id).cloned())
            .collect();
        self.clipboard.len()
    }

    /// Copy the named elements, then remove them from the project.
    pub fn cut_elements(&mut self, element_ids: &[&str]) -> usize {
        let copied = self.copy_elements(element_ids);
        let ids: Vec<String> = self.clipboard.iter().map(|e| e.id.clone()).collect();
        for id in ids {
            if self.take_element(&id).is_some() {
                self.selected_element_ids.remove(&id);
            }
        }
        self.recompute_duration();
        copied
    }

    /// Insert clones of the clipboard into a layer.
    ///
    /// The earliest copied element lands at `at_time` and the others keep
    /// their offsets from it. The pasted elements get new ids and become
    /// the selection.
    pub fn paste_elements(&mut self, at_time: f64, layer_id: &str) -> Result<Vec<String>> {
        self.layer_mut(layer_id)?;
        if self.clipboard.is_empty() {
            return Ok(Vec::new());
        }

        let anchor = self
            .clipboard
            .iter()
            .map(|e| e.start_time)
            .fold(f64::INFINITY, f64::min);
        let at = at_time.max(0.0);

        let pasted: Vec<Element> = self
            .clipboard
            .iter()
            .map(|original| {
                let mut copy = original.clone();
                copy.id = new_id();
                copy.layer_id = layer_id.to_string();
                copy.shift_to(at + (original.start_time - anchor));
                copy
            })
            .collect();
        let ids: Vec<String> = pasted.iter().map(|e| e.id.clone()).collect();

        self.layer_mut(layer_id)?.elements.extend(pasted);
        self.selected_element_ids = ids.iter().cloned().collect();
        self.recompute_duration();
        Ok(ids)
    }

    // ---- layers ----

    /// Append a layer. Its id and the ids of any elements it carries must
    /// be new to the project.
    pub fn add_layer(&mut self, mut layer: Layer) -> Result<()> {
        if self.layer(&layer.id).is_some() {
            return Err(Error::DuplicateLayer(layer.id));
        }
        let mut seen = BTreeSet::new();
        for element in &mut layer.elements {
            if self.element(&element.id).is_some() || !seen.insert(element.id.clone()) {
                return Err(Error::DuplicateElement(element.id.clone()));
            }
            element.check()?;
            element.layer_id = layer.id.clone();
        }
        self.layers.push(layer);
        self.recompute_duration();
        Ok(())
    }

    pub fn update_layer(&mut self, layer_id: &str, patch: LayerPatch) -> Result<()> {
        let layer = self.layer_mut(layer_id)?;
        if let Some(name) = patch.name {
            layer.name = name;
        }
        if let Some(kind) = patch.kind {
            layer.kind = kind;
        }
        if let Some(visible) = patch.visible {
            layer.visible = visible;
        }
        if let Some(locked) = patch.locked {
            layer.locked = locked;
        }
        if let Some(color) = patch.color {
            layer.color = Some(color);
        }
        Ok(())
    }

    /// Remove a layer together with its elements.
    pub fn remove_layer(&mut self, layer_id: &str) -> Result<Layer> {
        let index = self
            .layers
            .iter()
            .position(|l| l.id == layer_id)
            .ok_or_else(|| Error::LayerNotFound(layer_id.to_string()))?;
        let layer = self.layers.remove(index);
        for element in &layer.elements {
            self.selected_element_ids.remove(&element.id);
        }
        self.recompute_duration();
        Ok(layer)
    }

    /// Move a layer to `index`, clamped to the last position.
    pub fn reorder_layer(&mut self, layer_id: &str, index: usize) -> Result<()> {
        let from = self
            .layers
            .iter()
            .position(|l| l.id == layer_id)
            .ok_or_else(|| Error::LayerNotFound(layer_id.to_string()))?;
        let layer = self.layers.remove(from);
        let to = index.min(self.layers.len());
        self.layers.insert(to, layer);
        Ok(())
    }
}

fn scene_element(
    scene: &Scene,
    title: Option<String>,
    animations: Option<&crate::animation::AnimationBatch>,
) -> Element {
    let start = scene.start_time as f64;
    let converted = animations.map(|b| b.converted.as_slice()).unwrap_or_default();

    let keyframes: Vec<Keyframe> = converted
        .iter()
        .flat_map(|a| a.keyframes.iter().cloned())
        .map(|mut k| {
            k.time += start;
            k
        })
        .collect();
    let keyframe_end = keyframes.iter().map(|k| k.time - start).fold(0.0, f64::max);
    let animation_refs: Vec<Value> = converted
        .iter()
        .map(|a| {
            json!({
                "targetId": a.target_id,
                "effect": a.original_effect,
                "supported": a.supported,
            })
        })
        .collect();

    let mut element = Element::new(
        ElementKind::Scene,
        start,
        (scene.duration as f64).max(keyframe_end),
    )
    .with_id(scene.scene_id.clone())
    .with_name(title.unwrap_or_else(|| format!("Slide {}", scene.slide_number)))
    .with_data(json!({
        "slideNumber": scene.slide_number,
        "transitions": scene.transitions,
        "animations": animation_refs,
    }))
    .with_keyframes(keyframes);
    element.layer_id = SLIDES_LAYER.to_string();
    element
}
