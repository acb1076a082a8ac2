//! Canonical animation descriptors parsed from slide timing trees.

use crate::container::DeckContainer;
use crate::extract::{attr, load_slide};
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Behaviour duration assumed when a timing node declares none.
pub const DEFAULT_DURATION_MS: u64 = 500;

/// Animation category, from `p:cTn@presetClass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationCategory {
    Entrance,
    Exit,
    Emphasis,
    MotionPath,
}

impl AnimationCategory {
    /// Map a `presetClass` value; other classes (media calls, verbs) are
    /// not animations.
    pub fn from_preset_class(value: &str) -> Option<Self> {
        match value {
            "entr" => Some(Self::Entrance),
            "exit" => Some(Self::Exit),
            "emph" => Some(Self::Emphasis),
            "path" => Some(Self::MotionPath),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrance => "entrance",
            Self::Exit => "exit",
            Self::Emphasis => "emphasis",
            Self::MotionPath => "motion-path",
        }
    }

    fn preset_class(&self) -> &'static str {
        match self {
            Self::Entrance => "entr",
            Self::Exit => "exit",
            Self::Emphasis => "emph",
            Self::MotionPath => "path",
        }
    }
}

/// What starts an animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    #[default]
    OnClick,
    WithPrevious,
    AfterPrevious,
}

impl Trigger {
    fn from_node_type(value: Option<&str>) -> Self {
        match value {
            Some("withEffect") => Self::WithPrevious,
            Some("afterEffect") => Self::AfterPrevious,
            _ => Self::OnClick,
        }
    }
}

/// Kind of shape an animation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Shape,
    Text,
    Image,
    Chart,
}

/// Direction of a directional effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    FromLeft,
    FromRight,
    FromTop,
    FromBottom,
    ToLeft,
    ToRight,
    ToTop,
    ToBottom,
    Center,
}

impl Direction {
    /// Decode a `presetSubtype` bit for fly effects (1 top, 2 right,
    /// 4 bottom, 8 left); exits fly towards the side.
    fn from_fly_subtype(subtype: u32, category: AnimationCategory) -> Option<Self> {
        let exit = category == AnimationCategory::Exit;
        let direction = match (subtype, exit) {
            (1, false) => Self::FromTop,
            (2, false) => Self::FromRight,
            (4, false) => Self::FromBottom,
            (8, false) => Self::FromLeft,
            (1, true) => Self::ToTop,
            (2, true) => Self::ToRight,
            (4, true) => Self::ToBottom,
            (8, true) => Self::ToLeft,
            (16, _) => Self::Center,
            _ => return None,
        };
        Some(direction)
    }
}

/// One animation of one slide element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub category: AnimationCategory,
    /// Effect name, e.g. "fade" or "fly-in"
    pub effect: String,
    /// Shape id (`p:spTgt@spid`)
    pub target_id: String,
    pub target_type: TargetType,
    pub trigger: Trigger,
    /// Milliseconds
    pub duration: u64,
    /// Milliseconds
    pub delay: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
}

impl AnimationDescriptor {
    /// Descriptor with the default duration and no delay.
    pub fn new(
        category: AnimationCategory,
        effect: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            category,
            effect: effect.into(),
            target_id: target_id.into(),
            target_type: TargetType::Shape,
            trigger: Trigger::OnClick,
            duration: DEFAULT_DURATION_MS,
            delay: 0,
            direction: None,
        }
    }

    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Descriptors of one slide plus the number of timing nodes skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideAnimations {
    pub descriptors: Vec<AnimationDescriptor>,
    pub skipped: usize,
}

/// Parse a slide's `p:timing` tree into a flat, ordered descriptor list.
///
/// Each `p:cTn` carrying `presetClass` is one descriptor. Nodes with an
/// unknown class or without a target shape are skipped and counted. A
/// missing slide or a malformed timing tree yields what was parsed so far.
pub fn extract_animations(container: &DeckContainer, slide_number: usize) -> SlideAnimations {
    let Some(slide) = load_slide(container, slide_number) else {
        return SlideAnimations::default();
    };
    parse_timing(&slide.xml)
}

/// Effect node being assembled.
struct EffectNode {
    depth: usize,
    id: Option<String>,
    preset_class: String,
    preset_id: Option<u32>,
    preset_subtype: Option<u32>,
    node_type: Option<String>,
    delay: Option<u64>,
    longest: Option<u64>,
    target: Option<String>,
    filter: Option<String>,
}

impl EffectNode {
    fn from_ctn(e: &BytesStart<'_>, depth: usize) -> Option<Self> {
        let preset_class = attr(e, b"presetClass")?;
        Some(Self {
            depth,
            id: attr(e, b"id"),
            preset_class,
            preset_id: attr(e, b"presetID").and_then(|v| v.parse().ok()),
            preset_subtype: attr(e, b"presetSubtype").and_then(|v| v.parse().ok()),
            node_type: attr(e, b"nodeType"),
            delay: None,
            longest: attr(e, b"dur").and_then(|v| v.parse().ok()),
            target: None,
            filter: None,
        })
    }

    fn observe(&mut self, e: &BytesStart<'_>) {
        match e.name().local_name().as_ref() {
            b"cond" if self.delay.is_none() => {
                self.delay = Some(
                    attr(e, b"delay")
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(0),
                );
            }
            b"cTn" => {
                if let Some(dur) = attr(e, b"dur").and_then(|v| v.parse::<u64>().ok()) {
                    self.longest = Some(self.longest.map_or(dur, |l| l.max(dur)));
                }
            }
            b"spTgt" if self.target.is_none() => self.target = attr(e, b"spid"),
            b"animEffect" if self.filter.is_none() => self.filter = attr(e, b"filter"),
            _ => {}
        }
    }

    fn finish(
        self,
        ordinal: usize,
        kinds: &HashMap<String, TargetType>,
    ) -> Option<AnimationDescriptor> {
        let Some(category) = AnimationCategory::from_preset_class(&self.preset_class) else {
            log::debug!("skipping timing node with class {}", self.preset_class);
            return None;
        };
        let Some(target_id) = self.target else {
            log::debug!("skipping {} timing node without target", self.preset_class);
            return None;
        };

        let preset = self.preset_id.and_then(|id| preset_effect(category, id));
        let effect = match (preset, self.filter.as_deref()) {
            (Some(name), _) => name.to_string(),
            (None, Some(filter)) => filter_effect(filter, category),
            (None, None) => format!(
                "preset-{}-{}",
                category.preset_class(),
                self.preset_id.unwrap_or(0)
            ),
        };
        let direction = match effect.as_str() {
            "fly-in" | "fly-out" => self
                .preset_subtype
                .and_then(|s| Direction::from_fly_subtype(s, category)),
            _ => None,
        };

        Some(AnimationDescriptor {
            id: self.id.unwrap_or_else(|| format!("anim-{}", ordinal)),
            category,
            effect,
            target_type: kinds.get(&target_id).copied().unwrap_or_default(),
            target_id,
            trigger: Trigger::from_node_type(self.node_type.as_deref()),
            duration: self.longest.unwrap_or(DEFAULT_DURATION_MS),
            delay: self.delay.unwrap_or(0),
            direction,
        })
    }
}

/// Named effect for a PowerPoint preset id within its class.
fn preset_effect(category: AnimationCategory, preset_id: u32) -> Option<&'static str> {
    use AnimationCategory::*;
    let name = match (category, preset_id) {
        (Entrance, 1) => "appear",
        (Entrance, 2) => "fly-in",
        (Entrance, 10) => "fade",
        (Entrance, 16) => "split",
        (Entrance, 17) => "stretch",
        (Entrance, 19) => "swivel",
        (Entrance, 22) => "wipe",
        (Entrance, 23) => "zoom",
        (Exit, 1) | (Exit, 10) => "fade-out",
        (Exit, 2) => "fly-out",
        (Emphasis, 6) => "grow-shrink",
        (Emphasis, 8) => "spin",
        (Emphasis, 26) => "pulse",
        (Emphasis, 32) => "teeter",
        _ => return None,
    };
    Some(name)
}

/// Effect name from an `animEffect@filter` such as `wipe(down)`.
fn filter_effect(filter: &str, category: AnimationCategory) -> String {
    let base = filter.split('(').next().unwrap_or(filter).trim();
    match (base, category) {
        ("fade", AnimationCategory::Exit) => "fade-out".to_string(),
        _ => base.to_string(),
    }
}

fn parse_timing(xml: &str) -> SlideAnimations {
    let kinds = shape_kinds(xml);
    let mut result = SlideAnimations::default();

    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut in_timing = false;
    let mut depth = 0usize;
    let mut current: Option<EffectNode> = None;
    let mut ordinal = 0usize;

    let mut close = |node: EffectNode, result: &mut SlideAnimations| {
        ordinal += 1;
        match node.finish(ordinal, &kinds) {
            Some(descriptor) => result.descriptors.push(descriptor),
            None => result.skipped += 1,
        }
    };

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.name().local_name();
                if local.as_ref() == b"timing" {
                    in_timing = true;
                } else if in_timing && local.as_ref() == b"cTn" {
                    depth += 1;
                    match current.as_mut() {
                        Some(node) => node.observe(e),
                        None => current = EffectNode::from_ctn(e, depth),
                    }
                } else if let Some(node) = current.as_mut() {
                    node.observe(e);
                }
            }
            Ok(Event::Empty(ref e)) if in_timing => match current.as_mut() {
                Some(node) => node.observe(e),
                None => {
                    // Effect node with no children cannot name a target
                    if e.name().local_name().as_ref() == b"cTn" && attr(e, b"presetClass").is_some()
                    {
                        result.skipped += 1;
                    }
                }
            },
            Ok(Event::End(ref e)) => {
                let local = e.name().local_name();
                if local.as_ref() == b"timing" {
                    in_timing = false;
                } else if in_timing && local.as_ref() == b"cTn" {
                    if current.as_ref().is_some_and(|n| n.depth == depth) {
                        if let Some(node) = current.take() {
                            close(node, &mut result);
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("timing tree malformed, keeping parsed nodes: {}", e);
                if let Some(node) = current.take() {
                    close(node, &mut result);
                }
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    result
}

/// Map shape ids in the slide tree to the kind of object they are.
fn shape_kinds(xml: &str) -> HashMap<String, TargetType> {
    let mut kinds = HashMap::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    // (shape id, element kind) of the object being read
    let mut current: Option<(Option<String>, TargetType)> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().local_name().as_ref() {
                b"sp" => current = Some((None, TargetType::Shape)),
                b"pic" => current = Some((None, TargetType::Image)),
                b"graphicFrame" => current = Some((None, TargetType::Shape)),
                b"txBody" => {
                    if let Some((_, kind)) = current.as_mut() {
                        *kind = TargetType::Text;
                    }
                }
                b"graphicData" => mark_chart(&mut current, e),
                b"cNvPr" => record_id(&mut current, e),
                b"timing" => break,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.name().local_name().as_ref() {
                b"cNvPr" => record_id(&mut current, e),
                b"graphicData" => mark_chart(&mut current, e),
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if matches!(
                    e.name().local_name().as_ref(),
                    b"sp" | b"pic" | b"graphicFrame"
                ) {
                    if let Some((Some(id), kind)) = current.take() {
                        kinds.insert(id, kind);
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    kinds
}

fn record_id(current: &mut Option<(Option<String>, TargetType)>, e: &BytesStart<'_>) {
    if let Some((id, _)) = current.as_mut() {
        if id.is_none() {
            *id = attr(e, b"id");
        }
    }
}

fn mark_chart(current: &mut Option<(Option<String>, TargetType)>, e: &BytesStart<'_>) {
    if let Some((_, kind)) = current.as_mut() {
        if attr(e, b"uri").is_some_and(|uri| uri.contains("chart")) {
            *kind = TargetType::Chart;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::container::test_support::container_with_slide;

    fn animations_of(effects: &str) -> SlideAnimations {
        let container = container_with_slide(SHAPES, &timing(effects), "");
        extract_animations(&container, 1)
    }

    #[test]
    fn test_entrance_fly_in() {
        let result = animations_of(&effect(5, "entr", 2, 8, "clickEffect", "0", "2", 750));
        assert_eq!(result.skipped, 0);
        assert_eq!(result.descriptors.len(), 1);

        let d = &result.descriptors[0];
        assert_eq!(d.id, "5");
        assert_eq!(d.category, AnimationCategory::Entrance);
        assert_eq!(d.effect, "fly-in");
        assert_eq!(d.direction, Some(Direction::FromLeft));
        assert_eq!(d.target_id, "2");
        assert_eq!(d.target_type, TargetType::Text);
        assert_eq!(d.trigger, Trigger::OnClick);
        assert_eq!(d.duration, 750);
        assert_eq!(d.delay, 0);
    }

    #[test]
    fn test_sequence_order_triggers_and_delay() {
        let effects = format!(
            "{}{}{}",
            effect(5, "entr", 10, 0, "clickEffect", "0", "2", 500),
            effect(6, "emph", 8, 0, "withEffect", "250", "3", 2000),
            effect(7, "exit", 2, 2, "afterEffect", "indefinite", "4", 500)
        );
        let result = animations_of(&effects);
        let effects: Vec<&str> = result.descriptors.iter().map(|d| d.effect.as_str()).collect();
        assert_eq!(effects, vec!["fade", "spin", "fly-out"]);

        assert_eq!(result.descriptors[1].trigger, Trigger::WithPrevious);
        assert_eq!(result.descriptors[1].delay, 250);
        assert_eq!(result.descriptors[1].target_type, TargetType::Image);

        let exit = &result.descriptors[2];
        assert_eq!(exit.trigger, Trigger::AfterPrevious);
        assert_eq!(exit.delay, 0);
        assert_eq!(exit.direction, Some(Direction::ToRight));
        assert_eq!(exit.target_type, TargetType::Chart);
    }

    #[test]
    fn test_unknown_preset_uses_filter_name() {
        let result = animations_of(&effect(5, "entr", 3, 0, "clickEffect", "0", "2", 500));
        assert_eq!(result.descriptors[0].effect, "fade");

        let result = animations_of(&effect(5, "exit", 42, 0, "clickEffect", "0", "2", 500));
        assert_eq!(result.descriptors[0].effect, "fade-out");
    }

    #[test]
    fn test_unparseable_nodes_are_skipped_and_counted() {
        let no_target = r#"<p:par><p:cTn id="9" presetID="10" presetClass="entr" nodeType="clickEffect"><p:stCondLst><p:cond delay="0"/></p:stCondLst></p:cTn></p:par>"#;
        let media = r#"<p:par><p:cTn id="10" presetClass="mediacall" presetID="1"><p:childTnLst><p:cmd type="call" cmd="playFrom(0.0)"><p:cBhvr><p:cTn id="11" dur="1"/><p:tgtEl><p:spTgt spid="3"/></p:tgtEl></p:cBhvr></p:cmd></p:childTnLst></p:cTn></p:par>"#;
        let empty = r#"<p:par><p:cTn id="12" presetClass="entr" presetID="1"/></p:par>"#;
        let effects = format!(
            "{}{}{}{}",
            no_target,
            media,
            empty,
            effect(5, "entr", 1, 0, "clickEffect", "0", "2", 500)
        );

        let result = animations_of(&effects);
        assert_eq!(result.skipped, 3);
        assert_eq!(result.descriptors.len(), 1);
        assert_eq!(result.descriptors[0].effect, "appear");
    }

    #[test]
    fn test_slide_without_timing() {
        let container = container_with_slide(SHAPES, "", "");
        assert_eq!(extract_animations(&container, 1), SlideAnimations::default());
        assert_eq!(extract_animations(&container, 2), SlideAnimations::default());
    }
}
