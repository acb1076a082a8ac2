//! Effect mapping table: native effects to keyframe curves.

use super::descriptor::{AnimationDescriptor, Direction};
use serde::{Deserialize, Serialize};

/// Offset in canvas units that fly effects start from or travel to.
pub const FLY_OFFSET: f64 = 200.0;

/// Animated property a keyframe controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyframeProperty {
    Opacity,
    X,
    Y,
    Scale,
    ScaleX,
    ScaleY,
    Rotation,
    Blur,
    Brightness,
}

/// Interpolation curve towards a keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
}

/// One control point of an animated property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Milliseconds
    pub time: f64,
    pub property: KeyframeProperty,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub easing: Option<Easing>,
}

impl Keyframe {
    pub fn new(time: f64, property: KeyframeProperty, value: f64) -> Self {
        Self {
            time,
            property,
            value,
            easing: None,
        }
    }

    pub fn eased(time: f64, property: KeyframeProperty, value: f64, easing: Easing) -> Self {
        Self {
            easing: Some(easing),
            ..Self::new(time, property, value)
        }
    }
}

/// Effects with a keyframe mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    Fade,
    Appear,
    FlyIn,
    Wipe,
    Zoom,
    Split,
    Stretch,
    Swivel,
    FadeOut,
    FlyOut,
    Pulse,
    GrowShrink,
    Spin,
    Teeter,
}

impl Effect {
    pub const ALL: [Effect; 14] = [
        Effect::Fade,
        Effect::Appear,
        Effect::FlyIn,
        Effect::Wipe,
        Effect::Zoom,
        Effect::Split,
        Effect::Stretch,
        Effect::Swivel,
        Effect::FadeOut,
        Effect::FlyOut,
        Effect::Pulse,
        Effect::GrowShrink,
        Effect::Spin,
        Effect::Teeter,
    ];

    /// Look up an effect by name, ignoring case and treating spaces and
    /// underscores as hyphens ("Fly In", "fly_in" and "fly-in" agree).
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect();
        Self::ALL.into_iter().find(|e| e.name() == normalized)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Fade => "fade",
            Effect::Appear => "appear",
            Effect::FlyIn => "fly-in",
            Effect::Wipe => "wipe",
            Effect::Zoom => "zoom",
            Effect::Split => "split",
            Effect::Stretch => "stretch",
            Effect::Swivel => "swivel",
            Effect::FadeOut => "fade-out",
            Effect::FlyOut => "fly-out",
            Effect::Pulse => "pulse",
            Effect::GrowShrink => "grow-shrink",
            Effect::Spin => "spin",
            Effect::Teeter => "teeter",
        }
    }

    /// Names of every mapped effect.
    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Effect::name).collect()
    }

    /// Keyframes for this effect relative to the animation start (no delay).
    pub fn keyframes(&self, descriptor: &AnimationDescriptor) -> Vec<Keyframe> {
        use Easing::*;
        use KeyframeProperty::*;

        let d = descriptor.duration as f64;
        match self {
            Effect::Fade => vec![
                Keyframe::eased(0.0, Opacity, 0.0, EaseIn),
                Keyframe::eased(d, Opacity, 1.0, EaseIn),
            ],
            Effect::Appear => vec![Keyframe::new(0.0, Opacity, 0.0), Keyframe::new(d, Opacity, 1.0)],
            Effect::FlyIn => {
                let (property, start) = match descriptor.direction {
                    Some(Direction::FromLeft) => (X, -FLY_OFFSET),
                    Some(Direction::FromRight) => (X, FLY_OFFSET),
                    Some(Direction::FromTop) => (Y, -FLY_OFFSET),
                    Some(Direction::FromBottom) => (Y, FLY_OFFSET),
                    _ => return Effect::Fade.keyframes(descriptor),
                };
                vec![
                    Keyframe::eased(0.0, property, start, EaseOut),
                    Keyframe::new(0.0, Opacity, 0.0),
                    Keyframe::eased(d, property, 0.0, EaseOut),
                    Keyframe::new(d, Opacity, 1.0),
                ]
            }
            Effect::Wipe => vec![
                Keyframe::eased(0.0, ScaleX, 0.0, Linear),
                Keyframe::new(0.0, Opacity, 1.0),
                Keyframe::eased(d, ScaleX, 1.0, Linear),
            ],
            Effect::Zoom => vec![
                Keyframe::eased(0.0, Scale, 0.0, EaseOutCubic),
                Keyframe::new(0.0, Opacity, 0.0),
                Keyframe::eased(d, Scale, 1.0, EaseOutCubic),
                Keyframe::new(d, Opacity, 1.0),
            ],
            Effect::Split => vec![
                Keyframe::eased(0.0, ScaleX, 0.0, EaseOut),
                Keyframe::new(0.0, Opacity, 1.0),
                Keyframe::eased(d, ScaleX, 1.0, EaseOut),
            ],
            Effect::Stretch => vec![
                Keyframe::eased(0.0, ScaleY, 0.0, EaseOut),
                Keyframe::eased(d, ScaleY, 1.0, EaseOut),
            ],
            Effect::Swivel => vec![
                Keyframe::eased(0.0, Rotation, -90.0, EaseOut),
                Keyframe::new(0.0, Opacity, 0.0),
                Keyframe::eased(d, Rotation, 0.0, EaseOut),
                Keyframe::new(d, Opacity, 1.0),
            ],
            Effect::FadeOut => vec![
                Keyframe::eased(0.0, Opacity, 1.0, EaseOut),
                Keyframe::eased(d, Opacity, 0.0, EaseOut),
            ],
            Effect::FlyOut => {
                let end = match descriptor.direction {
                    Some(Direction::ToLeft) => -FLY_OFFSET,
                    Some(Direction::ToRight) => FLY_OFFSET,
                    _ => return Effect::FadeOut.keyframes(descriptor),
                };
                vec![
                    Keyframe::eased(0.0, X, 0.0, EaseIn),
                    Keyframe::new(0.0, Opacity, 1.0),
                    Keyframe::eased(d, X, end, EaseIn),
                    Keyframe::new(d, Opacity, 0.0),
                ]
            }
            Effect::Pulse => pulse(d, 1.1),
            Effect::GrowShrink => pulse(d, 1.2),
            Effect::Spin => vec![
                Keyframe::eased(0.0, Rotation, 0.0, Linear),
                Keyframe::eased(d, Rotation, 360.0, Linear),
            ],
            Effect::Teeter => [0.0, -10.0, 10.0, -5.0, 0.0]
                .into_iter()
                .enumerate()
                .map(|(i, angle)| Keyframe::eased(d * i as f64 * 0.25, Rotation, angle, EaseInOut))
                .collect(),
        }
    }
}

fn pulse(duration: f64, peak: f64) -> Vec<Keyframe> {
    use KeyframeProperty::Scale;
    vec![
        Keyframe::eased(0.0, Scale, 1.0, Easing::EaseInOut),
        Keyframe::eased(duration / 2.0, Scale, peak, Easing::EaseInOut),
        Keyframe::eased(duration, Scale, 1.0, Easing::EaseInOut),
    ]
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::descriptor::AnimationCategory;

    fn descriptor(effect: &str) -> AnimationDescriptor {
        AnimationDescriptor::new(AnimationCategory::Entrance, effect, "2").with_duration(1000)
    }

    #[test]
    fn test_from_name_normalizes() {
        assert_eq!(Effect::from_name("Fly In"), Some(Effect::FlyIn));
        assert_eq!(Effect::from_name("GROW_SHRINK"), Some(Effect::GrowShrink));
        assert_eq!(Effect::from_name("fade-out"), Some(Effect::FadeOut));
        assert_eq!(Effect::from_name("checkerboard"), None);
        assert_eq!(Effect::supported_names().len(), 14);
    }

    #[test]
    fn test_fly_in_from_left() {
        let d = descriptor("fly-in").with_direction(Direction::FromLeft);
        let frames = Effect::FlyIn.keyframes(&d);
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0].property, KeyframeProperty::X);
        assert_eq!(frames[0].value, -200.0);
        assert_eq!(frames[0].easing, Some(Easing::EaseOut));
        assert_eq!(frames[1].property, KeyframeProperty::Opacity);
        assert_eq!(frames[1].easing, None);
        assert_eq!(frames[2].time, 1000.0);
        assert_eq!(frames[2].value, 0.0);
    }

    #[test]
    fn test_directional_effects_without_direction_fall_back() {
        let d = descriptor("fly-in");
        assert_eq!(Effect::FlyIn.keyframes(&d), Effect::Fade.keyframes(&d));

        let d = descriptor("fly-out").with_direction(Direction::ToTop);
        assert_eq!(Effect::FlyOut.keyframes(&d), Effect::FadeOut.keyframes(&d));
    }

    #[test]
    fn test_pulse_peaks_at_midpoint() {
        let frames = Effect::Pulse.keyframes(&descriptor("pulse"));
        let points: Vec<(f64, f64)> = frames.iter().map(|k| (k.time, k.value)).collect();
        assert_eq!(points, vec![(0.0, 1.0), (500.0, 1.1), (1000.0, 1.0)]);
    }

    #[test]
    fn test_teeter_quarter_points() {
        let frames = Effect::Teeter.keyframes(&descriptor("teeter"));
        let points: Vec<(f64, f64)> = frames.iter().map(|k| (k.time, k.value)).collect();
        assert_eq!(
            points,
            vec![
                (0.0, 0.0),
                (250.0, -10.0),
                (500.0, 10.0),
                (750.0, -5.0),
                (1000.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_spin_is_linear_full_turn() {
        let frames = Effect::Spin.keyframes(&descriptor("spin"));
        assert_eq!(frames[1].value, 360.0);
        assert!(frames.iter().all(|k| k.easing == Some(Easing::Linear)));
    }

    #[test]
    fn test_every_keyframe_within_duration() {
        for effect in Effect::ALL {
            for k in effect.keyframes(&descriptor(effect.name())) {
                assert!(k.time >= 0.0 && k.time <= 1000.0, "{} {:?}", effect, k);
            }
        }
    }
}
