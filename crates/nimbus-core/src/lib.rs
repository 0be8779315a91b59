//! Core types shared by the nimbus crates.

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Size of the drawable surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width as a float, for layout arithmetic.
    pub fn w(&self) -> f32 {
        self.width as f32
    }

    /// Height as a float, for layout arithmetic.
    pub fn h(&self) -> f32 {
        self.height as f32
    }

    /// Number of pixels covered by the viewport.
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether integer pixel coordinates fall inside `[0, width) x [0, height)`.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }
}

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const SKY: Rgb = Rgb(135, 206, 235);

    /// Blend `self` over `dst` with coverage `alpha` in `[0, 1]`.
    pub fn over(self, dst: Rgb, alpha: f32) -> Rgb {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * (1.0 - a)).round() as u8;
        Rgb(mix(self.0, dst.0), mix(self.1, dst.1), mix(self.2, dst.2))
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

/// Scene presets, one per animation variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// Drifting text with two ambient clouds passing above it.
    #[default]
    OpenCall,
    /// Text bouncing inside a box, flipping the wind on every wall hit.
    Bounce,
    /// A single cloud whose population is faded out and rebuilt periodically.
    Cycle,
    /// A cloud re-randomized every few frames so it billows in place.
    Billow,
}

impl Preset {
    /// All presets in display order.
    pub const ALL: [Preset; 4] = [
        Preset::OpenCall,
        Preset::Bounce,
        Preset::Cycle,
        Preset::Billow,
    ];

    /// Short human readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Preset::OpenCall => "open-call",
            Preset::Bounce => "bounce",
            Preset::Cycle => "cycle",
            Preset::Billow => "billow",
        }
    }

    /// Cycle to the next preset.
    pub fn next(&self) -> Self {
        match self {
            Preset::OpenCall => Preset::Bounce,
            Preset::Bounce => Preset::Cycle,
            Preset::Cycle => Preset::Billow,
            Preset::Billow => Preset::OpenCall,
        }
    }
}

/// When a mask raster is re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegenPolicy {
    /// Re-render on every frame.
    EveryFrame,
    /// Re-render when the frame counter is a multiple of `k`.
    EveryKFrames(u32),
    /// Re-render only when the mask anchor wraps past the viewport edge.
    OnAnchorWrap,
}

impl RegenPolicy {
    /// Whether a mask under this policy must be re-rendered on `frame`.
    ///
    /// A wrap always forces a re-render regardless of policy.
    pub fn is_due(&self, frame: u64, wrapped: bool) -> bool {
        if wrapped {
            return true;
        }
        match *self {
            RegenPolicy::EveryFrame => true,
            RegenPolicy::EveryKFrames(k) => k != 0 && frame % k as u64 == 0,
            RegenPolicy::OnAnchorWrap => false,
        }
    }
}

/// How a cloud's disc layout evolves between regenerations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapePolicy {
    /// Keep the precomputed layout and redraw it with a sway offset.
    #[default]
    Replay,
    /// Draw a fresh random layout on every regeneration.
    Rerandomize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_contains() {
        let vp = Viewport::new(10, 10);
        assert!(vp.contains(0, 0));
        assert!(vp.contains(9, 9));
        assert!(!vp.contains(-1, 5));
        assert!(!vp.contains(10, 5));
        assert!(!Viewport::new(0, 0).contains(0, 0));
    }

    #[test]
    fn test_regen_policy_schedule() {
        assert!(RegenPolicy::EveryFrame.is_due(7, false));
        assert!(RegenPolicy::EveryKFrames(5).is_due(10, false));
        assert!(!RegenPolicy::EveryKFrames(5).is_due(11, false));
        assert!(!RegenPolicy::EveryKFrames(0).is_due(0, false));
        assert!(!RegenPolicy::OnAnchorWrap.is_due(3, false));
        assert!(RegenPolicy::OnAnchorWrap.is_due(3, true));
    }

    #[test]
    fn test_rgb_over() {
        assert_eq!(Rgb::WHITE.over(Rgb(0, 0, 0), 1.0), Rgb::WHITE);
        assert_eq!(Rgb::WHITE.over(Rgb(0, 0, 0), 0.0), Rgb(0, 0, 0));
        assert_eq!(Rgb(200, 100, 0).over(Rgb(0, 0, 0), 0.5), Rgb(100, 50, 0));
    }

    #[test]
    fn test_preset_serde_names() {
        for preset in Preset::ALL {
            let toml_name = preset.name();
            assert!(!toml_name.is_empty());
        }
        assert_eq!(Preset::default(), Preset::OpenCall);
    }

    #[test]
    fn test_preset_next_visits_all() {
        let mut preset = Preset::default();
        for expected in Preset::ALL {
            assert_eq!(preset, expected);
            preset = preset.next();
        }
        assert_eq!(preset, Preset::OpenCall);
    }
}
