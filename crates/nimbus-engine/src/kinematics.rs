//! Drift of a mask anchor: bouncing inside a box or wrapping across the screen.

use nimbus_core::Viewport;
use rand::Rng;

use crate::particle::ParamRange;

/// Which velocity components were reversed on a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub fn any(&self) -> bool {
        self.x || self.y
    }
}

/// Outcome of advancing a drift by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftEvent {
    /// Set on the step a bounce reverses the drift.
    pub flip: Flip,
    /// Set on the step the anchor wraps back to its re-entry point.
    pub wrapped: bool,
}

/// Half-extents of the box a bouncing anchor stays in, around its base.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftBounds {
    pub x: f32,
    pub y: f32,
}

impl DriftBounds {
    /// `x = width * fx - margin`, `y = height * fy`.
    pub fn from_viewport(viewport: Viewport, fx: f32, fy: f32, margin: f32) -> Self {
        Self {
            x: (viewport.w() * fx - margin).max(0.0),
            y: (viewport.h() * fy).max(0.0),
        }
    }
}

/// Rule for an anchor that drifts one way and re-enters from the other side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WrapRule {
    /// Amplitude of the sinusoidal gust added to the horizontal speed.
    pub gust: f32,
    /// Per-step vertical random walk amplitude.
    pub jitter: f32,
    /// Horizontal offset past which the anchor wraps.
    pub limit: f32,
    /// Horizontal offset the anchor re-enters at.
    pub reentry: f32,
    /// Vertical offset range picked on re-entry.
    pub lane: ParamRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftMode {
    /// The anchor never moves.
    Static,
    /// Exact reflection at the bounds, like a bouncing logo.
    Bounce(DriftBounds),
    /// Horizontal drift that wraps past a limit.
    Wrap(WrapRule),
}

/// Offset of a mask anchor from its base position, and its velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drift {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub mode: DriftMode,
}

impl Drift {
    pub fn fixed() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            mode: DriftMode::Static,
        }
    }

    pub fn bounce(velocity: (f32, f32), bounds: DriftBounds) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            vx: velocity.0,
            vy: velocity.1,
            mode: DriftMode::Bounce(bounds),
        }
    }

    pub fn wrap(start: (f32, f32), speed: f32, rule: WrapRule) -> Self {
        Self {
            x: start.0,
            y: start.1,
            vx: speed,
            vy: 0.0,
            mode: DriftMode::Wrap(rule),
        }
    }

    /// Advance the offset by `dt` frames.
    ///
    /// A bounce flips a component only while the offset is beyond its bound
    /// and still moving outward, so each crossing reverses it exactly once.
    pub fn advance<R: Rng>(&mut self, dt: f32, frame: u64, rng: &mut R) -> DriftEvent {
        let mut event = DriftEvent::default();
        match self.mode {
            DriftMode::Static => {}
            DriftMode::Bounce(bounds) => {
                self.x += self.vx * dt;
                self.y += self.vy * dt;
                if (self.x > bounds.x && self.vx > 0.0) || (self.x < -bounds.x && self.vx < 0.0) {
                    self.vx = -self.vx;
                    event.flip.x = true;
                }
                if (self.y > bounds.y && self.vy > 0.0) || (self.y < -bounds.y && self.vy < 0.0) {
                    self.vy = -self.vy;
                    event.flip.y = true;
                }
            }
            DriftMode::Wrap(rule) => {
                let gust = rule.gust * (frame as f32 * 0.01).sin();
                self.x += (self.vx + gust) * dt;
                if rule.jitter > 0.0 {
                    self.y += rng.random_range(-rule.jitter..rule.jitter) * dt;
                }
                if self.x > rule.limit {
                    self.x = rule.reentry;
                    self.y = rule.lane.sample(rng);
                    event.wrapped = true;
                }
            }
        }
        event
    }
}
