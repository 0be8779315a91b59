//! Per-frame particle update against a mask.
//!
//! Each particle moves, samples the mask under its truncated position and
//! fades in or out with separate rates, which keeps edges from flickering.
//! Visible particles are emitted as [`DrawCommand`]s.

use nimbus_core::Rgb;
use rand::Rng;

use crate::mask::Coverage;
use crate::particle::{ALPHA_MAX, Particle, Pool};

/// Angular rate of the cosmetic jitter, per frame.
pub const JITTER_RATE: f32 = 0.01;

/// Jitter amplitude as a fraction of the particle radius.
pub const JITTER_SCALE: f32 = 0.3;

/// A filled disc to draw this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: Rgb,
    /// Opacity in `[0, 255]`.
    pub alpha: f32,
}

/// How a layer's particles are tinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    /// Ceiling applied to particle alpha, in `(0, 1]`.
    pub max_alpha: f32,
    pub color: Rgb,
}

/// Apply one frame of hysteresis fading to `p`.
///
/// `fade_all` carries the fast fade rate while a cycle is blanking the
/// population; mask membership is ignored then.
pub fn update_alpha(p: &mut Particle, inside: bool, fade_all: Option<f32>) {
    if let Some(rate) = fade_all {
        p.alpha -= rate;
    } else if inside {
        p.alpha += p.fade_speed;
        if let Some(life) = p.lifespan.as_mut() {
            life.refresh();
        }
    } else {
        p.alpha -= p.fade_out_speed;
        if let Some(life) = p.lifespan.as_mut() {
            life.decay();
        }
    }
    p.alpha = p.alpha.clamp(0.0, ALPHA_MAX);
}

/// Offset of the cosmetic wobble at frame `t`.
pub fn jitter(p: &Particle, t: u64) -> (f32, f32) {
    let a = t as f32 * JITTER_RATE + p.phase_offset;
    let amp = p.radius * JITTER_SCALE;
    (a.sin() * amp, a.cos() * amp)
}

/// Advance every particle in `pool` one frame against `mask` and append a
/// draw command for each visible one to `out`.
pub fn step<C, R>(
    pool: &mut Pool,
    mask: &C,
    frame: u64,
    blend: Blend,
    fade_all: Option<f32>,
    rng: &mut R,
    out: &mut Vec<DrawCommand>,
) where
    C: Coverage + ?Sized,
    R: Rng,
{
    let (particles, spawner) = pool.parts_mut();
    for p in particles.iter_mut() {
        p.x += p.vx;
        p.y += p.vy;

        let inside = mask.is_inside(p.x as i64, p.y as i64);
        update_alpha(p, inside, fade_all);

        if p.alpha > 0.0 {
            let (jx, jy) = jitter(p, frame);
            out.push(DrawCommand {
                x: p.x + jx,
                y: p.y + jy,
                radius: p.radius,
                color: blend.color,
                alpha: p.alpha * blend.max_alpha,
            });
        }

        if spawner.should_respawn(p) {
            spawner.respawn(p, rng);
        }
    }
}
