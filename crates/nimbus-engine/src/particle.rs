//! Particle records and the fixed-size pool that owns them.

use std::f32::consts::TAU;

use nimbus_core::Viewport;
use rand::Rng;

use crate::error::{EngineError, Result};
use crate::kinematics::Flip;

/// Upper bound of a particle's alpha.
pub const ALPHA_MAX: f32 = 255.0;

/// A closed range a particle field is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
}

impl ParamRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always yields `value`.
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Draw a value uniformly from the range.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max > self.min {
            rng.random_range(self.min..self.max)
        } else {
            self.min
        }
    }

    /// Check the range is finite and not inverted.
    pub fn validate(&self, name: &'static str) -> Result<()> {
        if self.min.is_finite() && self.max.is_finite() && self.min <= self.max {
            Ok(())
        } else {
            Err(EngineError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// Countdown that keeps a particle alive while it sits outside the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifespan {
    /// Frames left. Refilled to `max` while inside the mask.
    pub remaining: i32,
    pub max: i32,
    /// Amount removed for every frame spent outside the mask.
    pub decrement: i32,
}

impl Lifespan {
    pub const fn new(max: i32, decrement: i32) -> Self {
        Self {
            remaining: max,
            max,
            decrement,
        }
    }

    pub fn refresh(&mut self) {
        self.remaining = self.max;
    }

    pub fn decay(&mut self) {
        self.remaining = self.remaining.saturating_sub(self.decrement);
    }

    pub fn expired(&self) -> bool {
        self.remaining <= 0
    }
}

/// Where a particle re-enters once it has faded out off screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Respawn {
    /// Anywhere in the spawn region, with every field redrawn.
    #[default]
    Scatter,
    /// Just behind the edge it is travelling away from, at a random height.
    TrailingEdge,
}

/// Ranges every particle field is drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleRanges {
    pub x: ParamRange,
    pub y: ParamRange,
    pub radius: ParamRange,
    pub vx: ParamRange,
    pub vy: ParamRange,
    pub fade_speed: ParamRange,
    pub fade_out_speed: ParamRange,
    /// Lifespan template; `None` disables lifespan tracking.
    pub lifespan: Option<Lifespan>,
    pub respawn: Respawn,
}

impl ParticleRanges {
    /// Validate every range once, before any particle is drawn from it.
    pub fn validate(&self) -> Result<()> {
        self.x.validate("x")?;
        self.y.validate("y")?;
        self.radius.validate("radius")?;
        self.vx.validate("vx")?;
        self.vy.validate("vy")?;
        self.fade_speed.validate("fade_speed")?;
        self.fade_out_speed.validate("fade_out_speed")?;
        if self.radius.min <= 0.0 {
            return Err(EngineError::InvalidRange {
                name: "radius",
                min: self.radius.min,
                max: self.radius.max,
            });
        }
        if self.fade_speed.min <= 0.0 || self.fade_out_speed.min <= 0.0 {
            return Err(EngineError::Config("fade speeds must be positive"));
        }
        if let Some(life) = self.lifespan
            && (life.max <= 0 || life.decrement <= 0)
        {
            return Err(EngineError::Config("lifespan and its decrement must be positive"));
        }
        Ok(())
    }
}

/// One soft, fading disc.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub vx: f32,
    pub vy: f32,
    /// Opacity in `[0, 255]`.
    pub alpha: f32,
    /// Alpha gained per frame inside the mask.
    pub fade_speed: f32,
    /// Alpha lost per frame outside the mask.
    pub fade_out_speed: f32,
    /// Phase of the cosmetic jitter, in `[0, 2π)`.
    pub phase_offset: f32,
    pub lifespan: Option<Lifespan>,
}

/// Current sign of the shared wind, applied to freshly drawn velocities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wind {
    pub x: f32,
    pub y: f32,
}

impl Default for Wind {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// Draws and re-draws particles for a pool.
#[derive(Debug, Clone)]
pub struct Spawner {
    ranges: ParticleRanges,
    viewport: Viewport,
    /// Distance past the viewport edge a particle must reach to count as off screen.
    margin: f32,
    wind: Wind,
}

impl Spawner {
    /// Draw a fresh, fully transparent particle.
    pub fn spawn<R: Rng>(&self, rng: &mut R) -> Particle {
        let r = &self.ranges;
        Particle {
            x: r.x.sample(rng),
            y: r.y.sample(rng),
            radius: r.radius.sample(rng),
            vx: r.vx.sample(rng) * self.wind.x,
            vy: r.vy.sample(rng) * self.wind.y,
            alpha: 0.0,
            fade_speed: r.fade_speed.sample(rng),
            fade_out_speed: r.fade_out_speed.sample(rng),
            phase_offset: rng.random_range(0.0..TAU),
            lifespan: r.lifespan,
        }
    }

    /// Replace `particle` in place with a freshly drawn one.
    pub fn respawn<R: Rng>(&self, particle: &mut Particle, rng: &mut R) {
        let fresh = self.spawn(rng);
        let x = match self.ranges.respawn {
            Respawn::Scatter => fresh.x,
            Respawn::TrailingEdge if fresh.vx < 0.0 => self.viewport.w() + fresh.radius,
            Respawn::TrailingEdge => -fresh.radius,
        };
        *particle = Particle { x, ..fresh };
    }

    /// Whether the particle has left the viewport entirely, margin included.
    pub fn is_off_screen(&self, p: &Particle) -> bool {
        let w = self.viewport.w();
        let h = self.viewport.h();
        let m = self.margin;
        p.x - p.radius > w + m
            || p.x + p.radius < -m
            || p.y - p.radius > h + m
            || p.y + p.radius < -m
    }

    /// A particle is recycled only once it is invisible, and then either
    /// because it drifted off screen (after its lifespan ran out, when
    /// tracked) or because its lifespan expired.
    pub fn should_respawn(&self, p: &Particle) -> bool {
        if p.alpha > 0.0 {
            return false;
        }
        match p.lifespan {
            None => self.is_off_screen(p),
            Some(life) => life.expired(),
        }
    }

    pub fn wind(&self) -> Wind {
        self.wind
    }
}

/// Fixed-size collection of particles.
#[derive(Debug, Clone)]
pub struct Pool {
    particles: Vec<Particle>,
    spawner: Spawner,
}

impl Pool {
    /// Create a pool of `size` particles drawn from `ranges`.
    pub fn new<R: Rng>(
        size: usize,
        ranges: ParticleRanges,
        viewport: Viewport,
        margin: f32,
        rng: &mut R,
    ) -> Result<Self> {
        ranges.validate()?;
        let spawner = Spawner {
            ranges,
            viewport,
            margin,
            wind: Wind::default(),
        };
        let particles = (0..size).map(|_| spawner.spawn(rng)).collect();
        Ok(Self { particles, spawner })
    }

    /// Throw the current population away and draw `size` new particles.
    ///
    /// The old storage is released rather than reused. The wind sign is
    /// kept so new particles travel with the current drift.
    pub fn replace<R: Rng>(&mut self, size: usize, rng: &mut R) {
        self.particles = (0..size).map(|_| self.spawner.spawn(rng)).collect();
    }

    /// Negate the selected velocity component of every particle.
    pub fn flip(&mut self, flip: Flip) {
        if flip.x {
            self.spawner.wind.x = -self.spawner.wind.x;
        }
        if flip.y {
            self.spawner.wind.y = -self.spawner.wind.y;
        }
        for p in &mut self.particles {
            if flip.x {
                p.vx = -p.vx;
            }
            if flip.y {
                p.vy = -p.vy;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// Borrow the particles mutably alongside the spawner that recycles them.
    pub fn parts_mut(&mut self) -> (&mut [Particle], &Spawner) {
        (&mut self.particles, &self.spawner)
    }
}
