//! Masked particle cloud engine for nimbus.
//!
//! A [`Scene`] holds layers of particles that fade in over an opacity mask
//! and fade out everywhere else, so that text or cloud shapes appear out of
//! a drifting haze. Masks can bounce, wrap or sway, and a scene may
//! periodically fade everything out and rebuild itself.

mod compositor;
mod cycle;
mod error;
mod kinematics;
mod mask;
mod particle;
mod presets;
mod scene;

pub use compositor::{Blend, DrawCommand, JITTER_RATE, JITTER_SCALE, jitter, step, update_alpha};
pub use cycle::{CycleConfig, CyclePhase, tick};
pub use error::{EngineError, Result};
pub use kinematics::{Drift, DriftBounds, DriftEvent, DriftMode, Flip, WrapRule};
pub use mask::{
    CLOUD_FLATTEN, CloudSampler, CloudShape, Coverage, Disc, MEMBERSHIP_THRESHOLD, Mask,
    TextBanner, TextStyle, render_cloud_mask, render_text_mask, sway_offset,
};
pub use particle::{
    ALPHA_MAX, Lifespan, ParamRange, Particle, ParticleRanges, Pool, Respawn, Spawner, Wind,
};
pub use presets::{PresetOptions, build_scene, scene_config};
pub use scene::{
    CloudSpec, Layer, LayerConfig, MaskSlot, MaskSource, Scene, SceneConfig, SlotConfig,
};
