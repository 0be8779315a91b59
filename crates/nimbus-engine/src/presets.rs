//! Scene configurations for each [`Preset`], scaled to the viewport.

use std::f32::consts::TAU;

use nimbus_core::{Preset, RegenPolicy, Rgb, ShapePolicy, Viewport};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::compositor::Blend;
use crate::cycle::CycleConfig;
use crate::error::{EngineError, Result};
use crate::kinematics::{Drift, DriftBounds, WrapRule};
use crate::mask::{TextBanner, TextStyle};
use crate::particle::{Lifespan, ParamRange, ParticleRanges, Respawn};
use crate::scene::{CloudSpec, LayerConfig, MaskSource, Scene, SceneConfig, SlotConfig};

/// Discs drawn per cloud blob.
const CLOUD_DISCS: usize = 100;

/// Blending ceiling of text particles.
const TEXT_MAX_ALPHA: f32 = 0.5;

/// Blending ceiling of ambient cloud particles.
const CLOUD_MAX_ALPHA: f32 = 0.3;

/// Letter spacing of text masks, in em.
const LETTER_SPACING: f32 = 0.18;

/// Caller-supplied overrides applied on top of a preset.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetOptions {
    pub text: Vec<String>,
    pub color: Rgb,
    /// Initial population of the first layer only.
    pub population: Option<usize>,
    /// Post-reset population of the first layer only.
    pub post_reset_population: Option<usize>,
    pub cycle_period: Option<u64>,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            text: vec!["OPEN".to_string(), "  CALL".to_string()],
            color: Rgb::WHITE,
            population: None,
            post_reset_population: None,
            cycle_period: None,
        }
    }
}

/// Build a scene for `preset` from a seed.
pub fn build_scene(
    preset: Preset,
    viewport: Viewport,
    options: &PresetOptions,
    seed: u64,
) -> Result<Scene> {
    let mut rng = StdRng::seed_from_u64(seed);
    let config = scene_config(preset, viewport, options, &mut rng)?;
    log::info!("building preset {} with seed {seed}", preset.name());
    Scene::new(config, rng)
}

/// Describe the layers of `preset` for a viewport of the given size.
pub fn scene_config<R: Rng>(
    preset: Preset,
    viewport: Viewport,
    options: &PresetOptions,
    rng: &mut R,
) -> Result<SceneConfig> {
    if viewport.width == 0 || viewport.height == 0 {
        return Err(EngineError::Config("viewport must not be empty"));
    }
    let mut config = match preset {
        Preset::OpenCall => open_call(viewport, options, rng)?,
        Preset::Bounce => bounce(viewport, options)?,
        Preset::Cycle => cycle(viewport, options, rng),
        Preset::Billow => billow(viewport, options, rng),
    };

    if let Some(period) = options.cycle_period {
        let fade_window = config
            .cycle
            .map(|c| c.fade_window)
            .filter(|&w| w < period)
            .unwrap_or(period / 15);
        let fade_rate = config.cycle.map_or(6.0, |c| c.fade_rate);
        config.cycle = Some(CycleConfig {
            period,
            fade_window,
            fade_rate,
        });
    }
    // Ambient layers keep the preset's populations.
    if let Some(first) = config.layers.first_mut() {
        if let Some(n) = options.population {
            first.initial_population = n;
        }
        if let Some(n) = options.post_reset_population {
            first.post_reset_population = n;
        }
    }
    Ok(config)
}

/// Speed scale relative to a 960 pixel wide reference viewport.
fn speed_scale(viewport: Viewport) -> f32 {
    (viewport.w() / 960.0).clamp(0.1, 2.0)
}

/// Population proportional to viewport area, clamped.
fn population(viewport: Viewport, density: f32, min: usize, max: usize) -> usize {
    ((viewport.area() as f32 * density) as usize).clamp(min, max)
}

fn text_style(viewport: Viewport) -> TextStyle {
    let font_size = (viewport.w() * 0.14).min(viewport.h() * 0.3).max(7.0);
    TextStyle {
        font_size,
        letter_spacing: LETTER_SPACING,
        line_spacing: font_size * 1.25,
    }
}

/// Ranges of the particles that fill text masks.
fn text_ranges(viewport: Viewport) -> ParticleRanges {
    let s = speed_scale(viewport);
    ParticleRanges {
        x: ParamRange::new(0.0, viewport.w()),
        y: ParamRange::new(0.0, viewport.h()),
        radius: ParamRange::new(1.0, (viewport.h() / 36.0).max(1.5)),
        vx: ParamRange::new(0.001 * s, 0.9 * s),
        vy: ParamRange::fixed(0.0),
        fade_speed: ParamRange::new(0.02, 1.0),
        fade_out_speed: ParamRange::new(1.0, 4.0),
        lifespan: None,
        respawn: Respawn::TrailingEdge,
    }
}

/// Ranges of the particles that fill cloud masks.
fn cloud_ranges(viewport: Viewport) -> ParticleRanges {
    let s = speed_scale(viewport);
    ParticleRanges {
        x: ParamRange::new(0.0, viewport.w()),
        y: ParamRange::new(0.0, viewport.h() / 2.0),
        radius: ParamRange::new(0.5, (viewport.h() / 20.0).max(1.0)),
        vx: ParamRange::new(0.001 * s, 1.0 * s),
        vy: ParamRange::fixed(0.0),
        fade_speed: ParamRange::new(0.2, 0.9),
        fade_out_speed: ParamRange::new(0.05, 1.0),
        lifespan: None,
        respawn: Respawn::TrailingEdge,
    }
}

/// An ambient cloud that drifts right and re-enters from the left.
fn ambient_cloud<R: Rng>(viewport: Viewport, rng: &mut R) -> SlotConfig {
    let (w, h) = (viewport.w(), viewport.h());
    let s = speed_scale(viewport);
    let width = rng.random_range(w / 10.0..w / 7.0);
    let height = rng.random_range(h / 10.0..h / 4.0);
    let start = (-w * rng.random_range(0.0..0.5), rng.random_range(0.0..h * 0.15));
    let rule = WrapRule {
        gust: 0.0,
        jitter: 0.0,
        limit: w + width,
        reentry: -width,
        lane: ParamRange::new(0.0, h * 0.3),
    };
    SlotConfig {
        source: MaskSource::Cloud(CloudSpec {
            width,
            height,
            disc_count: CLOUD_DISCS,
            sway_phase: rng.random_range(0.0..TAU),
            sway_amplitude: width * 0.05,
            policy: ShapePolicy::Replay,
        }),
        base: (0.0, 0.0),
        drift: Drift::wrap(start, rng.random_range(0.1..1.2) * s, rule),
        regen: RegenPolicy::EveryKFrames(3),
    }
}

/// Drifting text that jumps back to the left once it leaves the screen,
/// with two ambient clouds above it.
fn open_call<R: Rng>(
    viewport: Viewport,
    options: &PresetOptions,
    rng: &mut R,
) -> Result<SceneConfig> {
    let (w, h) = (viewport.w(), viewport.h());
    let s = speed_scale(viewport);
    let banner = TextBanner::new(&options.text, text_style(viewport))?;
    let limit = w / 2.0 + banner.width_px() / 2.0;
    let text = SlotConfig {
        source: MaskSource::Text(banner),
        base: (w / 2.0, h / 3.0),
        drift: Drift::wrap(
            (0.0, 0.0),
            0.75 * s,
            WrapRule {
                gust: s,
                jitter: 0.05,
                limit,
                reentry: -0.7 * limit,
                lane: ParamRange::new(0.0, h / 5.0),
            },
        ),
        regen: RegenPolicy::OnAnchorWrap,
    };

    let clouds = vec![ambient_cloud(viewport, rng), ambient_cloud(viewport, rng)];

    let text_population = population(viewport, 0.12, 200, 15_000);
    let cloud_population = population(viewport, 0.03, 100, 3_000);
    Ok(SceneConfig {
        viewport,
        layers: vec![
            LayerConfig {
                name: "text".to_string(),
                slots: vec![text],
                ranges: text_ranges(viewport),
                initial_population: text_population,
                post_reset_population: text_population,
                margin: 0.0,
                blend: Blend {
                    max_alpha: TEXT_MAX_ALPHA,
                    color: options.color,
                },
            },
            LayerConfig {
                name: "ambient".to_string(),
                slots: clouds,
                ranges: cloud_ranges(viewport),
                initial_population: cloud_population,
                post_reset_population: cloud_population,
                margin: 0.0,
                blend: Blend {
                    max_alpha: CLOUD_MAX_ALPHA,
                    color: options.color,
                },
            },
        ],
        cycle: None,
    })
}

/// Text that bounces inside a box; every wall hit reverses the wind for
/// the whole population.
fn bounce(viewport: Viewport, options: &PresetOptions) -> Result<SceneConfig> {
    let (w, h) = (viewport.w(), viewport.h());
    let s = speed_scale(viewport);
    let bounds = DriftBounds::from_viewport(viewport, 0.25, 0.2, w / 10.0);
    let text = SlotConfig {
        source: MaskSource::Text(TextBanner::new(&options.text, text_style(viewport))?),
        base: (w / 2.0, h / 2.0 - text_style(viewport).line_spacing / 2.0),
        drift: Drift::bounce((0.6 * s, 0.35 * s), bounds),
        regen: RegenPolicy::EveryFrame,
    };
    let mut ranges = text_ranges(viewport);
    ranges.vx = ParamRange::new(0.05 * s, 0.5 * s);
    ranges.vy = ParamRange::new(0.02 * s, 0.3 * s);
    ranges.fade_speed = ParamRange::new(2.0, 8.0);
    ranges.respawn = Respawn::Scatter;

    let n = population(viewport, 0.12, 200, 15_000);
    Ok(SceneConfig {
        viewport,
        layers: vec![LayerConfig {
            name: "bounce".to_string(),
            slots: vec![text],
            ranges,
            initial_population: n,
            post_reset_population: n,
            margin: w / 40.0,
            blend: Blend {
                max_alpha: TEXT_MAX_ALPHA,
                color: options.color,
            },
        }],
        cycle: None,
    })
}

/// A single swaying cloud whose population is faded out and rebuilt, with
/// a smaller population after every reset.
fn cycle<R: Rng>(viewport: Viewport, options: &PresetOptions, rng: &mut R) -> SceneConfig {
    let (w, h) = (viewport.w(), viewport.h());
    let s = speed_scale(viewport);
    let width = w * 0.3;
    let cloud = SlotConfig {
        source: MaskSource::Cloud(CloudSpec {
            width,
            height: h * 0.35,
            disc_count: CLOUD_DISCS,
            sway_phase: rng.random_range(0.0..TAU),
            sway_amplitude: width * 0.08,
            policy: ShapePolicy::Replay,
        }),
        base: (w / 2.0, h / 2.0),
        drift: Drift::fixed(),
        regen: RegenPolicy::EveryKFrames(2),
    };
    let mut ranges = cloud_ranges(viewport);
    ranges.y = ParamRange::new(0.0, h);
    ranges.vx = ParamRange::new(-0.3 * s, 0.3 * s);
    ranges.vy = ParamRange::new(-0.1 * s, 0.1 * s);
    ranges.fade_speed = ParamRange::new(1.0, 4.0);
    ranges.fade_out_speed = ParamRange::new(0.5, 2.0);
    ranges.lifespan = Some(Lifespan::new(240, 1));
    ranges.respawn = Respawn::Scatter;

    SceneConfig {
        viewport,
        layers: vec![LayerConfig {
            name: "cycle".to_string(),
            slots: vec![cloud],
            ranges,
            initial_population: population(viewport, 0.08, 150, 8_000),
            post_reset_population: population(viewport, 0.05, 100, 5_000),
            margin: w / 40.0,
            blend: Blend {
                max_alpha: 0.6,
                color: options.color,
            },
        }],
        cycle: Some(CycleConfig {
            period: 1800,
            fade_window: 120,
            fade_rate: 6.0,
        }),
    }
}

/// A cloud that crosses the screen slowly and is re-randomized every
/// half second, so it billows as it goes.
fn billow<R: Rng>(viewport: Viewport, options: &PresetOptions, rng: &mut R) -> SceneConfig {
    let (w, h) = (viewport.w(), viewport.h());
    let s = speed_scale(viewport);
    let width = w * 0.22;
    let rule = WrapRule {
        gust: 0.0,
        jitter: 0.02,
        limit: w + width,
        reentry: -width,
        lane: ParamRange::new(h * 0.3, h * 0.6),
    };
    let cloud = SlotConfig {
        source: MaskSource::Cloud(CloudSpec {
            width,
            height: h * 0.3,
            disc_count: CLOUD_DISCS,
            sway_phase: rng.random_range(0.0..TAU),
            sway_amplitude: 0.0,
            policy: ShapePolicy::Rerandomize,
        }),
        base: (0.0, 0.0),
        drift: Drift::wrap((w * 0.3, h * 0.45), 0.25 * s, rule),
        regen: RegenPolicy::EveryKFrames(30),
    };
    let mut ranges = cloud_ranges(viewport);
    ranges.y = ParamRange::new(0.0, h);
    ranges.fade_speed = ParamRange::new(1.0, 3.0);
    ranges.fade_out_speed = ParamRange::new(0.3, 1.5);

    let n = population(viewport, 0.1, 150, 10_000);
    SceneConfig {
        viewport,
        layers: vec![LayerConfig {
            name: "billow".to_string(),
            slots: vec![cloud],
            ranges,
            initial_population: n,
            post_reset_population: n,
            margin: 0.0,
            blend: Blend {
                max_alpha: 0.45,
                color: options.color,
            },
        }],
        cycle: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport::new(160, 90);

    #[test]
    fn test_every_preset_builds_and_runs() {
        for preset in Preset::ALL {
            let mut scene = build_scene(preset, VIEWPORT, &PresetOptions::default(), 5).unwrap();
            for _ in 0..120 {
                scene.step();
                for layer in scene.layers() {
                    assert!(layer.pool().iter().all(|p| (0.0..=255.0).contains(&p.alpha)));
                }
            }
            assert_eq!(scene.frame(), 120);
        }
    }

    #[test]
    fn test_open_call_draws_particles_on_text() {
        let mut scene =
            build_scene(Preset::OpenCall, VIEWPORT, &PresetOptions::default(), 8).unwrap();
        let mut drawn = 0;
        for _ in 0..60 {
            scene.step();
            drawn += scene.render().len();
        }
        assert!(drawn > 0);
        assert_eq!(scene.layers().len(), 2);
        assert_eq!(scene.layers()[1].slots().len(), 2);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let opts = PresetOptions::default();
        let mut a = build_scene(Preset::Cycle, VIEWPORT, &opts, 77).unwrap();
        let mut b = build_scene(Preset::Cycle, VIEWPORT, &opts, 77).unwrap();
        for _ in 0..50 {
            a.step();
            b.step();
            assert_eq!(a.render(), b.render());
        }
    }

    #[test]
    fn test_cycle_population_asymmetry() {
        let opts = PresetOptions {
            population: Some(300),
            post_reset_population: Some(120),
            cycle_period: Some(40),
            ..Default::default()
        };
        let mut scene = build_scene(Preset::Cycle, VIEWPORT, &opts, 3).unwrap();
        assert_eq!(scene.layers()[0].pool().len(), 300);
        for _ in 0..40 {
            scene.step();
        }
        let pool = scene.layers()[0].pool();
        assert_eq!(pool.len(), 120);
        assert!(pool.iter().all(|p| p.alpha == 0.0));
    }

    #[test]
    fn test_population_override_targets_first_layer() {
        let mut rng = StdRng::seed_from_u64(4);
        let defaults =
            scene_config(Preset::OpenCall, VIEWPORT, &PresetOptions::default(), &mut rng).unwrap();
        let opts = PresetOptions {
            population: Some(500),
            post_reset_population: Some(250),
            ..Default::default()
        };
        let config = scene_config(Preset::OpenCall, VIEWPORT, &opts, &mut rng).unwrap();
        assert_eq!(config.layers[0].initial_population, 500);
        assert_eq!(config.layers[0].post_reset_population, 250);
        assert_eq!(
            config.layers[1].initial_population,
            defaults.layers[1].initial_population
        );
        assert_eq!(
            config.layers[1].post_reset_population,
            defaults.layers[1].post_reset_population
        );
    }

    #[test]
    fn test_cycle_period_override_adds_cycle() {
        let opts = PresetOptions {
            cycle_period: Some(30),
            ..Default::default()
        };
        let config = scene_config(
            Preset::Bounce,
            VIEWPORT,
            &opts,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        let cycle = config.cycle.unwrap();
        assert_eq!(cycle.period, 30);
        assert_eq!(cycle.fade_window, 2);
    }

    #[test]
    fn test_missing_glyph_is_fatal() {
        let opts = PresetOptions {
            text: vec!["OPEN CALL?".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            build_scene(Preset::OpenCall, VIEWPORT, &opts, 1),
            Err(EngineError::Font(_))
        ));
    }

    #[test]
    fn test_empty_viewport_rejected() {
        let opts = PresetOptions::default();
        assert!(build_scene(Preset::Billow, Viewport::new(0, 40), &opts, 1).is_err());
    }
}
