//! Periodic fade-out and reset of particle populations.

use crate::error::{EngineError, Result};

/// What the cycle asks of the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CyclePhase {
    /// Every particle should fade out at the fast rate.
    pub fading: bool,
    /// Masks and pools must be rebuilt on this frame.
    pub reset_now: bool,
}

/// Compute the phase of `frame` within a cycle of `period` frames whose
/// last `fade_window` frames fade the population out.
pub fn tick(frame: u64, period: u64, fade_window: u64) -> CyclePhase {
    if period == 0 {
        return CyclePhase::default();
    }
    let pos = frame % period;
    CyclePhase {
        fading: pos != 0 && pos >= period.saturating_sub(fade_window),
        reset_now: pos == 0,
    }
}

/// Reset schedule shared by every layer of a scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleConfig {
    /// Length of a cycle in frames.
    pub period: u64,
    /// Frames at the end of each cycle spent fading out.
    pub fade_window: u64,
    /// Alpha removed per frame while fading.
    pub fade_rate: f32,
}

impl CycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.period == 0 {
            return Err(EngineError::Config("cycle period must be at least one frame"));
        }
        if self.fade_window >= self.period {
            return Err(EngineError::Config("fade window must be shorter than the cycle"));
        }
        if self.fade_rate <= 0.0 || !self.fade_rate.is_finite() {
            return Err(EngineError::Config("fade rate must be positive"));
        }
        Ok(())
    }

    pub fn tick(&self, frame: u64) -> CyclePhase {
        tick(frame, self.period, self.fade_window)
    }
}
