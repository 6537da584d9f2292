//! Ground Spike Hazard
//!
//! A stationary hazard that telegraphs for a configured warning time, then
//! erupts: a spike rises out of the ground while an elliptical kill zone grows
//! with it. The zone kills the attackee on contact. Once fully risen the spike
//! lingers for one second at full size, then despawns.
//!
//! All timing is entity-local, so a stunned world clock elsewhere never
//! shortens the telegraph.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::vec2::Vec2;

/// Vertical travel of the rising spike, in world units.
pub const RISE_HEIGHT: f32 = 3.625;
/// Kill-zone center offset above the spike at full eruption.
pub const ZONE_OFFSET: f32 = 0.8125;
/// Kill-zone half extents at full eruption.
pub const ZONE_HALF_EXTENTS: Vec2 = Vec2::new(1.875, 0.6875);
/// How long the fully-risen spike stays lethal before despawning.
pub const LINGER_SECONDS: f32 = 1.0;
/// Spikes spawn slightly below their target's position.
pub const SPAWN_OFFSET: Vec2 = Vec2::new(0.0, -0.25);

/// Lifecycle phase of a ground spike.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum SpikePhase {
    /// Telegraphing; harmless.
    Warning,
    /// Rising out of the ground; the kill zone grows with the spike.
    Erupting {
        /// Local time the eruption started.
        started_at: f32,
    },
    /// Fully risen at full kill-zone size.
    Lingering {
        /// Local time at which the spike despawns.
        until: f32,
    },
}

/// What one spike tick asks the world to do.
#[derive(Default)]
pub struct SpikeOutcome {
    /// The attackee is inside the kill zone this tick.
    pub kill_attackee: bool,
    /// The spike's lifecycle is over.
    pub despawn: bool,
}

/// Per-spike hazard state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SpikeBrain {
    warning_time: f32,
    phase: SpikePhase,
}

impl SpikeBrain {
    /// New spike telegraphing for `warning_time` seconds of local time.
    pub fn new(warning_time: f32) -> Self {
        Self {
            warning_time,
            phase: SpikePhase::Warning,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SpikePhase {
        self.phase
    }

    /// Eruption progress in [0, 1]; 0 while warning, 1 once fully risen.
    fn progress(&self, speed: f32, local_now: f32) -> f32 {
        match self.phase {
            SpikePhase::Warning => 0.0,
            SpikePhase::Erupting { started_at } => {
                ((local_now - started_at) * speed / RISE_HEIGHT).clamp(0.0, 1.0)
            }
            SpikePhase::Lingering { .. } => 1.0,
        }
    }

    /// True when `point` lies inside the current kill zone.
    pub fn zone_contains(&self, position: Vec2, speed: f32, local_now: f32, point: Vec2) -> bool {
        let t = self.progress(speed, local_now);
        if t <= 0.0 {
            return false;
        }
        let center = position + Vec2::UP * (ZONE_OFFSET * t);
        let rel = point - center;
        let rx = ZONE_HALF_EXTENTS.x * t;
        let ry = ZONE_HALF_EXTENTS.y * t;
        (rel.x / rx) * (rel.x / rx) + (rel.y / ry) * (rel.y / ry) <= 1.0
    }

    /// Evaluate one tick. `local_now` is entity-local time; `speed` is the
    /// body's speed, which sets the rise rate.
    pub fn tick(&mut self, position: Vec2, speed: f32, local_now: f32, attackee_pos: Vec2) -> SpikeOutcome {
        let mut outcome = SpikeOutcome::default();

        match self.phase {
            SpikePhase::Warning => {
                if local_now > self.warning_time {
                    debug!("spike erupting");
                    self.phase = SpikePhase::Erupting {
                        started_at: local_now,
                    };
                }
            }
            SpikePhase::Erupting { started_at } => {
                if (local_now - started_at) * speed / RISE_HEIGHT >= 1.0 {
                    self.phase = SpikePhase::Lingering {
                        until: local_now + LINGER_SECONDS,
                    };
                }
            }
            SpikePhase::Lingering { until } => {
                if local_now >= until {
                    outcome.despawn = true;
                    return outcome;
                }
            }
        }

        outcome.kill_attackee = self.zone_contains(position, speed, local_now, attackee_pos);
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================
