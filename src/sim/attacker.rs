//! Attacker Capability
//!
//! What turns a plain entity into a combatant: a target reference and the
//! scripted hit-reaction that plays whenever it loses health in combat.
//! Registry membership itself lives on the [`World`](crate::sim::world::World).

use serde::{Deserialize, Serialize};

use crate::core::rng::DeterministicRng;
use crate::core::steer::disperse;
use crate::core::vec2::Vec2;
use crate::sim::entity::Body;
use crate::sim::world::EntityId;

/// Number of jitter steps in the hit reaction.
pub const HIT_JITTER_STEPS: u32 = 6;
/// Seconds between jitter steps.
pub const HIT_STEP_SECONDS: f32 = 0.01;
/// Jitter displacement radius.
pub const HIT_JITTER_RADIUS: f32 = 0.1;
/// Offset above the entity where the hit effect plays.
pub const HIT_EFFECT_OFFSET: Vec2 = Vec2::new(0.0, 0.75);

/// Combat capability attached to attacking entities.
#[derive(Serialize, Deserialize)]
pub struct Combatant {
    /// The entity this attacker is attacking. Shared, not owned: the
    /// attacker does not control the target's lifetime.
    pub attackee: EntityId,
    /// In-flight hit reaction, if any.
    pub hit_reaction: Option<HitReaction>,
}

impl Combatant {
    /// Create a combatant targeting `attackee`.
    pub fn new(attackee: EntityId) -> Self {
        Self {
            attackee,
            hit_reaction: None,
        }
    }
}

/// The scripted stun-and-jitter sequence played when an attacker takes a hit.
///
/// While it runs the entity is stunned (AI and movement suppressed). Six
/// jitter steps of 0.01 s displace the entity around its original position;
/// the sequence then restores the exact original position, clears the stun,
/// and folds its wall-clock duration into the entity's time offset so local
/// timers (windups, lifetimes) did not advance during it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HitReaction {
    origin: Vec2,
    started_at: f32,
    steps_done: u32,
    next_step_at: f32,
}

impl HitReaction {
    /// Start the reaction: stuns the body and records the position to restore.
    pub fn begin(body: &mut Body, now: f32) -> Self {
        body.stunned = true;
        Self {
            origin: body.position,
            started_at: now,
            steps_done: 0,
            next_step_at: now,
        }
    }

    /// Advance the reaction one frame. Returns `true` when finished.
    pub fn tick(&mut self, body: &mut Body, now: f32, rng: &mut DeterministicRng) -> bool {
        while self.steps_done < HIT_JITTER_STEPS && now >= self.next_step_at {
            // Fully degenerate disperse: random-angle jitter around the origin
            body.position = self.origin + disperse(self.origin, self.origin, HIT_JITTER_RADIUS, rng);
            self.steps_done += 1;
            self.next_step_at += HIT_STEP_SECONDS;
        }

        if self.steps_done == HIT_JITTER_STEPS && now >= self.next_step_at {
            body.position = self.origin;
            body.stunned = false;
            body.time_offset -= now - self.started_at;
            return true;
        }
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_reaction_stuns_and_restores() {
        let mut body = Body::new(Vec2::new(2.0, 1.0), 25.0, 5.0, 0.0);
        let mut rng = DeterministicRng::new(11);

        let mut reaction = HitReaction::begin(&mut body, 1.0);
        assert!(body.stunned);

        // Drive frames at 60 Hz until the reaction reports done
        let mut now = 1.0;
        let mut frames = 0;
        loop {
            now += 1.0 / 60.0;
            frames += 1;
            if reaction.tick(&mut body, now, &mut rng) {
                break;
            }
            assert!(frames < 60, "reaction never finished");
            // While running, the body stays near the original position
            assert!(body.position.distance(Vec2::new(2.0, 1.0)) <= HIT_JITTER_RADIUS + 1e-4);
        }

        assert!(!body.stunned);
        assert_eq!(body.position, Vec2::new(2.0, 1.0));
    }

    #[test]
    fn test_hit_reaction_excludes_span_from_local_time() {
        let mut body = Body::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        let mut rng = DeterministicRng::new(5);

        let local_before = body.local_time(1.0);
        let mut reaction = HitReaction::begin(&mut body, 1.0);

        let mut now = 1.0;
        while !reaction.tick(&mut body, now, &mut rng) {
            now += 1.0 / 60.0;
        }

        // Local time right after the stun matches local time right before it
        let local_after = body.local_time(now);
        assert!((local_after - local_before).abs() < 1e-4);
    }

    #[test]
    fn test_hit_reaction_jitters_off_origin() {
        let mut body = Body::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        let mut rng = DeterministicRng::new(3);

        let mut reaction = HitReaction::begin(&mut body, 0.0);
        reaction.tick(&mut body, 0.0, &mut rng);

        // First step displaces by exactly the jitter radius
        assert!((body.position.length() - HIT_JITTER_RADIUS).abs() < 1e-4);
    }
}
