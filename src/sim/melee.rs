//! Melee AI State Machine
//!
//! Per-attacker state for mob members: chase the attackee, wind up an attack
//! once close, strike or abort, then flee. Evaluated once per physics tick,
//! only while the attacker is neither stunned nor out of combat.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::core::steer::{approach, disperse};
use crate::core::vec2::Vec2;
use crate::sim::entity::Body;
use crate::sim::hooks::Collaborators;
use crate::sim::world::EntityId;

/// Distance at which a chasing attacker commits to a windup.
pub const ATTACK_RANGE: f32 = 0.5;
/// Distance within which a finished windup lands its strike.
pub const STRIKE_RANGE: f32 = 1.0;
/// Windup duration in seconds.
pub const WINDUP_SECONDS: f32 = 1.0 / 3.0;
/// Flee duration is this distance divided by the attacker's speed.
pub const FLEE_DISTANCE: f32 = 4.5;

/// The way a mob member is attacking right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeleeState {
    /// Closing in on the attackee.
    Chasing,
    /// Backing off after a strike or an obstruction.
    Fleeing,
    /// Committed windup: pull back, then lunge.
    Preparing,
}

/// Discrete facing signals derived from the movement vector, consumed by an
/// external animation collaborator. The inequalities are part of the state
/// machine's observable contract; note that the default (stunned or
/// non-combat) facing has left and right simultaneously true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facing {
    /// Whether the entity is moving at all.
    pub walking: bool,
    /// Facing left.
    pub left: bool,
    /// Facing up.
    pub up: bool,
    /// Facing right.
    pub right: bool,
    /// Facing down.
    pub down: bool,
}

impl Facing {
    /// The default facing used while stunned or out of combat.
    pub fn idle() -> Self {
        Self {
            walking: false,
            left: true,
            up: false,
            right: true,
            down: false,
        }
    }

    /// Derive facing from a movement vector.
    pub fn from_movement(m: Vec2) -> Self {
        Self {
            walking: m.x != 0.0 || m.y != 0.0,
            left: m.x <= m.y && m.y <= -m.x,
            up: m.x.abs() < m.y,
            right: -m.x <= m.y && m.y <= m.x,
            down: m.x > m.y && -m.x > m.y,
        }
    }
}

/// What one melee tick asks the world to do on the attacker's behalf.
#[derive(Default)]
pub struct MeleeOutcome {
    /// Facing signal to forward to the animation sink, if any.
    pub facing: Option<Facing>,
    /// Strike the attackee for the attacker's damage this tick.
    pub strike: bool,
    /// Entered Preparing: suppress collisions with all other attackers.
    pub suppress_collisions: bool,
    /// Windup elapsed: restore collisions with all other attackers.
    pub restore_collisions: bool,
    /// State transition that happened this tick.
    pub transition: Option<(MeleeState, MeleeState)>,
}

/// Per-attacker melee AI state.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MeleeBrain {
    state: MeleeState,
    /// Local time when the current state started.
    state_started_at: f32,
    /// Windup anchor position; valid only while Preparing.
    prepare_anchor: Vec2,
    /// Windup pull-back direction; valid only while Preparing.
    prepare_direction: Vec2,
}

impl MeleeBrain {
    /// New brain in the initial Chasing state.
    pub fn new(now_local: f32) -> Self {
        Self {
            state: MeleeState::Chasing,
            state_started_at: now_local,
            prepare_anchor: Vec2::ZERO,
            prepare_direction: Vec2::ZERO,
        }
    }

    /// Current combat state.
    pub fn state(&self) -> MeleeState {
        self.state
    }

    fn transition(&mut self, to: MeleeState, outcome: &mut MeleeOutcome) {
        debug!(from = ?self.state, to = ?to, "melee transition");
        outcome.transition = Some((self.state, to));
        self.state = to;
    }

    /// Evaluate one physics tick. `now` is entity-local time. The caller is
    /// responsible for gating on stun/combat and for applying the requested
    /// strike and collision-pair changes.
    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        body: &mut Body,
        attackee: EntityId,
        attackee_pos: Vec2,
        dt: f32,
        now: f32,
        rng: &mut DeterministicRng,
        collab: &mut dyn Collaborators,
    ) -> MeleeOutcome {
        let mut outcome = MeleeOutcome::default();
        let origin = body.position;

        let mut movement = match self.state {
            MeleeState::Chasing => approach(body.position, attackee_pos, body.speed) * dt,
            MeleeState::Fleeing => disperse(body.position, attackee_pos, body.speed, rng) * dt,
            MeleeState::Preparing => {
                // Scripted parabolic windup path: pull back, then lunge.
                let elapsed = now - self.state_started_at;
                self.prepare_anchor
                    - self.prepare_direction
                        * (body.speed / 3.0)
                        * (3.0 * elapsed * elapsed - elapsed)
                    - body.position
            }
        };

        // One NaN component means they all are: degenerate angle upstream.
        if movement.has_nan() {
            movement = Vec2::ZERO;
        }

        body.position += movement;

        // Transition geometry reads the position from the start of the tick;
        // this tick's movement is only visible to the next tick's checks.
        let distance = origin.distance(attackee_pos);

        if self.state == MeleeState::Chasing && distance <= ATTACK_RANGE {
            self.state_started_at = now;
            self.prepare_direction = disperse(origin, attackee_pos, body.speed, rng);
            self.prepare_anchor = origin;
            self.transition(MeleeState::Preparing, &mut outcome);
            outcome.suppress_collisions = true;
        } else if self.state == MeleeState::Fleeing {
            let probe = collab.probe(body.position, movement, movement.length());
            let obstructed = probe
                .map(|hit| hit.entity != Some(attackee) && !hit.terrain)
                .unwrap_or(false);

            if now - self.state_started_at >= FLEE_DISTANCE / body.speed || obstructed {
                self.transition(MeleeState::Chasing, &mut outcome);
            }
        } else if self.state == MeleeState::Preparing
            && now - self.state_started_at >= WINDUP_SECONDS
        {
            outcome.restore_collisions = true;
            if distance <= STRIKE_RANGE {
                self.state_started_at = now;
                body.position = attackee_pos;
                self.transition(MeleeState::Fleeing, &mut outcome);
                outcome.strike = true;
            } else {
                self.transition(MeleeState::Chasing, &mut outcome);
            }
        }

        outcome.facing = Some(Facing::from_movement(movement));
        outcome
    }
}

// =============================================================================
// TESTS
// =============================================================================
