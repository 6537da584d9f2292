//! Simulation Event Stream
//!
//! Everything observable that happens inside the world is recorded as an
//! event. The world buffers events during a step and hands the batch to the
//! caller from [`World::step`](crate::sim::world::World::step); the embedding
//! layer (renderer, replay recorder, network relay) consumes them from there.

use serde::{Deserialize, Serialize};

use crate::sim::melee::MeleeState;
use crate::sim::world::{ActorKind, EntityId};

/// One observable simulation event, stamped with the tick it occurred on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    /// Tick counter at the time of the event.
    pub tick: u64,
    /// What happened.
    pub data: SimEventData,
}

/// The payload of a simulation event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEventData {
    /// An actor entered the world.
    Spawned {
        /// The new actor.
        id: EntityId,
        /// What kind of actor it is.
        kind: ActorKind,
    },
    /// An actor left the world.
    Despawned {
        /// The removed actor.
        id: EntityId,
    },
    /// An actor's health changed.
    HealthChanged {
        /// The affected actor.
        id: EntityId,
        /// Signed change, new minus old.
        delta: f32,
        /// Health after the change.
        health: f32,
    },
    /// An actor's health reached zero or below.
    Died {
        /// The dead actor.
        id: EntityId,
    },
    /// An actor entered or left combat.
    CombatChanged {
        /// The affected actor.
        id: EntityId,
        /// New combat flag.
        in_combat: bool,
    },
    /// A melee attacker changed AI state.
    MeleeTransition {
        /// The attacker.
        id: EntityId,
        /// Previous state.
        from: MeleeState,
        /// New state.
        to: MeleeState,
    },
    /// An attacker landed a hit.
    Struck {
        /// Who dealt the damage.
        attacker: EntityId,
        /// Who took it.
        target: EntityId,
        /// Damage dealt.
        damage: f32,
    },
    /// A projectile detonated or expired and was removed.
    ProjectileDeleted {
        /// The removed projectile.
        id: EntityId,
    },
}

// =============================================================================
// TESTS
// =============================================================================
