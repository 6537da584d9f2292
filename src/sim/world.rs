//! World State & Tick Loop
//!
//! Owns every actor, the attacker registry, the deterministic RNG, and the
//! simulation clock. Each [`step`](World::step) runs two phases:
//!
//! 1. Frame phase: per-entity scheduled callbacks (tweens) and in-flight
//!    hit reactions.
//! 2. Physics phase: AI brains (melee state machines, projectile steering,
//!    spike lifecycles), evaluated against a snapshot of actor ids, with
//!    damage and despawns collected first and applied after the sweep so
//!    iteration never observes a half-updated world.
//!
//! Everything the host needs to react to comes back as the step's event
//! batch. Host-side services (physics probes, effects, collision layers,
//! animation) are injected per step through [`Collaborators`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::sim::attacker::{Combatant, HitReaction, HIT_EFFECT_OFFSET};
use crate::sim::entity::{Body, Entity};
use crate::sim::events::{SimEvent, SimEventData};
use crate::sim::hooks::Collaborators;
use crate::sim::melee::{Facing, MeleeBrain, MeleeState};
use crate::sim::projectile::{ProjectileBrain, PROXIMITY_RANGE};
use crate::sim::spike::{SpikeBrain, SPAWN_OFFSET};

/// Rise speed of ground spikes, in units per second.
const SPIKE_SPEED: f32 = 10.0;
/// Ground spikes are effectively indestructible.
const SPIKE_HEALTH: f32 = 100.0;

/// Stable handle to an actor in the world. Ids are never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Construct an id from its raw value. Useful for replay tooling; ids
    /// handed out by [`World`] spawns are the normal way to get one.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw id value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What kind of actor an id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKind {
    /// A plain entity with no AI: the player, NPCs, props.
    Bystander,
    /// A melee mob member chasing its attackee.
    Melee,
    /// A tracking projectile.
    Projectile,
    /// A ground spike hazard.
    Spike,
}

/// AI attached to an actor.
enum Brain {
    Melee(MeleeBrain),
    Projectile(ProjectileBrain),
    Spike(SpikeBrain),
}

/// One actor: entity state plus optional combat capability and AI.
struct Actor {
    kind: ActorKind,
    entity: Entity,
    combatant: Option<Combatant>,
    brain: Option<Brain>,
    on_deletion: Option<Box<dyn FnOnce()>>,
}

/// Errors from world operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// The referenced actor does not exist (never spawned or despawned).
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
}

/// Deferred physics-phase effects, applied after the AI sweep.
enum Command {
    Strike {
        attacker: EntityId,
        target: EntityId,
        damage: f32,
    },
    Kill {
        target: EntityId,
    },
    Despawn {
        id: EntityId,
    },
}

/// The whole simulation: actors, registry, clock, RNG, event buffer.
pub struct World {
    tick: u64,
    now: f32,
    next_id: u32,
    actors: BTreeMap<EntityId, Actor>,
    /// Ids of every live combatant, in spawn order. Area strikes and
    /// collision suppression iterate this, never the full actor map.
    registry: BTreeSet<EntityId>,
    /// Collision pairs currently suppressed, stored normalized (low, high).
    suppressed: BTreeSet<(EntityId, EntityId)>,
    pending_events: Vec<SimEvent>,
    rng: DeterministicRng,
}

fn pair(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl World {
    /// Create an empty world with a seeded RNG. Two worlds created with the
    /// same seed and fed the same calls produce identical event streams.
    pub fn new(seed: u64) -> Self {
        Self {
            tick: 0,
            now: 0.0,
            next_id: 0,
            actors: BTreeMap::new(),
            registry: BTreeSet::new(),
            suppressed: BTreeSet::new(),
            pending_events: Vec::new(),
            rng: DeterministicRng::new(seed),
        }
    }

    /// Current tick counter.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Current simulation time in seconds.
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// True when the world holds no actors.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// True when the actor exists.
    pub fn contains(&self, id: EntityId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Snapshot of the attacker registry, in spawn order.
    pub fn attackers(&self) -> Vec<EntityId> {
        self.registry.iter().copied().collect()
    }

    /// An actor's body state.
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.actors.get(&id).map(|a| &a.entity.body)
    }

    /// Mutable access to an actor's body state.
    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut Body> {
        self.actors.get_mut(&id).map(|a| &mut a.entity.body)
    }

    /// Mutable access to an actor's entity, for subscriptions and tweens.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.actors.get_mut(&id).map(|a| &mut a.entity)
    }

    /// An actor's kind.
    pub fn kind(&self, id: EntityId) -> Option<ActorKind> {
        self.actors.get(&id).map(|a| a.kind)
    }

    /// A melee actor's current AI state.
    pub fn melee_state(&self, id: EntityId) -> Option<MeleeState> {
        match self.actors.get(&id)?.brain.as_ref()? {
            Brain::Melee(brain) => Some(brain.state()),
            _ => None,
        }
    }

    fn push_event(&mut self, data: SimEventData) {
        self.pending_events.push(SimEvent {
            tick: self.tick,
            data,
        });
    }

    fn allocate(&mut self, kind: ActorKind, actor: Actor) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        debug!(%id, ?kind, "spawn");
        self.actors.insert(id, actor);
        self.push_event(SimEventData::Spawned { id, kind });
        id
    }

    fn attackee_position(&self, attackee: EntityId) -> Result<Vec2, SimError> {
        self.body(attackee)
            .map(|b| b.position)
            .ok_or(SimError::UnknownEntity(attackee))
    }

    /// Spawn a plain entity with no AI (the player, props).
    pub fn spawn_bystander(&mut self, position: Vec2, max_health: f32, speed: f32) -> EntityId {
        let entity = Entity::new(position, max_health, speed, self.now);
        self.allocate(
            ActorKind::Bystander,
            Actor {
                kind: ActorKind::Bystander,
                entity,
                combatant: None,
                brain: None,
                on_deletion: None,
            },
        )
    }

    /// Spawn a melee mob member attacking `attackee`.
    pub fn spawn_melee(
        &mut self,
        position: Vec2,
        max_health: f32,
        speed: f32,
        attackee: EntityId,
    ) -> Result<EntityId, SimError> {
        if !self.contains(attackee) {
            return Err(SimError::UnknownEntity(attackee));
        }
        let entity = Entity::new(position, max_health, speed, self.now);
        let id = self.allocate(
            ActorKind::Melee,
            Actor {
                kind: ActorKind::Melee,
                entity,
                combatant: Some(Combatant::new(attackee)),
                brain: Some(Brain::Melee(MeleeBrain::new(0.0))),
                on_deletion: None,
            },
        );
        self.registry.insert(id);
        Ok(id)
    }

    /// Spawn a tracking projectile at `from`, aimed at `attackee`.
    pub fn spawn_projectile(
        &mut self,
        from: Vec2,
        attackee: EntityId,
        speed: f32,
        bend: f32,
        lifetime: f32,
        damage: f32,
    ) -> Result<EntityId, SimError> {
        let target_pos = self.attackee_position(attackee)?;
        let mut entity = Entity::new(from, 1.0, speed, self.now);
        entity.body.damage = damage;
        entity.body.display_bar = false;
        let id = self.allocate(
            ActorKind::Projectile,
            Actor {
                kind: ActorKind::Projectile,
                entity,
                combatant: Some(Combatant::new(attackee)),
                brain: Some(Brain::Projectile(ProjectileBrain::new(
                    from, target_pos, bend, lifetime,
                ))),
                on_deletion: None,
            },
        );
        self.registry.insert(id);
        Ok(id)
    }

    /// Spawn a ground spike under `attackee`, telegraphing for `warning_time`
    /// seconds before erupting.
    pub fn spawn_spike(
        &mut self,
        attackee: EntityId,
        warning_time: f32,
    ) -> Result<EntityId, SimError> {
        let target_pos = self.attackee_position(attackee)?;
        let mut entity = Entity::new(target_pos + SPAWN_OFFSET, SPIKE_HEALTH, SPIKE_SPEED, self.now);
        entity.body.display_bar = false;
        let id = self.allocate(
            ActorKind::Spike,
            Actor {
                kind: ActorKind::Spike,
                entity,
                combatant: Some(Combatant::new(attackee)),
                brain: Some(Brain::Spike(SpikeBrain::new(warning_time))),
                on_deletion: None,
            },
        );
        self.registry.insert(id);
        Ok(id)
    }

    /// Register a callback fired once when the actor is despawned.
    pub fn set_on_deletion(
        &mut self,
        id: EntityId,
        callback: Box<dyn FnOnce()>,
    ) -> Result<(), SimError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SimError::UnknownEntity(id))?;
        actor.on_deletion = Some(callback);
        Ok(())
    }

    /// Put an actor in or out of combat.
    pub fn set_combat(&mut self, id: EntityId, in_combat: bool) -> Result<(), SimError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SimError::UnknownEntity(id))?;
        if actor.entity.body.in_combat() == in_combat {
            return Ok(());
        }
        actor.entity.set_combat(in_combat);
        self.push_event(SimEventData::CombatChanged { id, in_combat });
        Ok(())
    }

    /// Apply damage (or healing, with a negative amount) to an actor.
    ///
    /// Losing health while in combat starts the hit reaction, which stuns the
    /// target through its jitter sequence. Health at or below zero kills;
    /// dead non-bystanders despawn immediately. Returns the signed health
    /// delta actually applied.
    pub fn apply_damage(
        &mut self,
        target: EntityId,
        amount: f32,
        collab: &mut dyn Collaborators,
    ) -> Result<f32, SimError> {
        if !self.contains(target) {
            return Err(SimError::UnknownEntity(target));
        }
        Ok(self.damage_existing(target, amount, collab))
    }

    fn damage_existing(
        &mut self,
        target: EntityId,
        amount: f32,
        collab: &mut dyn Collaborators,
    ) -> f32 {
        let now = self.now;
        let Some(actor) = self.actors.get_mut(&target) else {
            return 0.0;
        };

        let old_health = actor.entity.body.health();
        let delta = actor.entity.set_health(old_health - amount);
        let health = actor.entity.body.health();
        let kind = actor.kind;
        let in_combat = actor.entity.body.in_combat();
        let position = actor.entity.body.position;

        if delta < 0.0 && in_combat {
            if let Some(combatant) = actor.combatant.as_mut() {
                if combatant.hit_reaction.is_none() {
                    combatant.hit_reaction = Some(HitReaction::begin(&mut actor.entity.body, now));
                    collab.play_hit_effect(position + HIT_EFFECT_OFFSET);
                }
            }
        }

        let dead = actor.entity.body.is_dead();
        self.push_event(SimEventData::HealthChanged {
            id: target,
            delta,
            health,
        });

        // Dead bystanders linger and keep taking hits; Died fires only on
        // the hit that crossed zero.
        if dead && old_health > 0.0 {
            debug!(id = %target, "died");
            self.push_event(SimEventData::Died { id: target });
            if kind != ActorKind::Bystander {
                self.remove_actor(target, collab);
            }
        }
        delta
    }

    /// Remove an actor from the world. Restores any collision pairs it
    /// suppressed and fires its deletion callback.
    pub fn despawn(&mut self, id: EntityId, collab: &mut dyn Collaborators) -> Result<(), SimError> {
        if !self.contains(id) {
            return Err(SimError::UnknownEntity(id));
        }
        self.remove_actor(id, collab);
        Ok(())
    }

    fn remove_actor(&mut self, id: EntityId, collab: &mut dyn Collaborators) {
        let Some(actor) = self.actors.remove(&id) else {
            return;
        };
        self.registry.remove(&id);

        let stale: Vec<_> = self
            .suppressed
            .iter()
            .copied()
            .filter(|&(a, b)| a == id || b == id)
            .collect();
        for (a, b) in stale {
            self.suppressed.remove(&(a, b));
            collab.set_collision_ignored(a, b, false);
        }

        if let Some(done) = actor.on_deletion {
            done();
        }

        debug!(id = %id, kind = ?actor.kind, "despawn");
        if actor.kind == ActorKind::Projectile {
            self.push_event(SimEventData::ProjectileDeleted { id });
        }
        self.push_event(SimEventData::Despawned { id });
    }

    /// Damage every registered attacker within `range` of `center`.
    ///
    /// The registry is snapshotted first, so attackers despawning mid-sweep
    /// (death, chained reactions) never invalidate the iteration.
    pub fn strike_area(
        &mut self,
        center: Vec2,
        range: f32,
        damage: f32,
        collab: &mut dyn Collaborators,
    ) {
        let targets: Vec<EntityId> = self.registry.iter().copied().collect();
        for id in targets {
            let Some(body) = self.body(id) else { continue };
            if body.position.distance(center) <= range {
                self.damage_existing(id, damage, collab);
            }
        }
    }

    /// Advance the simulation one tick and return everything that happened.
    pub fn step(&mut self, dt: f32, collab: &mut dyn Collaborators) -> Vec<SimEvent> {
        self.tick += 1;
        self.now += dt;
        self.run_frames();
        self.run_physics(dt, collab);
        std::mem::take(&mut self.pending_events)
    }

    /// Frame phase: scheduled callbacks and in-flight hit reactions.
    fn run_frames(&mut self) {
        let Self {
            actors, rng, now, ..
        } = self;
        for actor in actors.values_mut() {
            actor.entity.run_frame(*now);
            if let Some(combatant) = actor.combatant.as_mut() {
                if let Some(reaction) = combatant.hit_reaction.as_mut() {
                    if reaction.tick(&mut actor.entity.body, *now, rng) {
                        combatant.hit_reaction = None;
                    }
                }
            }
        }
    }

    /// Physics phase: AI brains over a snapshot of ids, effects deferred.
    fn run_physics(&mut self, dt: f32, collab: &mut dyn Collaborators) {
        let ids: Vec<EntityId> = self.actors.keys().copied().collect();
        let mut commands: Vec<Command> = Vec::new();

        for id in ids {
            let Some((stunned, in_combat, attackee)) = self.actors.get(&id).map(|a| {
                (
                    a.entity.body.stunned,
                    a.entity.body.in_combat(),
                    a.combatant.as_ref().map(|c| c.attackee),
                )
            }) else {
                continue;
            };
            let Some(attackee) = attackee else {
                continue;
            };
            let attackee_pos = self.body(attackee).map(|b| b.position);

            let Self {
                actors,
                registry,
                suppressed,
                pending_events,
                rng,
                tick,
                now,
                ..
            } = self;
            let Some(actor) = actors.get_mut(&id) else {
                continue;
            };
            let local = actor.entity.body.local_time(*now);

            match actor.brain.as_mut() {
                Some(Brain::Melee(brain)) => {
                    if stunned || !in_combat {
                        collab.set_facing(id, Facing::idle());
                        continue;
                    }
                    let Some(target_pos) = attackee_pos else {
                        collab.set_facing(id, Facing::idle());
                        continue;
                    };

                    let outcome = brain.tick(
                        &mut actor.entity.body,
                        attackee,
                        target_pos,
                        dt,
                        local,
                        rng,
                        collab,
                    );
                    let damage = actor.entity.body.damage;

                    if let Some(facing) = outcome.facing {
                        collab.set_facing(id, facing);
                    }
                    if outcome.suppress_collisions {
                        for &other in registry.iter() {
                            if other != id && suppressed.insert(pair(id, other)) {
                                collab.set_collision_ignored(id, other, true);
                            }
                        }
                    }
                    if outcome.restore_collisions {
                        let stale: Vec<_> = suppressed
                            .iter()
                            .copied()
                            .filter(|&(a, b)| a == id || b == id)
                            .collect();
                        for (a, b) in stale {
                            suppressed.remove(&(a, b));
                            collab.set_collision_ignored(a, b, false);
                        }
                    }
                    if let Some((from, to)) = outcome.transition {
                        pending_events.push(SimEvent {
                            tick: *tick,
                            data: SimEventData::MeleeTransition { id, from, to },
                        });
                    }
                    if outcome.strike {
                        commands.push(Command::Strike {
                            attacker: id,
                            target: attackee,
                            damage,
                        });
                    }
                }
                Some(Brain::Projectile(brain)) => {
                    if let Some(target_pos) = attackee_pos {
                        let body = &mut actor.entity.body;
                        body.position = brain.steer(body.position, body.speed, target_pos, dt);
                        if body.position.distance(ProjectileBrain::aim_point(target_pos))
                            <= PROXIMITY_RANGE
                        {
                            commands.push(Command::Strike {
                                attacker: id,
                                target: attackee,
                                damage: body.damage,
                            });
                            commands.push(Command::Despawn { id });
                            continue;
                        }
                    }
                    if brain.expired(local) {
                        commands.push(Command::Despawn { id });
                    }
                }
                Some(Brain::Spike(brain)) => {
                    // A despawned attackee cannot be inside the kill zone
                    let probe = attackee_pos.unwrap_or(Vec2::new(f32::MAX, 0.0));
                    let body = &actor.entity.body;
                    let outcome = brain.tick(body.position, body.speed, local, probe);
                    if outcome.kill_attackee {
                        commands.push(Command::Kill { target: attackee });
                    }
                    if outcome.despawn {
                        commands.push(Command::Despawn { id });
                    }
                }
                None => {}
            }
        }

        for command in commands {
            match command {
                Command::Strike {
                    attacker,
                    target,
                    damage,
                } => {
                    if self.contains(target) {
                        self.push_event(SimEventData::Struck {
                            attacker,
                            target,
                            damage,
                        });
                        self.damage_existing(target, damage, collab);
                    }
                }
                Command::Kill { target } => {
                    let Some(health) = self.body(target).map(|b| b.health()) else {
                        continue;
                    };
                    if health > 0.0 {
                        self.damage_existing(target, health, collab);
                    }
                }
                Command::Despawn { id } => {
                    self.remove_actor(id, collab);
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
