//! Collaborator Seam
//!
//! The world is headless: physics queries, visual effects, collision-layer
//! tweaks, and animation signals all belong to whatever hosts it. This trait
//! is the single seam those concerns pass through. The host injects an
//! implementation per [`World::step`](crate::sim::world::World::step) call;
//! tests and the demo binary use [`NullCollaborators`].

use crate::core::vec2::Vec2;
use crate::sim::melee::Facing;
use crate::sim::world::EntityId;

/// Result of a physics probe along a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProbeHit {
    /// The entity hit, if the obstruction is an entity.
    pub entity: Option<EntityId>,
    /// True when the obstruction is static terrain.
    pub terrain: bool,
}

/// Host-side services the simulation calls out to.
pub trait Collaborators {
    /// Cast a ray from `from` along `direction` up to `max_distance` and
    /// report the first obstruction, if any.
    fn probe(&mut self, from: Vec2, direction: Vec2, max_distance: f32) -> Option<ProbeHit>;

    /// Play the hit visual effect at a world position.
    fn play_hit_effect(&mut self, at: Vec2);

    /// Suppress or restore collisions between a pair of entities.
    fn set_collision_ignored(&mut self, a: EntityId, b: EntityId, ignored: bool);

    /// Forward a facing signal for an entity to the animation layer.
    fn set_facing(&mut self, id: EntityId, facing: Facing);
}

/// A collaborator that ignores everything. Probes hit nothing.
pub struct NullCollaborators;

impl Collaborators for NullCollaborators {
    fn probe(&mut self, _from: Vec2, _direction: Vec2, _max_distance: f32) -> Option<ProbeHit> {
        None
    }

    fn play_hit_effect(&mut self, _at: Vec2) {}

    fn set_collision_ignored(&mut self, _a: EntityId, _b: EntityId, _ignored: bool) {}

    fn set_facing(&mut self, _id: EntityId, _facing: Facing) {}
}
