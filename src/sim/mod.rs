//! The simulation layer: entities, combat capabilities, AI brains, and the
//! world that ticks them.

pub mod attacker;
pub mod entity;
pub mod events;
pub mod hooks;
pub mod melee;
pub mod projectile;
pub mod scheduler;
pub mod spike;
pub mod world;
