//! # Skirmish
//!
//! Headless, deterministic 2D combat simulation: a player, melee mobs that
//! chase and wind up attacks, tracking projectiles, and ground-spike hazards,
//! all advanced by an explicit fixed-step tick.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SKIRMISH                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── vec2.rs      - 2D float vector                          │
//! │  ├── rng.rs       - Deterministic Xorshift128+ PRNG          │
//! │  └── steer.rs     - Approach/disperse steering               │
//! │                                                              │
//! │  sim/             - Simulation (deterministic)               │
//! │  ├── scheduler.rs - Per-entity update callbacks              │
//! │  ├── entity.rs    - Position, health, combat lifecycle       │
//! │  ├── attacker.rs  - Combat capability, hit reaction          │
//! │  ├── melee.rs     - Chase/prepare/flee state machine         │
//! │  ├── projectile.rs- Bend-limited tracking projectile         │
//! │  ├── spike.rs     - Telegraphed ground hazard                │
//! │  ├── world.rs     - Actor arena, registry, tick loop         │
//! │  ├── events.rs    - Observable event stream                  │
//! │  └── hooks.rs     - Host collaborator seam                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same seed and the same sequence of calls, two worlds produce
//! identical event streams and identical actor state:
//! - No system time; the clock only moves in [`World::step`]
//! - No HashMap (BTreeMap/BTreeSet for sorted iteration)
//! - All randomness from the seeded Xorshift128+ RNG
//! - Host services behind [`Collaborators`] so side effects stay outside
//!
//! Entity-local time excludes spans spent stunned, so windups, fuses, and
//! telegraphs are unaffected by hit reactions.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod sim;

// Re-export commonly used types
pub use crate::core::rng::DeterministicRng;
pub use crate::core::steer::{approach, disperse};
pub use crate::core::vec2::Vec2;
pub use crate::sim::entity::{Body, Entity, HealthBar};
pub use crate::sim::events::{SimEvent, SimEventData};
pub use crate::sim::hooks::{Collaborators, NullCollaborators, ProbeHit};
pub use crate::sim::melee::{Facing, MeleeState};
pub use crate::sim::world::{ActorKind, EntityId, SimError, World};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Seconds per simulation tick
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE as f32;
