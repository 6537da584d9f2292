//! Deterministic primitives: vector math, steering helpers, seeded RNG.

pub mod rng;
pub mod steer;
pub mod vec2;
