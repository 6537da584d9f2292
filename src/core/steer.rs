//! Steering Displacement Helpers
//!
//! Pure helpers producing the per-step displacement that moves a point
//! toward or away from another point. Both are atan-based: the angle of the
//! separating vector picks the line of motion and a side factor picks the
//! direction along it.

use std::f32::consts::FRAC_PI_2;

use super::rng::DeterministicRng;
use super::vec2::Vec2;

/// Displacement of magnitude `distance` that moves `current` toward `point`.
///
/// Degenerate case (`point == current`, undefined angle) yields the zero
/// vector: zero movement for a tick beats a NaN position.
pub fn approach(current: Vec2, point: Vec2, distance: f32) -> Vec2 {
    let direction = current - point;
    if direction.x == 0.0 && direction.y == 0.0 {
        return Vec2::ZERO;
    }

    let angle = (direction.y / direction.x).atan();
    let side = if direction.x >= 0.0 { -1.0 } else { 1.0 };

    Vec2::new(side * angle.cos() * distance, side * angle.sin() * distance)
}

/// Displacement of magnitude `distance` that moves `current` away from `origin`.
///
/// Vertical alignment (`origin.x == current.x`) leaves the side undetermined;
/// it is resolved by a coin flip. A fully degenerate direction additionally
/// draws a random angle, which is what produces the hit-reaction jitter.
pub fn disperse(current: Vec2, origin: Vec2, distance: f32, rng: &mut DeterministicRng) -> Vec2 {
    let direction = origin - current;

    let mut angle = (direction.y / direction.x).atan();
    if angle.is_nan() {
        angle = rng.next_f32_range(-FRAC_PI_2, FRAC_PI_2);
    }

    let side = if direction.x != 0.0 {
        if direction.x > 0.0 {
            1.0
        } else {
            -1.0
        }
    } else if rng.coin_flip() {
        1.0
    } else {
        -1.0
    };

    -Vec2::new(side * angle.cos() * distance, side * angle.sin() * distance)
}

// =============================================================================
// TESTS
// =============================================================================
