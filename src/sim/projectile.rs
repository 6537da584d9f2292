//! Tracking Projectile
//!
//! A projectile that curves toward its attackee with a bounded turn rate.
//! The heading is stored in degrees; each tick the projectile decides whether
//! it is allowed to rotate at all, rotates by at most `bend * dt`, then moves
//! forward along its heading. Detonation on proximity and lifetime expiry are
//! handled by the [`World`](crate::sim::world::World), which owns the hit and
//! despawn plumbing.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;

/// Aim point offset above the attackee's position.
pub const TARGET_OFFSET: Vec2 = Vec2::new(0.0, 0.5);
/// Detonation distance from the aim point.
pub const PROXIMITY_RANGE: f32 = 0.75;
/// Below this heading error the projectile always rotates.
pub const SNAP_ANGLE_DEG: f32 = 45.0;

/// Heading from `from` toward `to`, in degrees in (-180, 270).
///
/// Quadrant-corrected atan rather than atan2: the correction term picks the
/// half-plane, the atan picks the angle within it.
fn heading_toward(from: Vec2, to: Vec2) -> f32 {
    let diff = to - from;
    if diff.x == 0.0 && diff.y == 0.0 {
        return 0.0;
    }
    let quadrant = if diff.x >= 0.0 {
        if diff.y < 0.0 {
            2.0
        } else {
            0.0
        }
    } else {
        1.0
    };
    (quadrant * PI + (diff.y / diff.x).atan()).to_degrees()
}

/// Wrap an angle in degrees to [-180, 180).
fn wrap_degrees(angle: f32) -> f32 {
    (angle + 180.0).rem_euclid(360.0) - 180.0
}

/// Steering state for one tracking projectile.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ProjectileBrain {
    heading_deg: f32,
    /// Maximum turn rate in degrees per second.
    bend: f32,
    /// Local-time expiry in seconds.
    lifetime: f32,
}

impl ProjectileBrain {
    /// New projectile aimed at `target` from `from`.
    pub fn new(from: Vec2, target: Vec2, bend: f32, lifetime: f32) -> Self {
        Self {
            heading_deg: heading_toward(from, target + TARGET_OFFSET),
            bend,
            lifetime,
        }
    }

    /// Current heading in degrees.
    pub fn heading_deg(&self) -> f32 {
        self.heading_deg
    }

    /// Local-time expiry in seconds.
    pub fn lifetime(&self) -> f32 {
        self.lifetime
    }

    /// The point the projectile steers toward and detonates near.
    pub fn aim_point(attackee_pos: Vec2) -> Vec2 {
        attackee_pos + TARGET_OFFSET
    }

    /// True once the projectile has outlived its fuse.
    pub fn expired(&self, local_now: f32) -> bool {
        local_now >= self.lifetime
    }

    /// Rotate toward the aim point (when allowed) and move forward one step.
    /// Returns the new position; the caller commits it to the body.
    pub fn steer(&mut self, position: Vec2, speed: f32, attackee_pos: Vec2, dt: f32) -> Vec2 {
        let aim = Self::aim_point(attackee_pos);
        let delta = wrap_degrees(heading_toward(position, aim) - self.heading_deg);
        let distance = position.distance(aim);

        // Rotation is gated: a projectile that has overshot its target (large
        // heading error at close range) flies straight instead of orbiting.
        let turn_circle = 360.0 * speed / (PI * self.bend);
        if delta.abs() < SNAP_ANGLE_DEG || distance > turn_circle {
            self.heading_deg += delta.clamp(-self.bend * dt, self.bend * dt);
        }

        let heading = self.heading_deg.to_radians();
        position + Vec2::new(heading.cos(), heading.sin()) * speed * dt
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_initial_heading_quadrants() {
        // Straight right
        let b = ProjectileBrain::new(Vec2::ZERO, Vec2::new(5.0, -0.5), 90.0, 6.0);
        assert!((b.heading_deg() - 0.0).abs() < 1e-3);

        // Straight up (aim point offset included)
        let b = ProjectileBrain::new(Vec2::ZERO, Vec2::new(0.0, 4.5), 90.0, 6.0);
        assert!((b.heading_deg() - 90.0).abs() < 1e-3);

        // Straight left lands in the x<0 half-plane correction
        let b = ProjectileBrain::new(Vec2::ZERO, Vec2::new(-5.0, -0.5), 90.0, 6.0);
        assert!((b.heading_deg() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotation_bounded_by_bend() {
        let bend = 90.0;
        let mut brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(10.0, -0.5), bend, 6.0);
        let before = brain.heading_deg();

        // Target well off-heading but within the snap angle
        brain.steer(Vec2::ZERO, 3.0, Vec2::new(10.0, 5.0), DT);
        let turned = (brain.heading_deg() - before).abs();

        assert!(turned > 0.0);
        assert!(turned <= bend * DT + 1e-4);
    }

    #[test]
    fn test_no_rotation_when_overshot() {
        // Heading error beyond 45 degrees at close range: the projectile must
        // fly straight rather than orbit the target.
        let bend = 90.0;
        let speed = 3.0;
        let mut brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(10.0, -0.5), bend, 6.0);
        let before = brain.heading_deg();

        // Aim point behind the projectile, well inside the turn circle
        let target = Vec2::new(-1.0, -0.5);
        assert!(Vec2::ZERO.distance(target + TARGET_OFFSET) < 360.0 * speed / (PI * bend));

        brain.steer(Vec2::ZERO, speed, target, DT);
        assert_eq!(brain.heading_deg(), before);
    }

    #[test]
    fn test_overshot_but_distant_still_rotates() {
        // The same large heading error is allowed to rotate once the target
        // sits outside the turn circle.
        let bend = 90.0;
        let speed = 3.0;
        let mut brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(10.0, -0.5), bend, 6.0);
        let before = brain.heading_deg();

        let turn_circle = 360.0 * speed / (PI * bend);
        let target = Vec2::new(-(turn_circle + 5.0), -0.5);
        brain.steer(Vec2::ZERO, speed, target, DT);
        assert!((brain.heading_deg() - before).abs() > 0.0);
    }

    #[test]
    fn test_moves_along_heading() {
        let mut brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(10.0, -0.5), 90.0, 6.0);
        let next = brain.steer(Vec2::ZERO, 3.0, Vec2::new(10.0, -0.5), DT);

        // Heading 0: pure +x travel at speed * dt
        assert!((next.x - 3.0 * DT).abs() < 1e-4);
        assert!(next.y.abs() < 1e-4);
    }

    #[test]
    fn test_converges_onto_aim_point() {
        let mut brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(6.0, 2.0), 180.0, 10.0);
        let mut pos = Vec2::ZERO;
        let target = Vec2::new(6.0, 2.0);

        let mut closest = f32::MAX;
        for _ in 0..600 {
            pos = brain.steer(pos, 3.0, target, DT);
            closest = closest.min(pos.distance(ProjectileBrain::aim_point(target)));
        }
        assert!(closest < PROXIMITY_RANGE, "closest approach {closest}");
    }

    #[test]
    fn test_expiry() {
        let brain = ProjectileBrain::new(Vec2::ZERO, Vec2::new(1.0, 0.0), 90.0, 6.0);
        assert!(!brain.expired(5.99));
        assert!(brain.expired(6.0));
    }

    #[test]
    fn test_wrap_degrees() {
        assert_eq!(wrap_degrees(0.0), 0.0);
        assert_eq!(wrap_degrees(190.0), -170.0);
        assert_eq!(wrap_degrees(-190.0), 170.0);
        assert_eq!(wrap_degrees(360.0), 0.0);
    }
}
