//! Entity
//!
//! The base abstraction for every simulated actor: position, health and
//! combat lifecycle, change notification, the update-callback scheduler, and
//! the linear move-to-point tween.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::vec2::Vec2;
use crate::sim::scheduler::{Scheduler, UpdateCallback};

/// Health-bar fill presentation, a pure function of the health ratio.
///
/// Exists only while the entity is in combat. The constants are the source
/// sprite proportions: a 7/8-unit-wide fill inside a one-unit frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthBar {
    /// Local scale of the fill sprite.
    pub fill_scale: Vec2,
    /// Local offset of the fill sprite (keeps the fill left-anchored).
    pub fill_offset: Vec2,
}

impl HealthBar {
    /// Compute the fill layout for a health ratio. The ratio is clamped to
    /// [0, 1]: negative health (dead) renders as an empty bar.
    pub fn from_ratio(ratio: f32) -> Self {
        let ratio = ratio.clamp(0.0, 1.0);
        Self {
            fill_scale: Vec2::new(7.0 / 8.0 * ratio, 3.0 / 16.0),
            fill_offset: Vec2::new((1.0 - ratio) * 7.0 / -16.0, 0.0),
        }
    }
}

/// Plain entity state, mutable by scheduler callbacks and AI.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    /// Position in world units.
    pub position: Vec2,
    /// Movement speed in units per second.
    pub speed: f32,
    /// Suppresses AI and movement while true (set by the hit reaction).
    pub stunned: bool,
    /// Added to global time to get entity-local time. Anchored at spawn and
    /// corrected whenever a stun ends, so local timers exclude stunned spans.
    pub time_offset: f32,
    /// Damage this entity deals per strike.
    pub damage: f32,
    /// Whether the entity shows the default health bar while in combat.
    pub display_bar: bool,
    health: f32,
    max_health: f32,
    in_combat: bool,
    health_bar: Option<HealthBar>,
}

impl Body {
    /// Default damage per strike.
    pub const DEFAULT_DAMAGE: f32 = 4.0;

    /// Create a body at a position with full health. `now` anchors the local
    /// clock so that local time starts at zero.
    pub fn new(position: Vec2, max_health: f32, speed: f32, now: f32) -> Self {
        Self {
            position,
            speed,
            stunned: false,
            time_offset: -now,
            damage: Self::DEFAULT_DAMAGE,
            display_bar: true,
            health: max_health,
            max_health,
            in_combat: false,
            health_bar: None,
        }
    }

    /// Current health. May be negative (dead); never above max.
    #[inline]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[inline]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Dead means health at or below zero.
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Whether the entity is currently in combat.
    #[inline]
    pub fn in_combat(&self) -> bool {
        self.in_combat
    }

    /// Health-bar presentation, present only while in combat.
    #[inline]
    pub fn health_bar(&self) -> Option<HealthBar> {
        self.health_bar
    }

    /// Entity-local time: global time corrected for spawn and stun spans.
    #[inline]
    pub fn local_time(&self, now: f32) -> f32 {
        now + self.time_offset
    }

    fn refresh_health_bar(&mut self) {
        if self.display_bar && self.in_combat {
            self.health_bar = Some(HealthBar::from_ratio(self.health / self.max_health));
        }
    }
}

/// A simulated actor: body state plus scheduler and change subscribers.
///
/// Subscriber lists are append-only for the entity's lifetime; there is no
/// unsubscribe (a constraint carried over, not an oversight).
pub struct Entity {
    /// The entity's plain state.
    pub body: Body,
    scheduler: Scheduler,
    health_hooks: Vec<Box<dyn FnMut(f32)>>,
    combat_hooks: Vec<Box<dyn FnMut(bool)>>,
}

impl Entity {
    /// Create an entity at a position with full health.
    pub fn new(position: Vec2, max_health: f32, speed: f32, now: f32) -> Self {
        Self {
            body: Body::new(position, max_health, speed, now),
            scheduler: Scheduler::new(),
            health_hooks: Vec::new(),
            combat_hooks: Vec::new(),
        }
    }

    /// Set health, clamped on the high side only. Negative health is allowed
    /// and means dead. Updates the health-bar presentation when in combat and
    /// notifies health subscribers with the signed delta. Returns the delta.
    pub fn set_health(&mut self, value: f32) -> f32 {
        let old = self.body.health;
        self.body.health = value.min(self.body.max_health);
        self.body.refresh_health_bar();

        let delta = self.body.health - old;
        for hook in &mut self.health_hooks {
            hook(delta);
        }
        delta
    }

    /// Enter or leave combat. No-op when unchanged; otherwise notifies combat
    /// subscribers, then creates or drops the health-bar presentation (unless
    /// the entity opted out of the default bar).
    pub fn set_combat(&mut self, value: bool) {
        if value == self.body.in_combat {
            return;
        }
        self.body.in_combat = value;
        debug!(in_combat = value, "combat state changed");

        for hook in &mut self.combat_hooks {
            hook(value);
        }

        if !self.body.display_bar {
            return;
        }
        self.body.health_bar = if value {
            Some(HealthBar::from_ratio(
                self.body.health / self.body.max_health,
            ))
        } else {
            None
        };
    }

    /// Subscribe to health changes. The callback receives the signed delta.
    pub fn on_health_change(&mut self, callback: Box<dyn FnMut(f32)>) {
        self.health_hooks.push(callback);
    }

    /// Subscribe to combat changes. The callback receives the new flag.
    pub fn on_combat_change(&mut self, callback: Box<dyn FnMut(bool)>) {
        self.combat_hooks.push(callback);
    }

    /// Schedule a per-frame callback on this entity.
    pub fn on_update(&mut self, callback: UpdateCallback) {
        self.scheduler.schedule(callback);
    }

    /// Run one frame tick: invoke scheduled callbacks, dropping finished ones.
    pub fn run_frame(&mut self, now: f32) {
        self.scheduler.run(&mut self.body, now);
    }

    /// Number of scheduled update callbacks (tweens in flight).
    pub fn scheduled_callbacks(&self) -> usize {
        self.scheduler.len()
    }

    /// Move linearly to `point` at the entity's speed, via a scheduled
    /// callback. Completion fraction is `elapsed / (distance / speed)`; while
    /// under way the position interpolates, and on completion it snaps to the
    /// exact target, fires `on_complete` once, and the callback is removed.
    /// A zero target distance completes on the first frame.
    pub fn go_linearly(&mut self, point: Vec2, now: f32, on_complete: Option<Box<dyn FnOnce()>>) {
        let origin = self.body.position;
        let start = self.body.local_time(now);
        let duration = origin.distance(point) / self.body.speed;
        let mut on_complete = on_complete;

        self.scheduler.schedule(Box::new(move |tick| {
            // NaN or non-positive duration (zero distance) is instantly done.
            let t = if duration > 0.0 {
                (tick.local_time() - start) / duration
            } else {
                1.0
            };

            if t >= 1.0 {
                tick.body.position = point;
                if let Some(done) = on_complete.take() {
                    done();
                }
                true
            } else {
                tick.body.position = origin.lerp(point, t);
                false
            }
        }));
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_health_clamps_high_side_only() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);

        entity.set_health(100.0);
        assert_eq!(entity.body.health(), 25.0);

        // Negative health is allowed and means dead
        entity.set_health(-3.0);
        assert_eq!(entity.body.health(), -3.0);
        assert!(entity.body.is_dead());
    }

    #[test]
    fn test_health_delta_is_new_minus_old() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);

        let last_delta = Rc::new(Cell::new(0.0f32));
        let seen = last_delta.clone();
        entity.on_health_change(Box::new(move |delta| seen.set(delta)));

        entity.set_health(20.0);
        assert_eq!(last_delta.get(), -5.0);

        entity.set_health(22.0);
        assert_eq!(last_delta.get(), 2.0);

        // Clamped raise: delta reflects the clamped value, not the request
        entity.set_health(100.0);
        assert_eq!(last_delta.get(), 3.0);
    }

    #[test]
    fn test_randomized_health_never_exceeds_max() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);

        for _ in 0..1000 {
            entity.set_health(rng.gen_range(-100.0..200.0));
            assert!(entity.body.health() <= entity.body.max_health());
        }
    }

    #[test]
    fn test_combat_creates_and_drops_bar() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        assert!(entity.body.health_bar().is_none());

        entity.set_combat(true);
        let bar = entity.body.health_bar().expect("bar exists in combat");
        assert!((bar.fill_scale.x - 7.0 / 8.0).abs() < 1e-6);

        entity.set_combat(false);
        assert!(entity.body.health_bar().is_none());
    }

    #[test]
    fn test_combat_noop_does_not_notify() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);

        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        entity.on_combat_change(Box::new(move |_| seen.set(seen.get() + 1)));

        entity.set_combat(false); // unchanged
        assert_eq!(calls.get(), 0);

        entity.set_combat(true);
        entity.set_combat(true); // unchanged
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_bar_ratio_clamped_when_dead() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        entity.set_combat(true);

        entity.set_health(-10.0);
        let bar = entity.body.health_bar().expect("bar exists in combat");
        assert_eq!(bar.fill_scale.x, 0.0);
        assert_eq!(bar.fill_offset.x, 7.0 / -16.0);
    }

    #[test]
    fn test_opted_out_entity_never_gets_bar() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        entity.body.display_bar = false;

        entity.set_combat(true);
        entity.set_health(10.0);
        assert!(entity.body.health_bar().is_none());
    }

    #[test]
    fn test_linear_move_determinism() {
        // Origin (0,0), target (10,0), speed 5: done after exactly 2 seconds.
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);

        let completions = Rc::new(Cell::new(0));
        let seen = completions.clone();
        entity.go_linearly(
            Vec2::new(10.0, 0.0),
            0.0,
            Some(Box::new(move || seen.set(seen.get() + 1))),
        );

        let dt = 0.01;
        let mut now = 0.0;
        while now < 2.0 - 1e-6 {
            now += dt;
            entity.run_frame(now);
        }
        // One more frame lands exactly on t = 1
        entity.run_frame(2.0);

        assert_eq!(entity.body.position, Vec2::new(10.0, 0.0));
        assert_eq!(completions.get(), 1);
        assert_eq!(entity.scheduled_callbacks(), 0);

        // Extra frames change nothing
        entity.run_frame(3.0);
        assert_eq!(completions.get(), 1);
        assert_eq!(entity.body.position, Vec2::new(10.0, 0.0));
    }

    #[test]
    fn test_linear_move_midpoint() {
        let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);
        entity.go_linearly(Vec2::new(10.0, 0.0), 0.0, None);

        entity.run_frame(1.0);
        assert!((entity.body.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_move_zero_distance_completes_immediately() {
        let mut entity = Entity::new(Vec2::new(3.0, 3.0), 25.0, 5.0, 0.0);

        let completions = Rc::new(Cell::new(0));
        let seen = completions.clone();
        entity.go_linearly(
            Vec2::new(3.0, 3.0),
            0.0,
            Some(Box::new(move || seen.set(seen.get() + 1))),
        );

        entity.run_frame(0.0);
        assert_eq!(completions.get(), 1);
        assert_eq!(entity.body.position, Vec2::new(3.0, 3.0));
        assert_eq!(entity.scheduled_callbacks(), 0);
    }

    #[test]
    fn test_local_time_anchored_at_spawn() {
        let body = Body::new(Vec2::ZERO, 25.0, 5.0, 100.0);
        assert_eq!(body.local_time(100.0), 0.0);
        assert_eq!(body.local_time(101.5), 1.5);
    }

    proptest! {
        #[test]
        fn prop_health_never_exceeds_max(values in proptest::collection::vec(-1000.0f32..1000.0, 1..50)) {
            let mut entity = Entity::new(Vec2::ZERO, 25.0, 5.0, 0.0);
            entity.set_combat(true);
            for v in values {
                entity.set_health(v);
                prop_assert!(entity.body.health() <= entity.body.max_health());
                // Bar ratio is always computed against the clamped value
                let bar = entity.body.health_bar().unwrap();
                prop_assert!(bar.fill_scale.x >= 0.0 && bar.fill_scale.x <= 7.0 / 8.0 + 1e-6);
            }
        }
    }
}
