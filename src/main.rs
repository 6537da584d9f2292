//! Skirmish Demo
//!
//! Headless demo run: a player besieged by melee mobs, a tracking projectile,
//! and a ground spike. Logs notable events as they happen, then verifies
//! determinism by replaying the same scenario and comparing event streams.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use skirmish::{
    NullCollaborators, SimEvent, SimEventData, Vec2, World, TICK_RATE, TICK_SECONDS, VERSION,
};

const DEMO_TICKS: u32 = 600;
const RNG_SEED: u64 = 12345;

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Skirmish v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);
    info!("Running {} ticks ({} seconds)", DEMO_TICKS, DEMO_TICKS / TICK_RATE);

    let log = run_scenario(RNG_SEED, true)?;
    info!("Total events: {}", log.len());

    // Verify determinism by replaying the same scenario
    info!("=== Verifying Determinism ===");
    let replay = run_scenario(RNG_SEED, false)?;
    if log == replay {
        info!("DETERMINISM VERIFIED: event streams match!");
    } else {
        info!("DETERMINISM FAILURE: event streams differ!");
    }

    println!("{}", serde_json::to_string_pretty(&log)?);
    Ok(())
}

/// Build the demo world, run it, and return the full event log.
fn run_scenario(seed: u64, verbose: bool) -> Result<Vec<SimEvent>> {
    let mut world = World::new(seed);
    let mut collab = NullCollaborators;

    let player = world.spawn_bystander(Vec2::ZERO, 100.0, 5.0);

    let mobs = [
        world.spawn_melee(Vec2::new(4.0, 0.0), 25.0, 5.0, player)?,
        world.spawn_melee(Vec2::new(-3.0, 2.0), 25.0, 5.0, player)?,
        world.spawn_melee(Vec2::new(1.0, -4.0), 25.0, 4.0, player)?,
    ];
    for mob in mobs {
        world.set_combat(mob, true)?;
    }

    world.spawn_projectile(Vec2::new(-8.0, 0.0), player, 3.0, 180.0, 6.0, 5.0)?;
    world.spawn_spike(player, 2.0)?;

    // The player walks clear of the telegraphed spike
    let now = world.now();
    if let Some(entity) = world.entity_mut(player) {
        entity.go_linearly(Vec2::new(6.0, 0.0), now, None);
    }

    // The player fights back once a second
    let mut log = Vec::new();
    for t in 0..DEMO_TICKS {
        if t % TICK_RATE == TICK_RATE - 1 {
            let center = world
                .body(player)
                .map(|b| b.position)
                .unwrap_or(Vec2::ZERO);
            world.strike_area(center, 1.5, 10.0, &mut collab);
        }

        let events = world.step(TICK_SECONDS, &mut collab);
        if verbose {
            for event in &events {
                match event.data {
                    SimEventData::Struck {
                        attacker,
                        target,
                        damage,
                    } => info!("tick {}: {} struck {} for {}", event.tick, attacker, target, damage),
                    SimEventData::Died { id } => info!("tick {}: {} died", event.tick, id),
                    SimEventData::Despawned { id } => info!("tick {}: {} despawned", event.tick, id),
                    _ => {}
                }
            }
        }
        log.extend(events);
    }

    if verbose {
        if let Some(body) = world.body(player) {
            info!(
                "Player finished at {} with {:.1}/{:.1} health",
                body.position,
                body.health(),
                body.max_health()
            );
        }
        info!("{} actors remaining", world.len());
    }
    Ok(log)
}
