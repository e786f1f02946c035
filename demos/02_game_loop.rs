//! Game loop demo: a custom `OsBridge`, a `World` with two component types,
//! and an `Engine` driving a movement system for a fixed number of ticks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use enginecore::ecs::World;
use enginecore::engine::{Engine, EngineConfig};
use enginecore::memory::MemoryPool;
use enginecore::platform::{LibHandle, OsBridge};
use enginecore::systems::SystemRegistry;

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

/// A platform that runs for a fixed number of ticks then reports stopped,
/// standing in for a real window/event-pump backend.
struct FixedTickPlatform {
    start: Instant,
    ticks_remaining: AtomicU64,
    running: AtomicBool,
}

impl FixedTickPlatform {
    fn new(ticks: u64) -> Self {
        FixedTickPlatform {
            start: Instant::now(),
            ticks_remaining: AtomicU64::new(ticks),
            running: AtomicBool::new(true),
        }
    }
}

impl OsBridge for FixedTickPlatform {
    fn monotonic_millis(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn poll_events(&mut self) -> bool {
        let remaining = self.ticks_remaining.fetch_sub(1, Ordering::SeqCst);
        if remaining == 0 {
            self.running.store(false, Ordering::SeqCst);
            false
        } else {
            true
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    unsafe fn lib_open(&self, _path: &str) -> Option<LibHandle> {
        None
    }

    unsafe fn lib_symbol(&self, _handle: LibHandle, _name: &str) -> Option<*const ()> {
        None
    }

    unsafe fn lib_close(&self, _handle: LibHandle) {}
}

fn main() {
    // `World` borrows its own pool independent of the engine's internal
    // pool; the engine's pool is reserved for engine/plugin allocations.
    let world_pool = MemoryPool::init(4 * 1024 * 1024).expect("world pool init");
    let mut world = World::new(&world_pool);

    let config = EngineConfig {
        memory_pool_size: 1024 * 1024,
    };
    let mut engine = Engine::new(config, FixedTickPlatform::new(120)).expect("engine init");

    // Systems that don't need to touch `world` directly (diagnostics,
    // timers) go through the registry instead of the per-tick closure.
    let elapsed = std::sync::Arc::new(std::sync::Mutex::new(0.0f32));
    let mut diagnostics = SystemRegistry::new();
    let elapsed_tracker = std::sync::Arc::clone(&elapsed);
    diagnostics
        .register(move |dt| *elapsed_tracker.lock().unwrap() += dt)
        .unwrap();

    let position = world.register_component::<Position>().unwrap();
    let velocity = world.register_component::<Velocity>().unwrap();

    let player = world.create_entity().unwrap();
    world
        .add(player, position, Position { x: 0.0, y: 0.0 })
        .unwrap();
    world
        .add(player, velocity, Velocity { dx: 1.0, dy: 0.5 })
        .unwrap();

    let mut tick = 0u32;
    let mut frames_rendered = 0u32;
    engine.run(
        |_engine, dt| {
            diagnostics.update(dt);

            let targets: Vec<_> = world.iter::<Velocity>(velocity).map(|(e, _)| e).collect();
            for entity in targets {
                let v = *world.get::<Velocity>(entity, velocity).unwrap();
                let p = world.get_mut::<Position>(entity, position).unwrap();
                p.x += v.dx * dt;
                p.y += v.dy * dt;
            }
            tick += 1;
            if tick % 30 == 0 {
                let p = world.get::<Position>(player, position).unwrap();
                println!("tick {tick}: player at ({:.2}, {:.2})", p.x, p.y);
            }
        },
        || frames_rendered += 1,
    );
    println!("frames rendered: {frames_rendered}");

    world.destroy_entity(player).unwrap();
    drop(world);

    println!("total elapsed simulated time: {:.2}s", *elapsed.lock().unwrap());

    let reports = engine.shutdown();
    println!(
        "shutdown complete, {} leaked allocation group(s) under tag {:?}",
        reports.len(),
        reports.iter().map(|r| r.tag.name()).collect::<Vec<_>>()
    );
}
