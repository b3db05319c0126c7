//! Phase Runner headless driver
//!
//! Loads a level (and optional tuning) and runs the fixed-step simulation
//! with a scripted input, logging every presentation event.
//!
//! Usage: `phase-runner [level.json] [tuning.json] [seconds]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Phase Runner (headless) starting...");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let level = match args.first() {
        Some(path) => match phase_runner::sim::LevelData::read(path) {
            Ok(level) => level,
            Err(e) => {
                log::error!("Failed to load level {path}: {e}");
                std::process::exit(1);
            }
        },
        None => {
            log::info!("No level given, using the built-in sample");
            phase_runner::sim::LevelData::sample()
        }
    };
    let tuning = args
        .get(1)
        .map(phase_runner::Tuning::load)
        .unwrap_or_default();
    let seconds: f32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(10.0);

    headless::run(level, tuning, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No browser front end; the library is driven by the host
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use phase_runner::Tuning;
    use phase_runner::consts::{MAX_SUBSTEPS, SIM_DT_MS};
    use phase_runner::sim::{GameEvent, LevelData, PlayerInput, TickInput, World, tick};

    /// Frame length fed to the accumulator; deliberately not a multiple of the tick
    const FRAME_MS: f32 = 1000.0 / 45.0;

    /// Scripted input: run right, hop every second, dash every three
    fn scripted_input(time: f32) -> TickInput {
        let second = (time / 1000.0) as u32;
        let within = time % 1000.0;
        TickInput {
            player: PlayerInput {
                right: true,
                jump: within < 150.0,
                dash: second % 3 == 2 && within < SIM_DT_MS,
                ..Default::default()
            },
        }
    }

    pub fn run(level: LevelData, tuning: Tuning, seconds: f32) {
        let mut world = World::new(level, tuning, 0x5eed);
        let mut accumulator = 0.0;
        let mut elapsed = 0.0;

        while elapsed < seconds * 1000.0 {
            accumulator += FRAME_MS;
            elapsed += FRAME_MS;

            let mut substeps = 0;
            while accumulator >= SIM_DT_MS && substeps < MAX_SUBSTEPS {
                let input = scripted_input(world.time);
                tick(&mut world, &input, SIM_DT_MS);
                accumulator -= SIM_DT_MS;
                substeps += 1;
            }

            for event in world.drain_events() {
                log_event(world.time, &event);
            }

            if world.player.dead {
                log::info!("Player died; retrying");
                world.retry();
            }
        }

        let pos = world.player.pos();
        log::info!(
            "Finished {:.1}s ({} ticks): player at ({:.0}, {:.0})",
            world.time / 1000.0,
            world.time_ticks,
            pos.x,
            pos.y
        );
        log::info!(
            "Health {}/{}, {} adversaries left",
            world.player.health,
            world.player.max_health,
            world.adversaries.len()
        );
    }

    fn log_event(time: f32, event: &GameEvent) {
        match event {
            GameEvent::PhaseChanged {
                group, new_phase, ..
            } => log::debug!("[{time:>7.0}ms] group {group} -> {new_phase:?}"),
            GameEvent::Landed | GameEvent::Jumped => log::trace!("[{time:>7.0}ms] {event:?}"),
            _ => log::info!("[{time:>7.0}ms] {event:?}"),
        }
    }
}
