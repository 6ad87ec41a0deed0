//! Vine Swing headless runner
//!
//! Plays one level with a simple autopilot and folds the result into a
//! save file. Useful for balance checks and seed hunting.
//!
//! Usage: `vine-swing [LEVEL] [SEED] [SAVE.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts drive `Simulation` directly on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use anyhow::{Context, bail};

    use vine_swing::consts::SIM_DT;
    use vine_swing::levels::{builtin_levels, find_level};
    use vine_swing::sim::{GameEvent, Simulation, TickInput};
    use vine_swing::SaveData;

    /// Hard stop for runs that stall
    const MAX_RUN_SECONDS: f32 = 600.0;
    /// How far ahead the autopilot looks for something to grab
    const GRAB_REACH: f32 = 450.0;
    /// Let go once moving forward this fast on the upswing
    const RELEASE_SPEED: f32 = 700.0;

    pub fn run() -> anyhow::Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let level_id: u32 = match args.next() {
            Some(s) => s.parse().with_context(|| format!("invalid level id {s:?}"))?,
            None => 1,
        };
        let seed: u64 = match args.next() {
            Some(s) => s.parse().with_context(|| format!("invalid seed {s:?}"))?,
            None => 42,
        };
        let save_path = args.next().map(PathBuf::from);

        let mut save = match &save_path {
            Some(path) if path.exists() => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SaveData::from_json(&json)?
            }
            _ => SaveData::default(),
        };
        if !save.is_unlocked(level_id) {
            bail!(
                "level {} is locked (reached {})",
                level_id,
                save.max_level_reached
            );
        }

        let levels = builtin_levels();
        let level = find_level(&levels, level_id)?.clone();
        let mut sim = Simulation::new(level, &save, seed);

        let mut elapsed = 0.0;
        while !sim.is_over() && elapsed < MAX_RUN_SECONDS {
            let input = autopilot(&sim);
            sim.tick(&input, SIM_DT);
            elapsed += SIM_DT;
            for event in sim.drain_events() {
                match event {
                    GameEvent::Milestone { meters } => log::info!("{} m", meters),
                    GameEvent::RunEnded(_) => {}
                    other => log::debug!("{:?}", other),
                }
            }
        }

        let Some(summary) = sim.summary() else {
            log::warn!("Run stalled after {:.0}s at {} m", elapsed, sim.distance);
            return Ok(());
        };
        let merged = save.merge_run(&summary);
        println!(
            "level {} {:?}: score {}, tokens {}, {} m, top speed {:.0} px/s",
            summary.level_id,
            summary.outcome,
            summary.score,
            summary.tokens,
            summary.distance,
            summary.max_speed
        );
        if merged.new_high_score {
            println!("new high score!");
        }
        if let Some(level) = merged.unlocked_level {
            println!("unlocked level {level}");
        }

        if let Some(path) = save_path {
            std::fs::write(&path, save.to_json()?)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }

    /// Grab the next anchor while falling, pump while swinging, let go on the upswing
    fn autopilot(sim: &Simulation) -> TickInput {
        let player = &sim.player;
        if player.is_swinging {
            let release = player.vel.x > RELEASE_SPEED && player.vel.y < 0.0;
            return TickInput {
                right: true,
                tether: !release,
                ..Default::default()
            };
        }

        let target = sim
            .world
            .entities
            .iter()
            .filter(|e| e.is_anchor())
            .map(|e| e.center())
            .filter(|c| c.x > player.pos.x + 50.0 && c.distance(player.pos) < GRAB_REACH)
            .min_by(|a, b| a.x.total_cmp(&b.x));

        match target {
            Some(pointer) if player.vel.y > 0.0 => TickInput {
                right: true,
                tether: true,
                pointer,
                ..Default::default()
            },
            _ => TickInput {
                right: true,
                jump: player.pos.y > 600.0,
                ..Default::default()
            },
        }
    }
}
