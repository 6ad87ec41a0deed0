//! Per-step simulation driver
//!
//! One `Simulation` owns everything a run mutates. Each call to `tick`
//! performs one full pass in a fixed order: weather, streaming, input,
//! player physics, collisions, enemies, combo, tutorial, transients.
//! Identical seed plus identical inputs gives an identical run.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::ability::{Abilities, AbilityKind, Takedown};
use super::collision;
use super::combo::{ChainEnd, SkillChain, Trick};
use super::enemy::update_enemies;
use super::levelgen::Generator;
use super::physics::{self, Environment, MoveInput};
use super::state::{
    DeathCause, Enemy, Entity, FloatingText, GameEvent, Particle, ParticleKind, Player,
    RunOutcome,
};
use super::tutorial::{Observation, Tutorial};
use super::weather::{Weather, spawn_ambient};
use super::world::World;
use crate::consts::*;
use crate::levels::{Biome, LevelConfig, WeatherKind};
use crate::save::{RunSummary, SaveData, Upgrades};
use crate::settings::Settings;
use crate::tuning::Tuning;
use crate::{damping, lerp};

/// Release speed that scores a launch trick (18 px/frame)
const LAUNCH_TRICK_SPEED: f32 = 1080.0;
/// Score per distance milestone
const MILESTONE_SCORE: u64 = 10;
const MILESTONE_METERS: u32 = 50;
/// Camera vertical clamp
const CAMERA_Y_RANGE: f32 = 500.0;
/// Hint lookahead for the grapple tutorial step
const HINT_MIN_AHEAD: f32 = 100.0;

/// Input snapshot for a single step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    /// Tether button held; attach on press, release on let-go
    pub tether: bool,
    /// Pointer position in world coordinates
    pub pointer: Vec2,
    /// Jump edge
    pub jump: bool,
    /// Ability edge
    pub ability: Option<AbilityKind>,
}

/// Read-only view handed to the renderer after a step
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub player: &'a Player,
    pub trail: &'a VecDeque<Vec2>,
    pub entities: &'a [Entity],
    pub enemies: &'a [Enemy],
    pub particles: &'a [Particle],
    pub texts: &'a [FloatingText],
    pub camera: Vec2,
    pub weather: WeatherKind,
    pub biome: Biome,
    pub chain: &'a SkillChain,
    pub tutorial: &'a Tutorial,
    pub abilities: &'a Abilities,
    pub distance: u32,
    pub score: u64,
    pub tokens: u64,
    pub outcome: Option<RunOutcome>,
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct Simulation {
    level: LevelConfig,
    upgrades: Upgrades,
    /// Level a win would unlock, fixed at run start
    unlock_on_win: Option<u32>,
    tuning: Tuning,
    settings: Settings,
    rng: Pcg32,

    pub player: Player,
    pub world: World,
    pub generator: Generator,
    pub chain: SkillChain,
    pub tutorial: Tutorial,
    pub weather: Weather,
    pub abilities: Abilities,
    /// Top-left of the view in world space
    pub camera: Vec2,
    /// Meters travelled
    pub distance: u32,
    /// Permanent run score
    pub score: u64,
    /// Currency collected
    pub tokens: u64,
    /// Simulated seconds
    pub time: f32,
    pub outcome: Option<RunOutcome>,

    tether_held: bool,
    events: Vec<GameEvent>,
}

impl Simulation {
    /// Start a run with default balance and settings
    pub fn new(level: LevelConfig, save: &SaveData, seed: u64) -> Self {
        Self::with_config(level, save, seed, Tuning::default(), Settings::default())
    }

    pub fn with_config(
        level: LevelConfig,
        save: &SaveData,
        seed: u64,
        tuning: Tuning,
        settings: Settings,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::new(settings.max_particles());
        let mut generator = Generator::new();
        generator.prime(&mut world, &level, &mut rng);
        let weather = Weather::new(level.initial_weather(), &mut rng);
        let player = Player::new(&save.upgrades);

        log::info!(
            "Run started: level {} \"{}\" ({:?}), seed {}",
            level.id,
            level.name,
            level.biome,
            seed
        );

        Self {
            upgrades: save.upgrades,
            unlock_on_win: save.unlock_after_win(level.id),
            tutorial: Tutorial::new(level.tutorial),
            level,
            tuning,
            settings,
            rng,
            player,
            world,
            generator,
            chain: SkillChain::default(),
            weather,
            abilities: Abilities::default(),
            camera: Vec2::ZERO,
            distance: 0,
            score: 0,
            tokens: 0,
            time: 0.0,
            outcome: None,
            tether_held: false,
            events: Vec::new(),
        }
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Take the events queued since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            player: &self.player,
            trail: &self.player.trail,
            entities: &self.world.entities,
            enemies: &self.world.enemies,
            particles: &self.world.particles,
            texts: &self.world.texts,
            camera: self.camera,
            weather: self.weather.kind,
            biome: self.level.biome,
            chain: &self.chain,
            tutorial: &self.tutorial,
            abilities: &self.abilities,
            distance: self.distance,
            score: self.score,
            tokens: self.tokens,
            outcome: self.outcome,
        }
    }

    /// What the persistence layer should merge; `None` while running
    pub fn summary(&self) -> Option<RunSummary> {
        let outcome = self.outcome?;
        Some(RunSummary {
            level_id: self.level.id,
            outcome,
            score: self.score,
            tokens: self.tokens,
            distance: self.distance,
            max_speed: self.player.max_speed,
            unlocked_level: if outcome == RunOutcome::Won {
                self.unlock_on_win
            } else {
                None
            },
        })
    }

    /// Advance the run by `real_dt` wall-clock seconds
    ///
    /// Slow motion scales world time only. Ability cooldowns, rope integrity
    /// and the void budget always run on real time.
    pub fn tick(&mut self, input: &TickInput, real_dt: f32) {
        // Ended runs are frozen
        if self.outcome.is_some() {
            return;
        }

        let scale = self.abilities.time_scale()
            * self.tutorial.time_scale(self.player.standing_on.is_some());
        let dt = real_dt * scale;
        self.time += dt;
        self.abilities.update(real_dt);

        // 1. Weather and ambience
        if let Some(kind) = self
            .weather
            .update(dt, &self.level.allowed_weather, &mut self.rng)
        {
            self.events.push(GameEvent::WeatherChanged(kind));
        }
        self.player.in_fog = self.weather.is_foggy();
        if self.settings.weather_particles() {
            spawn_ambient(
                &mut self.world,
                &mut self.rng,
                self.weather.kind,
                self.level.biome,
                self.camera,
                dt,
            );
        }

        // 2. Streaming
        self.generator.ensure_ahead(
            &mut self.world,
            &self.level,
            &mut self.rng,
            self.player.pos.x,
            self.tuning.lookahead,
        );

        // 3. Input
        let was_standing = self.player.standing_on.is_some();
        self.handle_tether(input);
        let jumped = input.jump && physics::try_jump(&mut self.player, &self.tuning);
        if jumped {
            self.events.push(GameEvent::Jumped);
            let feet = self.player.pos + Vec2::new(0.0, self.player.size.y * 0.5);
            self.world
                .spawn_burst(&mut self.rng, feet, 0xFFFFFFFF, 5, 2.0, ParticleKind::Wind);
        }
        let rocket_used = self.handle_ability(input);

        // 4. Player physics
        let env = Environment {
            wind: self.weather.wind(&self.tuning),
            extra_drag_per_frame: self.weather.drag_per_frame(&self.tuning),
            rope_decays: self.tutorial.is_completed(),
            time_scale: scale,
        };
        let movement = MoveInput {
            left: input.left,
            right: input.right,
            down: input.down,
        };
        let step = physics::step_player(
            &mut self.player,
            movement,
            &env,
            &self.tuning,
            &self.upgrades,
            real_dt,
        );
        if step.snapped {
            self.events.push(GameEvent::TetherSnapped);
            self.world
                .spawn_text(self.player.pos, "SNAP!", 0xD50000FF, 25.0);
        }
        if step.safety_net {
            self.events.push(GameEvent::SafetyNet);
            self.world
                .spawn_text(self.player.pos, "SAFETY NET!", 0x4CAF50FF, 30.0);
        }
        if step.entered_void {
            self.events.push(GameEvent::VoidWarning);
        }
        if step.void_death {
            physics::kill(&mut self.player);
            self.end_run(RunOutcome::Lost(DeathCause::Void));
            return;
        }

        // 5. Camera and distance
        self.player.record_trail(self.settings.trail_length());
        self.follow_camera(dt);
        if self.track_distance() {
            self.end_run(RunOutcome::Won);
            return;
        }

        // 6. Collisions
        let hits = collision::resolve(
            &mut self.player,
            &mut self.world,
            &self.tuning,
            &self.upgrades,
            &mut self.rng,
            dt,
        );
        self.tokens += u64::from(hits.tokens);
        for event in &hits.events {
            if let GameEvent::Damaged { .. } = event {
                self.world
                    .spawn_text(self.player.pos, "OUCH!", 0xD50000FF, 30.0);
            }
        }
        self.events.extend(hits.events);
        for trick in hits.tricks {
            self.apply_trick(trick);
        }
        if let Some(ty) = hits.killed_by {
            self.end_run(RunOutcome::Lost(DeathCause::Enemy(ty)));
            return;
        }
        if hits.reached_portal {
            self.end_run(RunOutcome::Won);
            return;
        }

        // 7. Enemies
        update_enemies(
            &mut self.world.enemies,
            &self.world.entities,
            self.tuning.gravity,
            dt,
        );

        // 8. Combo expiry
        match self.chain.update(dt, self.tuning.chain_expiry) {
            Some(ChainEnd::Banked(banked)) => self.bank(banked),
            Some(ChainEnd::Discarded(lost)) => {
                log::debug!("Chain expired, {} points dropped", lost);
            }
            None => {}
        }

        // 9. Tutorial
        let obs = Observation {
            pos: self.player.pos,
            vel: self.player.vel,
            is_swinging: self.player.is_swinging,
            pumping: input.left || input.right,
            jumped,
            standing_on_branch: was_standing || self.player.standing_on.is_some(),
            distance: self.distance,
            rocket_used,
            next_anchor: self.next_anchor(),
        };
        self.tutorial.update(&obs, dt);

        // 10. Transients and streaming window
        self.world.update_transients(dt, self.tuning.gravity);
        self.world.cull(self.camera.x - self.tuning.cull_margin);
    }

    fn handle_tether(&mut self, input: &TickInput) {
        let pressed = input.tether && !self.tether_held;
        let let_go = !input.tether && self.tether_held;
        self.tether_held = input.tether;

        if pressed && !self.player.is_swinging {
            let target = physics::find_anchor(
                &self.world.entities,
                input.pointer,
                self.tuning.grapple_assist_radius,
            );
            if let Some((anchor_id, point)) = target {
                physics::attach(
                    &mut self.player,
                    anchor_id,
                    point,
                    &self.tuning,
                    &self.upgrades,
                );
                self.events.push(GameEvent::TetherAttached { anchor_id });
            }
        } else if let_go && physics::release(&mut self.player, &self.tuning, &self.upgrades) {
            self.events.push(GameEvent::TetherReleased);
            if self.player.speed() > LAUNCH_TRICK_SPEED {
                self.apply_trick(Trick::Launch);
            }
        }
    }

    /// Returns true if a rocket fired this step
    fn handle_ability(&mut self, input: &TickInput) -> bool {
        // Free rocket while the tutorial teaches it
        if self.tutorial.grants_rocket() {
            self.abilities.reset(AbilityKind::Rocket);
        }
        let Some(kind) = input.ability else {
            return false;
        };
        let Some(takedowns) =
            self.abilities
                .activate(kind, &mut self.player, &mut self.world.enemies)
        else {
            return false;
        };
        log::debug!("Ability {:?} hit {} enemies", kind, takedowns.len());
        self.events.push(GameEvent::AbilityUsed(kind));
        for Takedown { ty, pos } in takedowns {
            self.world
                .spawn_burst(&mut self.rng, pos, 0xFF5252FF, 10, 4.0, ParticleKind::Spark);
            self.events.push(GameEvent::EnemyDefeated(ty));
            self.apply_trick(Trick::Takedown);
        }
        kind == AbilityKind::Rocket
    }

    fn follow_camera(&mut self, dt: f32) {
        let target = Vec2::new(
            self.player.pos.x - CANVAS_WIDTH * 0.3,
            (self.player.pos.y - CANVAS_HEIGHT * 0.5).clamp(-CAMERA_Y_RANGE, CAMERA_Y_RANGE),
        );
        let t = 1.0 - damping(1.0 - self.tuning.camera_follow_per_frame, dt);
        self.camera = Vec2::new(
            lerp(self.camera.x, target.x, t),
            lerp(self.camera.y, target.y, t),
        );
    }

    /// Update meters and milestones. Returns true once the target is reached.
    fn track_distance(&mut self) -> bool {
        let meters = (self.player.pos.x.max(0.0) / PIXELS_PER_METER).floor() as u32;
        if meters > self.distance {
            let crossed = meters / MILESTONE_METERS - self.distance / MILESTONE_METERS;
            for i in 1..=crossed {
                let milestone = (self.distance / MILESTONE_METERS + i) * MILESTONE_METERS;
                self.score += MILESTONE_SCORE;
                self.events.push(GameEvent::Milestone { meters: milestone });
            }
            self.distance = meters;
        }
        self.distance >= self.level.target_distance
    }

    fn apply_trick(&mut self, trick: Trick) {
        let update = self.chain.trigger(trick, self.tuning.chain_timeout);
        let above = self.player.pos - Vec2::new(0.0, 40.0);
        self.world.spawn_text(
            above,
            format!("{} +{}", trick.name(), update.gained),
            0xFFEB3BFF,
            20.0,
        );
        if let Some(rank) = update.rank_up {
            self.events.push(GameEvent::RankUp(rank));
            self.world.spawn_text(above, rank.as_str(), 0xFF9800FF, 30.0);
        }
        if update.reached_max && !self.player.is_fever {
            self.player.is_fever = true;
            self.player.fever_time = self.tuning.fever_duration(self.upgrades.fever_duration);
            self.events.push(GameEvent::FeverStarted);
            self.world.spawn_text(above, "FEVER!", 0xFFEB3BFF, 40.0);
            log::debug!("Fever for {:.1}s", self.player.fever_time);
        }
    }

    fn bank(&mut self, banked: u64) {
        if banked == 0 {
            return;
        }
        self.score += banked;
        self.events.push(GameEvent::ChainBanked { score: banked });
        self.world.spawn_text(
            self.player.pos - Vec2::new(0.0, 60.0),
            format!("+{banked} BANKED"),
            0x00E676FF,
            30.0,
        );
        log::debug!("Chain banked: {} (score {})", banked, self.score);
    }

    /// First anchor comfortably ahead of the player
    fn next_anchor(&self) -> Option<Vec2> {
        self.world
            .entities
            .iter()
            .filter(|e| e.is_anchor())
            .map(|e| e.center())
            .find(|c| c.x > self.player.pos.x + HINT_MIN_AHEAD)
    }

    fn end_run(&mut self, outcome: RunOutcome) {
        match outcome {
            RunOutcome::Won => {
                let banked = self.chain.take();
                self.bank(banked);
            }
            RunOutcome::Lost(_) => self.chain.reset(),
        }
        self.outcome = Some(outcome);
        self.events.push(GameEvent::RunEnded(outcome));
        match outcome {
            RunOutcome::Won => log::info!(
                "Level {} cleared: score {}, tokens {}, {} m",
                self.level.id,
                self.score,
                self.tokens,
                self.distance
            ),
            RunOutcome::Lost(cause) => log::info!(
                "Run lost on level {} ({}): score {}, tokens {}, {} m",
                self.level.id,
                cause,
                self.score,
                self.tokens,
                self.distance
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::builtin_levels;
    use crate::sim::state::EntityKind;

    fn level(id: u32) -> LevelConfig {
        builtin_levels().remove(id as usize - 1)
    }

    fn sim(id: u32) -> Simulation {
        Simulation::new(level(id), &SaveData::default(), 12345)
    }

    #[test]
    fn test_new_run_primes_world() {
        let sim = sim(3);
        assert!(!sim.world.entities.is_empty());
        assert!(sim.generator.frontier() >= 1000.0);
        assert_eq!(sim.player.lives, MAX_LIVES);
        assert!(!sim.is_over());
        assert!(sim.summary().is_none());
    }

    #[test]
    fn test_determinism() {
        let mut a = sim(4);
        let mut b = sim(4);
        let inputs = [
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput {
                tether: true,
                pointer: Vec2::new(700.0, 100.0),
                ..Default::default()
            },
            TickInput {
                jump: true,
                ..Default::default()
            },
            TickInput::default(),
        ];
        for _ in 0..60 {
            for input in &inputs {
                a.tick(input, SIM_DT);
                b.tick(input, SIM_DT);
            }
        }
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.player.vel, b.player.vel);
        assert_eq!(a.world.entities.len(), b.world.entities.len());
        assert_eq!(a.world.enemies.len(), b.world.enemies.len());
        assert_eq!(a.score, b.score);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_snap_sequence() {
        let mut sim = sim(3);
        let anchor = sim.player.pos - Vec2::new(0.0, 100.0);
        physics::attach(&mut sim.player, 9999, anchor, &Tuning::default(), &Upgrades::default());
        sim.player.rope_timer = SIM_DT * 0.5;
        sim.tether_held = true;

        let held = TickInput {
            tether: true,
            ..Default::default()
        };
        sim.tick(&held, SIM_DT);
        assert!(!sim.player.is_swinging);
        assert!(sim.player.tether_point.is_none());
        assert!(sim.drain_events().contains(&GameEvent::TetherSnapped));
    }

    #[test]
    fn test_attach_and_release() {
        let mut sim = sim(3);
        let vine_top = sim.player.pos + Vec2::new(60.0, -200.0);
        let vine = sim
            .world
            .spawn_entity(EntityKind::Vine, vine_top, Vec2::new(4.0, 200.0), 0);

        let press = TickInput {
            tether: true,
            pointer: vine_top + Vec2::new(2.0, 100.0),
            ..Default::default()
        };
        sim.tick(&press, SIM_DT);
        assert!(sim.player.is_swinging);
        assert_eq!(sim.player.anchor_id, Some(vine));
        assert!(sim
            .drain_events()
            .contains(&GameEvent::TetherAttached { anchor_id: vine }));

        sim.tick(&TickInput::default(), SIM_DT);
        assert!(!sim.player.is_swinging);
        assert!(sim.drain_events().contains(&GameEvent::TetherReleased));
    }

    #[test]
    fn test_portal_win_unlocks_next_level() {
        let mut sim = sim(1);
        let pos = sim.player.pos + Vec2::new(0.0, -100.0);
        sim.world
            .spawn_entity(EntityKind::Portal, pos, Vec2::new(100.0, 200.0), 0);
        sim.tick(&TickInput::default(), SIM_DT);

        assert_eq!(sim.outcome, Some(RunOutcome::Won));
        let summary = sim.summary().unwrap();
        assert_eq!(summary.unlocked_level, Some(2));
        assert!(sim.drain_events().contains(&GameEvent::RunEnded(RunOutcome::Won)));
    }

    #[test]
    fn test_target_distance_wins() {
        let mut sim = sim(3);
        sim.player.pos.x = sim.level().target_x() + 5.0;
        sim.tick(&TickInput::default(), SIM_DT);
        assert_eq!(sim.outcome, Some(RunOutcome::Won));
        assert_eq!(sim.distance, sim.level().target_distance);
        // Level 3 is locked for a fresh save, so nothing unlocks
        assert_eq!(sim.summary().unwrap().unlocked_level, None);
    }

    #[test]
    fn test_void_death_timing() {
        let mut sim = sim(3);
        sim.player.pos.y = VOID_LIMIT + 500.0;
        sim.player.vel = Vec2::ZERO;

        let dt = 0.25;
        for _ in 0..12 {
            sim.tick(&TickInput::default(), dt);
        }
        // Exactly at the budget: still alive
        assert_eq!(sim.player.fall_timer, VOID_TIMER_MAX_SECONDS);
        assert!(!sim.is_over());

        sim.tick(&TickInput::default(), dt);
        assert_eq!(sim.outcome, Some(RunOutcome::Lost(DeathCause::Void)));
        assert_eq!(sim.player.lives, 0);
        let events = sim.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::VoidWarning).count(), 1);
    }

    #[test]
    fn test_ended_run_is_frozen() {
        let mut sim = sim(3);
        sim.player.pos.x = sim.level().target_x() + 5.0;
        sim.tick(&TickInput::default(), SIM_DT);
        assert!(sim.is_over());
        let pos = sim.player.pos;
        let score = sim.score;
        sim.tick(
            &TickInput {
                right: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(sim.player.pos, pos);
        assert_eq!(sim.score, score);
    }

    #[test]
    fn test_chain_banks_on_expiry() {
        let mut sim = sim(3);
        // Hover in place with nothing around to pick up
        sim.world = World::new(0);
        sim.player.vel = Vec2::ZERO;
        sim.apply_trick(Trick::Coin);
        assert!(sim.chain.active);
        for _ in 0..180 {
            sim.tick(&TickInput::default(), SIM_DT);
        }
        assert!(!sim.chain.active);
        assert!(sim
            .drain_events()
            .contains(&GameEvent::ChainBanked { score: 11 }));
    }

    #[test]
    fn test_max_multiplier_starts_fever() {
        let mut sim = sim(3);
        for _ in 0..8 {
            sim.apply_trick(Trick::Takedown);
        }
        assert!(sim.player.is_fever);
        assert_eq!(sim.player.fever_time, 5.0);
        let fevers = sim
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::FeverStarted)
            .count();
        assert_eq!(fevers, 1);
    }

    #[test]
    fn test_milestones_score() {
        let mut sim = sim(3);
        sim.player.pos.x = 101.0 * PIXELS_PER_METER;
        assert!(!sim.track_distance());
        assert_eq!(sim.distance, 101);
        assert_eq!(sim.score, 2 * MILESTONE_SCORE);
    }

    #[test]
    fn test_tutorial_protects_rope() {
        let mut sim = sim(1);
        let anchor = sim.player.pos - Vec2::new(0.0, 100.0);
        physics::attach(&mut sim.player, 9999, anchor, &Tuning::default(), &Upgrades::default());
        let timer = sim.player.rope_timer;
        sim.tether_held = true;
        sim.tick(
            &TickInput {
                tether: true,
                ..Default::default()
            },
            SIM_DT,
        );
        assert_eq!(sim.player.rope_timer, timer);
    }

    #[test]
    fn test_slow_mo_runs_on_real_time() {
        let mut sim = sim(3);
        sim.world = World::new(0);
        let start = sim.player.pos;
        let pinned_tick = |sim: &mut Simulation, input: &TickInput| {
            sim.player.pos = start;
            sim.player.vel = Vec2::ZERO;
            sim.tick(input, 0.25);
        };

        let fire = TickInput {
            ability: Some(AbilityKind::SlowMo),
            ..Default::default()
        };
        pinned_tick(&mut sim, &fire);
        assert!(sim.drain_events().contains(&GameEvent::AbilityUsed(AbilityKind::SlowMo)));

        for _ in 0..11 {
            pinned_tick(&mut sim, &TickInput::default());
        }
        assert_eq!(sim.abilities.slow_mo_time, 0.25);
        assert_eq!(sim.abilities.time_scale(), 0.5);

        // Three real seconds after activation
        pinned_tick(&mut sim, &TickInput::default());
        assert_eq!(sim.abilities.slow_mo_time, 0.0);
        assert_eq!(sim.abilities.time_scale(), 1.0);
        assert_eq!(sim.abilities.cooldown(AbilityKind::SlowMo), 12.0);
        assert!(!sim.is_over());
    }

    #[test]
    fn test_void_budget_ignores_slow_mo() {
        let mut sim = sim(3);
        sim.player.pos.y = VOID_LIMIT + 500.0;
        sim.player.vel = Vec2::ZERO;
        sim.abilities.slow_mo_time = 10.0;

        for _ in 0..12 {
            sim.tick(&TickInput::default(), 0.25);
        }
        assert_eq!(sim.player.fall_timer, VOID_TIMER_MAX_SECONDS);
        sim.tick(&TickInput::default(), 0.25);
        assert_eq!(sim.outcome, Some(RunOutcome::Lost(DeathCause::Void)));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut sim = sim(5);
        sim.tick(&TickInput::default(), SIM_DT);
        let json = serde_json::to_string(&sim.snapshot()).unwrap();
        assert!(json.contains("\"biome\":\"CAVE\""));
    }
}
