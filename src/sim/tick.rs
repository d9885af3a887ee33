//! Per-frame simulation tick
//!
//! One tick per rendered frame. The run state machine gates everything;
//! only `Playing` advances the world, in this order:
//!
//! 1. due scheduled tasks (spawns, regen, staggered stars)
//! 2. status decay, then elite modifiers
//! 3. movement (player, enemies, pickup magnet)
//! 4. auto-shot and the archetype ability
//! 5. physics step
//! 6. collision resolution
//! 7. off-screen culling

use glam::Vec2;

use super::ability::{bolt, starfall};
use super::collision;
use super::progression;
use super::registry::EntityKind;
use super::run;
use super::schedule::TaskKind;
use super::spatial::{direction, distance, nearest};
use super::spawner;
use super::state::{GameState, RunPhase};
use super::status;
use crate::consts::MAX_FRAME_DT;
use crate::{clamp_unit, unit_at};

/// Normalized input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Host clock in milliseconds (monotonic)
    pub now_ms: f64,
    /// Movement direction, each axis in [-1, 1]
    pub movement: Vec2,
    /// Confirm character / highlighted upgrade
    pub confirm: bool,
    pub nav_left: bool,
    pub nav_right: bool,
    /// Pause toggle
    pub pause: bool,
    /// Abandon the run and return to character select
    pub reset: bool,
    /// Direct pick of an offered upgrade (pointer click)
    pub pick_offer: Option<usize>,
    /// Demo mode - the game plays itself
    pub autoplay: bool,
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    state.now_ms = state.now_ms.max(input.now_ms);
    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    let mut input = input.clone();
    if input.autoplay {
        autoplay(state, &mut input);
    }

    if input.reset && run::reset(state) {
        return;
    }

    match state.phase {
        RunPhase::CharacterSelect => {
            if input.nav_left {
                run::select_prev(state);
            }
            if input.nav_right {
                run::select_next(state);
            }
            if input.confirm {
                run::confirm_selection(state);
            }
        }
        RunPhase::PausedForUpgrade => {
            if input.nav_left {
                state.draft.highlight_prev();
            }
            if input.nav_right {
                state.draft.highlight_next();
            }
            if let Some(i) = input.pick_offer {
                progression::choose_upgrade(state, i);
            } else if input.confirm {
                progression::confirm_highlighted(state);
            }
        }
        RunPhase::Paused => {
            if input.pause {
                run::toggle_pause(state);
            }
        }
        RunPhase::GameOver => {}
        RunPhase::Playing => {
            if input.pause {
                run::toggle_pause(state);
            } else {
                simulate(state, &input, dt);
            }
        }
    }
}

fn simulate(state: &mut GameState, input: &TickInput, dt: f32) {
    log::trace!("tick @ {:.0}ms ({:?})", state.now_ms, state.phase);
    state.stats.run_time_ms += dt as f64 * 1000.0;

    for task in state.scheduler.due(state.now_ms) {
        run_task(state, task);
    }

    state.player.status.decay(state.now_ms);
    status::recompute_modifiers(state);

    move_player(state, input.movement);
    steer_enemies(state);
    attract_pickups(state);

    bolt::fire_bolt(state);
    if let Some(mut ability) = state.ability.take() {
        ability.update(state, dt);
        if !matches!(state.phase, RunPhase::GameOver | RunPhase::CharacterSelect) {
            state.ability = Some(ability);
        }
    }

    let pairs = state.registry.step(dt);
    sync_player(state);

    collision::resolve(state, &pairs);

    if state.phase != RunPhase::GameOver {
        cull(state);
    }
}

fn run_task(state: &mut GameState, task: TaskKind) {
    match task {
        TaskKind::SpawnEnemy => {
            spawner::spawn_one(state);
        }
        TaskKind::Regen => {
            let amount = state.tuning.player.regen_amount;
            state.player.heal(amount);
        }
        TaskKind::LaunchStar { target, target_pos } => {
            starfall::launch_star(state, target, target_pos);
        }
    }
}

/// Stun pins the player; a knockback overrides input while it plays out
fn move_player(state: &mut GameState, movement: Vec2) {
    let now_ms = state.now_ms;
    let player = &state.player;
    let vel = if player.status.is_stunned(now_ms) {
        Vec2::ZERO
    } else if player.status.is_knocked_back(now_ms) {
        player.status.knockback_velocity
    } else {
        clamp_unit(movement) * player.stats.move_speed * player.status.speed_multiplier
    };
    state.player.vel = vel;
    state.registry.set_player_velocity(vel);
}

/// Chase the player, flee while confused, coast while knocked back
fn steer_enemies(state: &mut GameState) {
    let now_ms = state.now_ms;
    let target = state.player.pos;
    let base_speed = state.tuning.spawner.enemy_base_speed;

    let mut steering = Vec::new();
    for enemy in state.registry.enemies_mut() {
        if enemy.confused_until.is_some_and(|t| now_ms >= t) {
            enemy.confused_until = None;
        }
        if enemy.knockback_until.is_some_and(|t| now_ms >= t) {
            enemy.knockback_until = None;
        }
        if enemy.knockback_until.is_some() {
            continue;
        }
        let mut dir = direction(enemy.pos, target);
        if enemy.confused_until.is_some() {
            dir = -dir;
        }
        steering.push((enemy.id, dir * base_speed * enemy.speed_multiplier));
    }
    for (id, vel) in steering {
        state.registry.set_velocity(id, vel);
    }
}

fn attract_pickups(state: &mut GameState) {
    let target = state.player.pos;
    let radius = state.tuning.player.pickup_magnet_radius;
    let speed = state.tuning.player.pickup_magnet_speed;
    let steering: Vec<_> = state
        .registry
        .pickups()
        .iter()
        .map(|p| {
            let vel = if distance(p.pos, target) <= radius {
                direction(p.pos, target) * speed
            } else {
                Vec2::ZERO
            };
            (p.id, vel)
        })
        .collect();
    for (id, vel) in steering {
        state.registry.set_velocity(id, vel);
    }
}

/// Pull the integrated player position back and keep it inside the arena
fn sync_player(state: &mut GameState) {
    let Some(pos) = state.registry.player_position() else {
        return;
    };
    let r = state.player.radius;
    let max = Vec2::new(state.tuning.arena.width - r, state.tuning.arena.height - r);
    let clamped = pos.clamp(Vec2::splat(r), max.max(Vec2::splat(r)));
    state.player.pos = clamped;
    if clamped != pos {
        state.registry.set_player_position(clamped);
    }
}

fn cull(state: &mut GameState) {
    let arena = &state.tuning.arena;
    let (w, h) = (arena.width, arena.height);
    let (wide, tight) = (arena.enemy_cull_margin, arena.bolt_cull_margin);
    for kind in [EntityKind::Enemy, EntityKind::Ally, EntityKind::Companion, EntityKind::Pickup] {
        state.registry.cull_out_of_bounds(kind, w, h, wide);
    }
    state.registry.cull_out_of_bounds(EntityKind::Projectile, w, h, tight);
}

/// Demo driver: picks the first character and first upgrade, kites away
/// from close enemies, otherwise drifts toward XP or wanders
fn autoplay(state: &GameState, input: &mut TickInput) {
    match state.phase {
        RunPhase::CharacterSelect => input.confirm = true,
        RunPhase::PausedForUpgrade => input.pick_offer = Some(0),
        RunPhase::Playing => {
            let pos = state.player.pos;
            let threat = nearest(pos, state.registry.positions(EntityKind::Enemy))
                .filter(|(_, e)| e.distance(pos) < 140.0);
            let orb = nearest(pos, state.registry.positions(EntityKind::Pickup));
            let center = Vec2::new(state.tuning.arena.width, state.tuning.arena.height) / 2.0;
            input.movement = match (threat, orb) {
                (Some((_, e)), _) => {
                    (direction(e, pos) + direction(pos, center) * 0.5).normalize_or_zero()
                }
                (None, Some((_, o))) => direction(pos, o),
                (None, None) => unit_at((state.now_ms / 1500.0) as f32),
            };
        }
        RunPhase::Paused | RunPhase::GameOver => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::EntityInit;
    use crate::sim::state::{Archetype, EnemyKind};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn at(now_ms: f64) -> TickInput {
        TickInput {
            now_ms,
            ..TickInput::default()
        }
    }

    fn started(archetype: Archetype) -> GameState {
        let mut state = GameState::new(99, Tuning::default());
        assert!(run::start_run(&mut state, archetype));
        state
    }

    #[test]
    fn test_character_select_flow() {
        let mut state = GameState::new(1, Tuning::default());
        tick(&mut state, &TickInput { nav_right: true, ..at(0.0) }, DT);
        tick(&mut state, &TickInput { nav_right: true, ..at(16.0) }, DT);
        assert_eq!(state.select_index, 2);
        // Pause does nothing on the select screen
        tick(&mut state, &TickInput { pause: true, ..at(32.0) }, DT);
        assert_eq!(state.phase, RunPhase::CharacterSelect);
        tick(&mut state, &TickInput { confirm: true, ..at(48.0) }, DT);
        assert_eq!(state.phase, RunPhase::Playing);
        assert_eq!(state.player.archetype, Some(Archetype::Gooseherd));
    }

    #[test]
    fn test_pickup_magnet_pulls_only_nearby_orbs() {
        let mut state = started(Archetype::Warden);
        let player = state.player.pos;
        let near = state.registry.spawn(EntityInit::Pickup {
            pos: player + Vec2::new(60.0, 0.0),
            xp: 1,
        });
        let far = state.registry.spawn(EntityInit::Pickup {
            pos: player + Vec2::new(400.0, 0.0),
            xp: 1,
        });
        attract_pickups(&mut state);
        let vel = |id| state.registry.pickup(id).unwrap().vel;
        let speed = state.tuning.player.pickup_magnet_speed;
        assert!((vel(near) - Vec2::new(-speed, 0.0)).length() < 1e-3);
        assert_eq!(vel(far), Vec2::ZERO);
    }

    #[test]
    fn test_spawner_runs_only_while_playing() {
        let mut state = started(Archetype::Warden);
        let mut now = 0.0;
        for _ in 0..20 {
            now += 16.0;
            tick(&mut state, &at(now), DT);
        }
        // 320ms elapsed: one spawn at 267ms
        assert_eq!(state.registry.enemies().len(), 1);

        tick(&mut state, &TickInput { pause: true, ..at(now) }, DT);
        assert_eq!(state.phase, RunPhase::Paused);
        for _ in 0..100 {
            now += 16.0;
            tick(&mut state, &at(now), DT);
        }
        assert_eq!(state.registry.enemies().len(), 1);

        tick(&mut state, &TickInput { pause: true, ..at(now) }, DT);
        assert_eq!(state.phase, RunPhase::Playing);
        // Paused time is not owed: the next spawn is still ~214ms away
        now += 16.0;
        tick(&mut state, &at(now), DT);
        assert_eq!(state.registry.enemies().len(), 1);
    }

    #[test]
    fn test_run_timer_freezes_when_paused() {
        let mut state = started(Archetype::Warden);
        tick(&mut state, &at(16.0), DT);
        let t = state.stats.run_time_ms;
        assert!(t > 0.0);
        run::toggle_pause(&mut state);
        tick(&mut state, &at(32.0), DT);
        assert_eq!(state.stats.run_time_ms, t);
    }

    #[test]
    fn test_stun_blocks_movement_until_expiry() {
        let mut state = started(Archetype::Warden);
        state.player.status.stun(0.0, 100.0);
        let start = state.player.pos;
        let right = Vec2::new(1.0, 0.0);

        tick(&mut state, &TickInput { movement: right, ..at(50.0) }, DT);
        assert_eq!(state.player.pos, start);

        // Expires exactly now: decay runs before movement
        tick(&mut state, &TickInput { movement: right, ..at(100.0) }, DT);
        assert!(state.player.pos.x > start.x);
    }

    #[test]
    fn test_frost_slows_player() {
        let mut state = started(Archetype::Warden);
        let stats = state.tuning.enemies.frost;
        // Inside the slow radius, outside contact range
        let pos = state.player.pos + Vec2::new(0.0, 110.0);
        state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Frost,
            stats,
            pos,
        });
        tick(&mut state, &TickInput { movement: Vec2::X, ..at(16.0) }, DT);
        assert!(state.player.status.speed_multiplier < 1.0);
        assert!(state.player.status.cooldown_multiplier > 1.0);
        assert!(state.player.vel.x < state.player.stats.move_speed);
    }

    #[test]
    fn test_confused_enemy_flees() {
        let mut state = started(Archetype::Warden);
        let stats = state.tuning.enemies.normal;
        let pos = state.player.pos + Vec2::new(300.0, 0.0);
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Normal,
            stats,
            pos,
        });
        status::confuse_enemy(&mut state, id, 1000.0);
        tick(&mut state, &at(16.0), DT);
        assert!(state.registry.enemy(id).unwrap().vel.x > 0.0);

        tick(&mut state, &at(1100.0), DT);
        let enemy = state.registry.enemy(id).unwrap();
        assert!(enemy.confused_until.is_none());
        assert!(enemy.vel.x < 0.0);
    }

    #[test]
    fn test_pick_offer_resumes_play() {
        let mut state = started(Archetype::Warden);
        progression::grant_xp(&mut state, 30);
        assert_eq!(state.phase, RunPhase::PausedForUpgrade);
        let enemies = state.registry.enemies().len();
        tick(&mut state, &at(5000.0), DT);
        assert_eq!(state.phase, RunPhase::PausedForUpgrade);
        assert_eq!(state.registry.enemies().len(), enemies);

        tick(&mut state, &TickInput { nav_right: true, ..at(5016.0) }, DT);
        assert_eq!(state.draft.highlighted, 1);
        tick(&mut state, &TickInput { confirm: true, ..at(5032.0) }, DT);
        assert_eq!(state.phase, RunPhase::Playing);
    }

    #[test]
    fn test_reset_from_game_over() {
        let mut state = started(Archetype::Starcaller);
        run::game_over(&mut state);
        tick(&mut state, &TickInput { confirm: true, ..at(16.0) }, DT);
        assert_eq!(state.phase, RunPhase::GameOver);
        tick(&mut state, &TickInput { reset: true, ..at(32.0) }, DT);
        assert_eq!(state.phase, RunPhase::CharacterSelect);
    }

    #[test]
    fn test_player_stays_in_arena() {
        let mut state = started(Archetype::Starcaller);
        let mut now = 0.0;
        for _ in 0..400 {
            now += 16.0;
            tick(&mut state, &TickInput { movement: Vec2::new(-1.0, -1.0), ..at(now) }, DT);
            if state.phase != RunPhase::Playing {
                break;
            }
        }
        let r = state.player.radius;
        assert!(state.player.pos.x >= r && state.player.pos.y >= r);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_autoplay_keeps_invariants(seed in any::<u64>(), archetype in 0usize..3) {
            let mut state = GameState::new(seed, Tuning::default());
            state.select_index = archetype;
            let mut now = 0.0;
            for _ in 0..1500 {
                now += 1000.0 / 60.0;
                tick(&mut state, &TickInput { autoplay: true, ..at(now) }, DT);
                prop_assert!(state.registry.is_consistent());
                prop_assert!(state.player.health >= 0.0);
                prop_assert!(state.player.health <= state.player.max_health);
                if state.phase == RunPhase::GameOver {
                    prop_assert!(state.registry.is_empty());
                    prop_assert_eq!(state.scheduler.pending(), 0);
                    break;
                }
            }
        }
    }
}
