//! Starcaller: homing starfall volleys
//!
//! A cast picks spread-out targets in range and launches one star per
//! target, the first at once and the rest staggered through the scheduler.
//! Stars home on the target's last known position and explode on arrival,
//! on leaving the arena, or on timeout. Brushing an enemy on the way sets
//! off an extra blast, rate-limited per star.

use glam::Vec2;

use super::{Ability, cooldown_ready};
use crate::sim::combat::{DamageOutcome, KillSource, damage_enemy};
use crate::sim::registry::{EntityId, EntityInit, EntityKind};
use crate::sim::schedule::TaskKind;
use crate::sim::spatial::{direction, outside_bounds, select_spread_targets, within_range};
use crate::sim::state::{Archetype, GameState};
use crate::sim::status::confuse_enemy;

#[derive(Debug, Default)]
pub struct StarfallAbility {
    last_cast_ms: Option<f64>,
}

impl Ability for StarfallAbility {
    fn archetype(&self) -> Archetype {
        Archetype::Starcaller
    }

    fn update(&mut self, state: &mut GameState, _dt: f32) {
        let player = &state.player;
        if cooldown_ready(
            self.last_cast_ms,
            state.now_ms,
            player.stats.star_cooldown_ms,
            player.status.cooldown_multiplier,
        ) && cast(state) > 0
        {
            self.last_cast_ms = Some(state.now_ms);
        }
        steer_stars(state);
    }
}

/// Pick targets and start a volley; returns the number of stars queued
pub fn cast(state: &mut GameState) -> usize {
    let origin = state.player.pos;
    let candidates: Vec<(EntityId, Vec2)> = within_range(
        origin,
        state.tuning.starfall.cast_range,
        state.registry.positions(EntityKind::Enemy),
    )
    .into_iter()
    .map(|(id, pos, _)| (id, pos))
    .collect();
    if candidates.is_empty() {
        return 0;
    }

    let count = state.player.stats.star_count as usize;
    let targets = select_spread_targets(origin, &candidates, count);
    let stagger = state.tuning.starfall.stagger_ms;
    let now_ms = state.now_ms;
    for (i, &target) in targets.iter().enumerate() {
        let Some(&(_, target_pos)) = candidates.iter().find(|(id, _)| *id == target) else {
            continue;
        };
        if i == 0 {
            launch_star(state, target, target_pos);
        } else {
            state
                .scheduler
                .after(now_ms, stagger * i as f64, TaskKind::LaunchStar { target, target_pos });
        }
    }
    targets.len()
}

/// Spawn one star at the player heading for `target`
pub fn launch_star(state: &mut GameState, target: EntityId, target_pos: Vec2) -> EntityId {
    let origin = state.player.pos;
    let aim = state.registry.enemy(target).map_or(target_pos, |e| e.pos);
    let id = state.registry.spawn(EntityInit::Star {
        pos: origin,
        target: Some(target),
        target_pos: aim,
        damage: state.player.stats.star_damage,
        now_ms: state.now_ms,
    });
    let vel = direction(origin, aim) * state.tuning.starfall.speed;
    state.registry.set_velocity(id, vel);
    id
}

/// Re-aim every star and detonate the ones that are done
pub fn steer_stars(state: &mut GameState) {
    let tuning = &state.tuning.starfall;
    let (speed, arrival, timeout) = (tuning.speed, tuning.arrival_radius, tuning.timeout_ms);
    let (width, height) = (state.tuning.arena.width, state.tuning.arena.height);
    let now_ms = state.now_ms;

    let mut finished = Vec::new();
    let mut steering = Vec::new();
    for star in state.registry.stars() {
        let target_pos = star
            .target
            .and_then(|t| state.registry.enemy(t))
            .map_or(star.target_pos, |e| e.pos);
        let arrived = star.pos.distance(target_pos) <= arrival;
        let grounded = outside_bounds(star.pos, width, height, 0.0);
        let expired = now_ms - star.created_ms >= timeout;
        if arrived || grounded || expired {
            finished.push(star.id);
        } else {
            steering.push((star.id, target_pos, direction(star.pos, target_pos) * speed));
        }
    }

    for (id, target_pos, vel) in steering {
        if let Some(star) = state.registry.star_mut(id) {
            star.target_pos = target_pos;
        }
        state.registry.set_velocity(id, vel);
    }
    for id in finished {
        detonate(state, id, true);
    }
}

/// Blast at the star's position
///
/// Enemies in the blast radius are processed closest first; survivors are
/// confused. A blast within the re-trigger guard of the previous one is
/// skipped. With `consume` the star is removed either way. Returns the
/// number of enemies hit.
pub fn detonate(state: &mut GameState, star_id: EntityId, consume: bool) -> usize {
    let now_ms = state.now_ms;
    let guard_ms = state.tuning.starfall.retrigger_guard_ms;
    let Some(star) = state.registry.star_mut(star_id) else {
        return 0;
    };
    let guarded = star.last_trigger_ms.is_some_and(|last| now_ms - last < guard_ms);
    let (center, damage) = (star.pos, star.damage);
    if !guarded {
        star.last_trigger_ms = Some(now_ms);
    }
    if consume {
        state.registry.remove(star_id);
    }
    if guarded {
        return 0;
    }

    let radius = state.tuning.starfall.aoe_radius;
    let confusion_ms = state.tuning.starfall.confusion_ms;
    let hits = within_range(center, radius, state.registry.positions(EntityKind::Enemy));
    for &(id, _, _) in &hits {
        let outcome = damage_enemy(state, id, damage, KillSource::Starfall);
        if let DamageOutcome::Survived { .. } = outcome {
            confuse_enemy(state, id, confusion_ms);
        }
    }
    hits.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{EnemyKind, RunPhase};
    use crate::tuning::Tuning;

    fn starcaller() -> GameState {
        let mut state = GameState::new(77, Tuning::default());
        state.phase = RunPhase::Playing;
        state
    }

    fn enemy(state: &mut GameState, kind: EnemyKind, offset: Vec2) -> EntityId {
        let stats = *state.tuning.enemies.get(kind);
        let pos = state.player.pos + offset;
        state.registry.spawn(EntityInit::Enemy { kind, stats, pos })
    }

    #[test]
    fn test_cast_staggers_launches() {
        let mut state = starcaller();
        enemy(&mut state, EnemyKind::Normal, Vec2::new(100.0, 0.0));
        enemy(&mut state, EnemyKind::Normal, Vec2::new(-200.0, 0.0));
        enemy(&mut state, EnemyKind::Normal, Vec2::new(0.0, 250.0));
        enemy(&mut state, EnemyKind::Normal, Vec2::new(0.0, 900.0));

        assert_eq!(cast(&mut state), 3);
        assert_eq!(state.registry.stars().len(), 1);
        assert_eq!(state.scheduler.pending(), 2);

        let due = state.scheduler.due(state.now_ms + 300.0);
        assert_eq!(due.len(), 2);
    }

    #[test]
    fn test_no_cast_without_targets() {
        let mut state = starcaller();
        let mut ability = StarfallAbility::default();
        ability.update(&mut state, 0.016);
        assert!(ability.last_cast_ms.is_none());
        assert!(state.registry.stars().is_empty());
    }

    #[test]
    fn test_detonation_hits_closest_first_and_confuses() {
        let mut state = starcaller();
        state.now_ms = 1000.0;
        let tank = enemy(&mut state, EnemyKind::Tank, Vec2::new(200.0, 0.0));
        let near = enemy(&mut state, EnemyKind::Normal, Vec2::new(210.0, 0.0));
        let far = enemy(&mut state, EnemyKind::Normal, Vec2::new(400.0, 0.0));
        let star = launch_star(&mut state, tank, Vec2::ZERO);
        // Move the star onto the tank
        state.registry.set_velocity(star, Vec2::ZERO);
        state.registry.stars_mut()[0].pos = state.player.pos + Vec2::new(200.0, 0.0);

        assert_eq!(detonate(&mut state, star, true), 2);
        assert!(state.registry.stars().is_empty());
        // Normal (3 hp) dies to 3 damage, tank survives confused
        assert!(state.registry.enemy(near).is_none());
        let tank = state.registry.enemy(tank).unwrap();
        assert_eq!(tank.confused_until, Some(1000.0 + state.tuning.starfall.confusion_ms));
        assert!(state.registry.enemy(far).unwrap().confused_until.is_none());
        assert_eq!(state.registry.pickups().len(), 1);
    }

    #[test]
    fn test_retrigger_guard() {
        let mut state = starcaller();
        state.now_ms = 0.0;
        let tank = enemy(&mut state, EnemyKind::Tank, Vec2::new(50.0, 0.0));
        let star = launch_star(&mut state, tank, Vec2::ZERO);
        state.registry.stars_mut()[0].pos = state.player.pos + Vec2::new(50.0, 0.0);

        assert_eq!(detonate(&mut state, star, false), 1);
        state.now_ms = 50.0;
        assert_eq!(detonate(&mut state, star, false), 0);
        state.now_ms = 150.0;
        assert_eq!(detonate(&mut state, star, false), 1);
        let health = state.registry.enemy(tank).unwrap().health;
        assert_eq!(health, 20.0 - 6.0);
    }

    #[test]
    fn test_star_times_out() {
        let mut state = starcaller();
        let tank = enemy(&mut state, EnemyKind::Tank, Vec2::new(300.0, 0.0));
        let star = launch_star(&mut state, tank, Vec2::ZERO);
        state.registry.set_velocity(star, Vec2::ZERO);
        state.now_ms = 4999.0;
        steer_stars(&mut state);
        assert_eq!(state.registry.stars().len(), 1);
        state.now_ms = 5000.0;
        steer_stars(&mut state);
        assert!(state.registry.stars().is_empty());
        assert!(state.registry.is_consistent());
    }

    #[test]
    fn test_star_keeps_last_known_position() {
        let mut state = starcaller();
        let target = enemy(&mut state, EnemyKind::Normal, Vec2::new(300.0, 0.0));
        let star = launch_star(&mut state, target, Vec2::ZERO);
        let last_known = state.registry.enemy(target).unwrap().pos;
        state.registry.remove(target);
        steer_stars(&mut state);
        let s = state.registry.stars().iter().find(|s| s.id == star).unwrap();
        assert_eq!(s.target_pos, last_known);
        assert!(s.vel.x > 0.0);
    }
}
