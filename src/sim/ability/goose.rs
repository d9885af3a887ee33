//! Gooseherd: orbiting geese and converted allies

use std::f32::consts::TAU;

use glam::Vec2;

use super::Ability;
use crate::sim::combat::{DamageOutcome, KillSource, damage_enemy};
use crate::sim::registry::{EntityId, EntityKind};
use crate::sim::spatial::{direction, nearest, within_range};
use crate::sim::state::{Archetype, Companion, GameState};
use crate::sim::status::knock_back_enemy;
use crate::unit_at;

#[derive(Debug, Default)]
pub struct GooseAbility;

impl Ability for GooseAbility {
    fn archetype(&self) -> Archetype {
        Archetype::Gooseherd
    }

    fn on_start(&mut self, state: &mut GameState) {
        respace(state, 0.0);
    }

    fn update(&mut self, state: &mut GameState, dt: f32) {
        if state.registry.companions.len() != state.player.stats.goose_count as usize {
            let phase = state.registry.companions.first().map_or(0.0, |c| c.angle);
            respace(state, phase);
        }
        orbit(state, dt);
        goose_contacts(state);
        update_allies(state);
    }
}

/// Lay the slots out at even angular spacing starting from `phase`
pub fn respace(state: &mut GameState, phase: f32) {
    let count = state.player.stats.goose_count;
    let radius = state.tuning.goose.orbit_radius;
    let center = state.player.pos;
    state.registry.companions = (0..count)
        .map(|slot| {
            let angle = (phase + TAU * slot as f32 / count as f32).rem_euclid(TAU);
            Companion {
                slot,
                angle,
                pos: center + unit_at(angle) * radius,
            }
        })
        .collect();
}

/// Advance every slot
///
/// Angular speed is `base × speed multiplier ÷ cooldown multiplier`, with
/// the orbit-speed upgrade as an extra factor.
pub fn orbit(state: &mut GameState, dt: f32) {
    let status = &state.player.status;
    let speed = state.tuning.goose.base_orbit_speed
        * state.player.stats.goose_orbit_speed
        * status.speed_multiplier
        / status.cooldown_multiplier.max(0.01);
    let radius = state.tuning.goose.orbit_radius;
    let center = state.player.pos;
    for c in &mut state.registry.companions {
        c.angle = (c.angle + speed * dt).rem_euclid(TAU);
        c.pos = center + unit_at(c.angle) * radius;
    }
}

/// Continuous contact damage from every slot
pub fn goose_contacts(state: &mut GameState) {
    let contact_radius = state.tuning.goose.contact_radius;
    let damage = state.player.stats.goose_damage;
    let knockback = state.player.stats.goose_knockback;
    let slots: Vec<Vec2> = state.registry.companions.iter().map(|c| c.pos).collect();
    for slot in slots {
        let hits = within_range(slot, contact_radius, state.registry.positions(EntityKind::Enemy));
        for (id, _, _) in hits {
            let outcome = damage_enemy(state, id, damage, KillSource::Goose);
            if let DamageOutcome::Survived { .. } = outcome {
                knock_back_enemy(state, id, slot, knockback);
            }
        }
    }
}

/// Allies chase the nearest enemy and expire after their lifetime
pub fn update_allies(state: &mut GameState) {
    let now_ms = state.now_ms;
    let speed = state.tuning.goose.ally_speed;
    let enemies = state.registry.positions(EntityKind::Enemy);

    let mut expired: Vec<EntityId> = Vec::new();
    let mut steering: Vec<(EntityId, Vec2)> = Vec::new();
    for ally in state.registry.allies() {
        if now_ms >= ally.expires_ms {
            expired.push(ally.id);
            continue;
        }
        let vel = nearest(ally.pos, enemies.iter().copied())
            .map_or(Vec2::ZERO, |(_, target)| direction(ally.pos, target) * speed);
        steering.push((ally.id, vel));
    }
    for id in expired {
        state.registry.remove(id);
    }
    for (id, vel) in steering {
        state.registry.set_velocity(id, vel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::EntityInit;
    use crate::sim::state::{EnemyKind, RunPhase};
    use crate::tuning::Tuning;

    fn gooseherd() -> GameState {
        let mut state = GameState::new(4, Tuning::default());
        state.phase = RunPhase::Playing;
        state
    }

    #[test]
    fn test_slots_evenly_spaced() {
        let mut state = gooseherd();
        GooseAbility.on_start(&mut state);
        let slots = &state.registry.companions;
        assert_eq!(slots.len(), 3);
        let gap = TAU / 3.0;
        assert!((slots[1].angle - slots[0].angle - gap).abs() < 1e-4);
        for c in slots {
            assert!((c.pos.distance(state.player.pos) - 72.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_orbit_slowed_by_cooldown_penalty() {
        let mut state = gooseherd();
        respace(&mut state, 0.0);
        orbit(&mut state, 0.1);
        let normal = state.registry.companions[0].angle;

        respace(&mut state, 0.0);
        state.player.status.cooldown_multiplier = 2.0;
        orbit(&mut state, 0.1);
        let slowed = state.registry.companions[0].angle;
        assert!((normal - 0.26).abs() < 1e-4);
        assert!((slowed - 0.13).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_slowed_by_speed_multiplier() {
        let mut state = gooseherd();
        respace(&mut state, 0.0);
        state.player.status.speed_multiplier = 0.5;
        orbit(&mut state, 0.1);
        assert!((state.registry.companions[0].angle - 0.13).abs() < 1e-4);

        // Both terms of a full slow aura apply together
        respace(&mut state, 0.0);
        state.player.status.cooldown_multiplier = 2.0;
        orbit(&mut state, 0.1);
        assert!((state.registry.companions[0].angle - 0.065).abs() < 1e-4);
    }

    #[test]
    fn test_orbit_speed_upgrade_is_extra_factor() {
        let mut state = gooseherd();
        respace(&mut state, 0.0);
        state.player.stats.goose_orbit_speed *= 1.5;
        state.player.status.speed_multiplier = 0.5;
        orbit(&mut state, 0.1);
        assert!((state.registry.companions[0].angle - 0.195).abs() < 1e-4);
    }

    #[test]
    fn test_count_upgrade_respaces() {
        let mut state = gooseherd();
        let mut ability = GooseAbility;
        ability.on_start(&mut state);
        state.player.stats.goose_count = 5;
        ability.update(&mut state, 0.0);
        assert_eq!(state.registry.companions.len(), 5);
    }

    #[test]
    fn test_goose_kill_becomes_ally_and_ally_expires() {
        let mut state = gooseherd();
        state.now_ms = 100.0;
        respace(&mut state, 0.0);
        let slot = state.registry.companions[0].pos;
        let mut stats = state.tuning.enemies.normal;
        stats.health = 0.1;
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Normal,
            stats,
            pos: slot,
        });
        goose_contacts(&mut state);
        assert!(state.registry.enemy(id).is_none());
        assert_eq!(state.registry.allies().len(), 1);
        assert!(state.registry.pickups().is_empty());

        state.now_ms = 100.0 + state.tuning.goose.ally_lifetime_ms;
        update_allies(&mut state);
        assert!(state.registry.allies().is_empty());
        assert!(state.registry.is_consistent());
    }

    #[test]
    fn test_contact_is_continuous() {
        let mut state = gooseherd();
        respace(&mut state, 0.0);
        let slot = state.registry.companions[0].pos;
        let stats = state.tuning.enemies.tank;
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Tank,
            stats,
            pos: slot,
        });
        goose_contacts(&mut state);
        goose_contacts(&mut state);
        let health = state.registry.enemy(id).unwrap().health;
        assert!((health - (20.0 - 2.0 * 0.12)).abs() < 1e-4);
    }
}
