//! Warden: pulsing melee damage aura
//!
//! No entity of its own; each pulse is a radius check around the player.

use super::{Ability, cooldown_ready};
use crate::sim::combat::{DamageOutcome, KillSource, damage_enemy};
use crate::sim::registry::EntityKind;
use crate::sim::spatial::within_range;
use crate::sim::state::{Archetype, GameState};
use crate::sim::status::knock_back_enemy;

#[derive(Debug, Default)]
pub struct AuraAbility {
    last_tick_ms: Option<f64>,
}

impl Ability for AuraAbility {
    fn archetype(&self) -> Archetype {
        Archetype::Warden
    }

    fn update(&mut self, state: &mut GameState, _dt: f32) {
        let player = &state.player;
        if !cooldown_ready(
            self.last_tick_ms,
            state.now_ms,
            player.stats.aura_cooldown_ms,
            player.status.cooldown_multiplier,
        ) {
            return;
        }
        self.last_tick_ms = Some(state.now_ms);
        pulse(state);
    }
}

/// Damage and push every enemy inside the aura; returns how many were hit
pub fn pulse(state: &mut GameState) -> usize {
    let center = state.player.pos;
    let stats = &state.player.stats;
    let (radius, damage, knockback) = (stats.aura_radius, stats.aura_damage, stats.aura_knockback);

    let hits = within_range(center, radius, state.registry.positions(EntityKind::Enemy));
    for &(id, _, _) in &hits {
        if let DamageOutcome::Survived { .. } = damage_enemy(state, id, damage, KillSource::Aura) {
            knock_back_enemy(state, id, center, knockback);
        }
    }
    hits.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::EntityInit;
    use crate::sim::state::{EnemyKind, RunPhase};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn warden_state() -> GameState {
        let mut state = GameState::new(21, Tuning::default());
        state.phase = RunPhase::Playing;
        state
    }

    #[test]
    fn test_scenario_aura_ticks_until_death() {
        let mut state = warden_state();
        let pos = state.player.pos + Vec2::new(30.0, 0.0);
        let stats = state.tuning.enemies.normal;
        assert_eq!(stats.health, 3.0);
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Normal,
            stats,
            pos,
        });

        let mut aura = AuraAbility::default();
        let cooldown = state.tuning.aura.cooldown_ms;

        // Two pulses of 0.8
        aura.update(&mut state, 0.016);
        state.now_ms += cooldown;
        aura.update(&mut state, 0.016);
        let health = state.registry.enemy(id).unwrap().health;
        assert!((health - 1.4).abs() < 1e-4);

        // Within the cooldown nothing happens
        state.now_ms += cooldown / 2.0;
        aura.update(&mut state, 0.016);
        let health = state.registry.enemy(id).unwrap().health;
        assert!((health - 1.4).abs() < 1e-4);

        // Keep pulsing until it drops
        let mut pulses = 2;
        while state.registry.enemy(id).is_some() {
            state.now_ms += cooldown;
            aura.update(&mut state, 0.016);
            pulses += 1;
            assert!(pulses <= 4);
        }
        assert_eq!(pulses, 4);
        assert_eq!(state.registry.pickups().len(), 1);
        assert!(state.registry.allies().is_empty());
        assert_eq!(state.registry.pickups()[0].pos, pos);
        assert_eq!(state.stats.kills, 1);
    }

    #[test]
    fn test_pulse_pushes_survivors_outward() {
        let mut state = warden_state();
        let stats = state.tuning.enemies.tank;
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Tank,
            stats,
            pos: state.player.pos + Vec2::new(0.0, -50.0),
        });
        assert_eq!(pulse(&mut state), 1);
        let enemy = state.registry.enemy(id).unwrap();
        assert!(enemy.vel.y < 0.0);
        assert!(enemy.knockback_until.is_some());
    }

    #[test]
    fn test_pulse_ignores_out_of_radius() {
        let mut state = warden_state();
        let stats = state.tuning.enemies.normal;
        state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Normal,
            stats,
            pos: state.player.pos + Vec2::new(200.0, 0.0),
        });
        assert_eq!(pulse(&mut state), 0);
    }
}
