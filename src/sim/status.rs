//! Status effects and derived modifiers
//!
//! Every timed effect is an end timestamp compared against the tick clock.
//! Expired effects are cleared by [`StatusEffects::decay`] at the start of
//! the tick, before movement reads them.

use glam::Vec2;

use super::registry::EntityId;
use super::state::{EnemyKind, GameState};
use super::spatial::{direction, distance};

/// Timed effects and live multipliers on the player
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffects {
    pub stunned_until: Option<f64>,
    pub knockback_until: Option<f64>,
    pub knockback_velocity: Vec2,
    pub invincible_until: Option<f64>,
    /// Applied to movement speed (1.0 = unaffected)
    pub speed_multiplier: f32,
    /// Applied to every ability cooldown (1.0 = unaffected)
    pub cooldown_multiplier: f32,
}

impl Default for StatusEffects {
    fn default() -> Self {
        Self {
            stunned_until: None,
            knockback_until: None,
            knockback_velocity: Vec2::ZERO,
            invincible_until: None,
            speed_multiplier: 1.0,
            cooldown_multiplier: 1.0,
        }
    }
}

fn active(until: Option<f64>, now_ms: f64) -> bool {
    until.is_some_and(|t| now_ms < t)
}

impl StatusEffects {
    /// Drop every effect whose end timestamp has been reached
    pub fn decay(&mut self, now_ms: f64) {
        if !active(self.stunned_until, now_ms) {
            self.stunned_until = None;
        }
        if !active(self.knockback_until, now_ms) {
            self.knockback_until = None;
            self.knockback_velocity = Vec2::ZERO;
        }
        if !active(self.invincible_until, now_ms) {
            self.invincible_until = None;
        }
    }

    pub fn is_stunned(&self, now_ms: f64) -> bool {
        active(self.stunned_until, now_ms)
    }

    pub fn is_knocked_back(&self, now_ms: f64) -> bool {
        active(self.knockback_until, now_ms)
    }

    pub fn is_invincible(&self, now_ms: f64) -> bool {
        active(self.invincible_until, now_ms)
    }

    /// Hard stun; a longer running stun is never shortened
    pub fn stun(&mut self, now_ms: f64, duration_ms: f64) {
        let until = now_ms + duration_ms;
        self.stunned_until = Some(self.stunned_until.map_or(until, |t| t.max(until)));
    }

    pub fn knock_back(&mut self, now_ms: f64, velocity: Vec2, duration_ms: f64) {
        self.knockback_until = Some(now_ms + duration_ms);
        self.knockback_velocity = velocity;
    }

    pub fn grant_invincibility(&mut self, now_ms: f64, duration_ms: f64) {
        self.invincible_until = Some(now_ms + duration_ms);
    }
}

/// Proximity strength of a slow aura: 1 at the source, 0 at `radius`
pub fn slow_strength(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / radius).clamp(0.0, 1.0)
}

/// Re-derive the player's speed and cooldown multipliers from live Frost
/// elites. Multiple sources never stack: the most punishing value wins.
pub fn recompute_modifiers(state: &mut GameState) {
    let tuning = &state.tuning.status;
    let player_pos = state.player.pos;
    let (speed, cooldown) = state
        .registry
        .enemies()
        .iter()
        .filter(|e| e.kind == EnemyKind::Frost)
        .map(|e| slow_strength(distance(e.pos, player_pos), tuning.slow_aura_radius))
        .fold((1.0_f32, 1.0_f32), |(speed, cooldown), s| {
            let s_speed = 1.0 + (tuning.slow_full_speed_multiplier - 1.0) * s;
            let s_cooldown = 1.0 + (tuning.slow_full_cooldown_multiplier - 1.0) * s;
            (speed.min(s_speed), cooldown.max(s_cooldown))
        });
    state.player.status.speed_multiplier = speed;
    state.player.status.cooldown_multiplier = cooldown;
}

/// Flee-instead-of-chase until `now_ms + duration_ms`
pub fn confuse_enemy(state: &mut GameState, id: EntityId, duration_ms: f64) {
    let until = state.now_ms + duration_ms;
    if let Some(enemy) = state.registry.enemy_mut(id) {
        enemy.confused_until = Some(enemy.confused_until.map_or(until, |t| t.max(until)));
    }
}

/// Shove an enemy `distance` units away from `from` over the enemy
/// knockback window; chase steering is suspended meanwhile
pub fn knock_back_enemy(state: &mut GameState, id: EntityId, from: Vec2, distance: f32) {
    let window_ms = state.tuning.status.enemy_knockback_ms;
    let now_ms = state.now_ms;
    let Some(enemy) = state.registry.enemy_mut(id) else {
        return;
    };
    let mut dir = direction(from, enemy.pos);
    if dir == Vec2::ZERO {
        dir = Vec2::X;
    }
    enemy.knockback_until = Some(now_ms + window_ms);
    let vel = dir * distance / (window_ms as f32 / 1000.0).max(0.001);
    state.registry.set_velocity(id, vel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::registry::EntityInit;
    use crate::tuning::Tuning;

    #[test]
    fn test_stun_clears_exactly_at_expiry() {
        let mut s = StatusEffects::default();
        s.stun(1000.0, 700.0);
        s.decay(1699.0);
        assert!(s.is_stunned(1699.0));
        s.decay(1700.0);
        assert!(!s.is_stunned(1700.0));
        assert!(s.stunned_until.is_none());
    }

    #[test]
    fn test_stun_not_shortened() {
        let mut s = StatusEffects::default();
        s.stun(0.0, 1000.0);
        s.stun(100.0, 200.0);
        assert_eq!(s.stunned_until, Some(1000.0));
    }

    #[test]
    fn test_knockback_decay_zeroes_velocity() {
        let mut s = StatusEffects::default();
        s.knock_back(0.0, Vec2::new(300.0, 0.0), 180.0);
        assert!(s.is_knocked_back(100.0));
        s.decay(180.0);
        assert_eq!(s.knockback_velocity, Vec2::ZERO);
    }

    #[test]
    fn test_slow_strength_interpolates() {
        assert_eq!(slow_strength(0.0, 200.0), 1.0);
        assert_eq!(slow_strength(100.0, 200.0), 0.5);
        assert_eq!(slow_strength(300.0, 200.0), 0.0);
    }

    fn frost_at(state: &mut GameState, pos: Vec2) -> EntityId {
        let stats = state.tuning.enemies.frost;
        state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Frost,
            stats,
            pos,
        })
    }

    #[test]
    fn test_multiple_frost_sources_take_max_not_sum() {
        let mut state = GameState::new(1, Tuning::default());
        let p = state.player.pos;
        // Half strength and quarter strength
        frost_at(&mut state, p + Vec2::new(110.0, 0.0));
        frost_at(&mut state, p + Vec2::new(-165.0, 0.0));
        recompute_modifiers(&mut state);
        let status = &state.player.status;
        assert!((status.speed_multiplier - 0.75).abs() < 1e-4);
        assert!((status.cooldown_multiplier - 1.3).abs() < 1e-4);
    }

    #[test]
    fn test_modifiers_reset_without_sources() {
        let mut state = GameState::new(1, Tuning::default());
        state.player.status.speed_multiplier = 0.5;
        state.player.status.cooldown_multiplier = 1.6;
        recompute_modifiers(&mut state);
        assert_eq!(state.player.status.speed_multiplier, 1.0);
        assert_eq!(state.player.status.cooldown_multiplier, 1.0);
    }

    #[test]
    fn test_enemy_knockback_sets_window() {
        let mut state = GameState::new(1, Tuning::default());
        state.now_ms = 1000.0;
        let id = state.registry.spawn(EntityInit::Enemy {
            kind: EnemyKind::Normal,
            stats: state.tuning.enemies.normal,
            pos: Vec2::new(100.0, 0.0),
        });
        knock_back_enemy(&mut state, id, Vec2::ZERO, 30.0);
        let enemy = state.registry.enemy(id).unwrap();
        assert_eq!(enemy.knockback_until, Some(1150.0));
        assert!(enemy.vel.x > 0.0);
        assert_eq!(enemy.vel.y, 0.0);
    }
}
