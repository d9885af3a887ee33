//! Collision resolution
//!
//! Turns the physics step's collision-start pairs into game effects. Each
//! pair is ordered by label and matched against a fixed table; pairs whose
//! bodies were removed earlier in the same batch resolve to nothing.

use glam::Vec2;

use super::ability::starfall;
use super::combat::{KillSource, damage_enemy};
use super::physics::{BodyLabel, CollisionPair, Contact};
use super::progression::grant_xp;
use super::registry::{BodyOwner, EntityId};
use super::run;
use super::spatial::direction;
use super::state::{GameEvent, GameState, OnHitEffect, RunPhase};

/// Resolve a batch of pairs in order
///
/// Processing stops early only if the run ends mid-batch.
pub fn resolve(state: &mut GameState, pairs: &[CollisionPair]) {
    for pair in pairs {
        if state.phase == RunPhase::GameOver {
            break;
        }
        resolve_pair(state, pair);
    }
}

fn entity(state: &GameState, contact: Contact) -> Option<EntityId> {
    match state.registry.owner_of(contact.body)? {
        BodyOwner::Entity(_, id) => Some(id),
        BodyOwner::Player => None,
    }
}

fn is_player(state: &GameState, contact: Contact) -> bool {
    state.registry.owner_of(contact.body) == Some(BodyOwner::Player)
}

/// Dispatch one pair
pub fn resolve_pair(state: &mut GameState, pair: &CollisionPair) {
    let (a, b) = if pair.a.label <= pair.b.label {
        (pair.a, pair.b)
    } else {
        (pair.b, pair.a)
    };

    match (a.label, b.label) {
        (BodyLabel::Player, BodyLabel::Enemy) => {
            if let (true, Some(enemy)) = (is_player(state, a), entity(state, b)) {
                player_hit(state, enemy);
            }
        }
        (BodyLabel::Player, BodyLabel::Pickup) => {
            if let (true, Some(pickup)) = (is_player(state, a), entity(state, b)) {
                collect_pickup(state, pickup);
            }
        }
        (BodyLabel::Enemy, BodyLabel::Projectile) => {
            if let (Some(enemy), Some(bolt)) = (entity(state, a), entity(state, b)) {
                bolt_hit(state, enemy, bolt);
            }
        }
        (BodyLabel::Enemy, BodyLabel::Starfall) => {
            if let (Some(_), Some(star)) = (entity(state, a), entity(state, b)) {
                starfall::detonate(state, star, false);
            }
        }
        (BodyLabel::Enemy, BodyLabel::Ally) => {
            if let (Some(enemy), Some(ally)) = (entity(state, a), entity(state, b)) {
                ally_strike(state, enemy, ally);
            }
        }
        _ => {}
    }
}

/// Enemy contact damage, on-hit effect and invincibility window
pub fn player_hit(state: &mut GameState, enemy: EntityId) {
    let now_ms = state.now_ms;
    if state.player.status.is_invincible(now_ms) {
        return;
    }
    let Some(e) = state.registry.enemy(enemy) else {
        return;
    };
    let (kind, contact_damage, enemy_pos) = (e.kind, e.contact_damage, e.pos);

    let status = &state.tuning.status;
    let rally = if state.boss_alive() {
        status.boss_rally_damage_multiplier
    } else {
        1.0
    };
    let (stun_ms, push_distance, push_ms) = (
        status.stun_ms,
        status.player_knockback_distance,
        status.player_knockback_ms,
    );

    let dealt = state.player.apply_damage(contact_damage * rally);
    state
        .player
        .status
        .grant_invincibility(now_ms, state.tuning.player.invincibility_ms);
    state.emit(GameEvent::PlayerHit { damage: dealt });

    match kind.on_hit() {
        OnHitEffect::Stun => state.player.status.stun(now_ms, stun_ms),
        OnHitEffect::Knockback => {
            let mut dir = direction(enemy_pos, state.player.pos);
            if dir == Vec2::ZERO {
                dir = Vec2::Y;
            }
            let vel = dir * push_distance / (push_ms as f32 / 1000.0).max(0.001);
            state.player.status.knock_back(now_ms, vel, push_ms);
        }
        OnHitEffect::None => {}
    }

    if state.player.is_dead() {
        run::game_over(state);
    }
}

fn bolt_hit(state: &mut GameState, enemy: EntityId, bolt: EntityId) {
    let Some(damage) = state.registry.bolt(bolt).map(|b| b.damage) else {
        return;
    };
    state.registry.remove(bolt);
    damage_enemy(state, enemy, damage, KillSource::Bolt);
}

fn ally_strike(state: &mut GameState, enemy: EntityId, ally: EntityId) {
    let Some(damage) = state.registry.ally(ally).map(|a| a.damage) else {
        return;
    };
    state.registry.remove(ally);
    damage_enemy(state, enemy, damage, KillSource::Ally);
}

fn collect_pickup(state: &mut GameState, pickup: EntityId) {
    let Some(xp) = state.registry.pickup(pickup).map(|p| p.xp) else {
        return;
    };
    state.registry.remove(pickup);
    state.emit(GameEvent::PickupCollected { xp });
    grant_xp(state, xp);
}
