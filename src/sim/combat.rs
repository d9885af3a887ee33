//! Damage application and the shared death path
//!
//! Every damage source (bolts, auras, detonations, geese, allies) funnels
//! through [`damage_enemy`], so death rewards are handed out in one place.

use super::registry::{EntityId, EntityInit};
use super::state::{EnemyKind, GameEvent, GameState};

/// Where the killing blow came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSource {
    Bolt,
    Aura,
    Starfall,
    /// Orbiting goose; converts the kill into an ally
    Goose,
    Ally,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Enemy was already gone
    Missing,
    Survived { health: f32 },
    Killed,
}

/// Apply `amount` damage; lethal hits run the death path
pub fn damage_enemy(
    state: &mut GameState,
    id: EntityId,
    amount: f32,
    source: KillSource,
) -> DamageOutcome {
    let Some(enemy) = state.registry.enemy_mut(id) else {
        return DamageOutcome::Missing;
    };
    enemy.health -= amount.max(0.0);
    let health = enemy.health;
    if health > 0.0 {
        return DamageOutcome::Survived { health };
    }
    if kill_enemy(state, id, source) {
        DamageOutcome::Killed
    } else {
        DamageOutcome::Missing
    }
}

/// Remove a dead enemy and drop its reward
///
/// Idempotent: a second call for the same id finds nothing and does
/// nothing. Returns whether this call performed the kill.
pub fn kill_enemy(state: &mut GameState, id: EntityId, source: KillSource) -> bool {
    let Some(enemy) = state.registry.enemy(id) else {
        return false;
    };
    let kind = enemy.kind;
    let xp = enemy.xp_reward;
    let Some(removed) = state.registry.remove(id) else {
        return false;
    };

    state.stats.kills += 1;
    if kind == EnemyKind::Boss {
        state.stats.bosses_defeated += 1;
        log::info!("Boss defeated ({} total)", state.stats.bosses_defeated);
    }

    let reward = match source {
        KillSource::Goose => EntityInit::Ally {
            pos: removed.pos,
            damage: state.tuning.goose.ally_damage,
            now_ms: state.now_ms,
            lifetime_ms: state.tuning.goose.ally_lifetime_ms,
        },
        _ => EntityInit::Pickup { pos: removed.pos, xp },
    };
    state.registry.spawn(reward);
    state.emit(GameEvent::EnemyDied { kind });
    true
}
