//! Basic auto-shot every archetype carries

use super::cooldown_ready;
use crate::sim::registry::{EntityId, EntityInit, EntityKind};
use crate::sim::spatial::{direction, nearest, within_range};
use crate::sim::state::{GameEvent, GameState};

/// Fire one bolt at the nearest enemy in range if the cooldown allows
pub fn fire_bolt(state: &mut GameState) -> Option<EntityId> {
    let now_ms = state.now_ms;
    let player = &state.player;
    let stats = &player.stats;
    let multiplier = player.status.cooldown_multiplier;
    if !cooldown_ready(player.last_bolt_ms, now_ms, stats.bolt_cooldown_ms, multiplier) {
        return None;
    }

    let enemies = state.registry.positions(EntityKind::Enemy);
    let in_range = within_range(player.pos, stats.bolt_range, enemies);
    let (_, target) = nearest(player.pos, in_range.into_iter().map(|(id, pos, _)| (id, pos)))?;

    let vel = direction(player.pos, target) * stats.bolt_speed;
    let init = EntityInit::Bolt {
        pos: player.pos,
        vel,
        damage: stats.bolt_damage,
        now_ms,
    };
    state.player.last_bolt_ms = Some(now_ms);
    let id = state.registry.spawn(init);
    state.emit(GameEvent::ShotFired);
    Some(id)
}
