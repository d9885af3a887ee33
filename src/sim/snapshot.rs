//! Read-only render data
//!
//! The draw layer reads only this: no pixels, no text layout.

use glam::Vec2;
use serde::Serialize;

use super::state::{Archetype, EnemyKind, GameState, RunPhase};
use crate::format_timer;

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub health_fraction: f32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub level: u32,
    pub archetype: Option<Archetype>,
    pub stunned: bool,
    pub invincible: bool,
    pub knocked_back: bool,
    pub slowed: bool,
    /// Warden pulse radius, for drawing the ring
    pub aura_radius: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnemyView {
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub visual_scale: f32,
    pub confused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EffectKind {
    Bolt,
    Star,
    Goose,
    Ally,
    Pickup,
}

/// Transient ability entity or pickup
#[derive(Debug, Clone, Serialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub pos: Vec2,
    /// Time since creation; zero for entities without a birth time
    pub age_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderSnapshot {
    pub phase: RunPhase,
    pub arena: Vec2,
    pub player: PlayerView,
    pub enemies: Vec<EnemyView>,
    pub effects: Vec<EffectView>,
    pub offers: Vec<OfferView>,
    pub highlighted_offer: usize,
    pub characters: Vec<String>,
    pub selected_character: usize,
    /// `mm:ss` survival time
    pub timer: String,
    pub kills: u32,
    pub bosses_defeated: u32,
    pub boss_alive: bool,
}

impl RenderSnapshot {
    pub fn is_frozen(&self) -> bool {
        self.phase != RunPhase::Playing
    }
}

/// Capture everything the draw layer needs this frame
pub fn snapshot(state: &GameState) -> RenderSnapshot {
    let now_ms = state.now_ms;
    let p = &state.player;
    let player = PlayerView {
        pos: p.pos,
        radius: p.radius,
        health: p.health,
        max_health: p.max_health,
        health_fraction: p.health_fraction(),
        xp: p.xp,
        xp_to_next: p.xp_to_next,
        level: p.level,
        archetype: p.archetype,
        stunned: p.status.is_stunned(now_ms),
        invincible: p.status.is_invincible(now_ms),
        knocked_back: p.status.is_knocked_back(now_ms),
        slowed: p.status.speed_multiplier < 1.0,
        aura_radius: (p.archetype == Some(Archetype::Warden) && state.phase != RunPhase::GameOver)
            .then_some(p.stats.aura_radius),
    };

    let enemies = state
        .registry
        .enemies()
        .iter()
        .map(|e| EnemyView {
            kind: e.kind,
            pos: e.pos,
            radius: e.radius,
            health: e.health,
            max_health: e.max_health,
            visual_scale: e.visual_scale,
            confused: e.confused_until.is_some_and(|t| now_ms < t),
        })
        .collect();

    let reg = &state.registry;
    let effect = |kind, pos, born: Option<f64>| EffectView {
        kind,
        pos,
        age_ms: born.map_or(0.0, |t| (now_ms - t).max(0.0)),
    };
    let effects = reg
        .bolts()
        .iter()
        .map(|b| effect(EffectKind::Bolt, b.pos, Some(b.created_ms)))
        .chain(reg.stars().iter().map(|s| effect(EffectKind::Star, s.pos, Some(s.created_ms))))
        .chain(reg.companions.iter().map(|c| effect(EffectKind::Goose, c.pos, None)))
        .chain(reg.allies().iter().map(|a| effect(EffectKind::Ally, a.pos, Some(a.created_ms))))
        .chain(reg.pickups().iter().map(|o| effect(EffectKind::Pickup, o.pos, None)))
        .collect();

    let offers = state
        .draft
        .offers
        .iter()
        .filter_map(|&i| state.tuning.upgrades.get(i))
        .map(|u| OfferView {
            name: u.name.clone(),
            description: u.description.clone(),
        })
        .collect();

    RenderSnapshot {
        phase: state.phase,
        arena: Vec2::new(state.tuning.arena.width, state.tuning.arena.height),
        player,
        enemies,
        effects,
        offers,
        highlighted_offer: state.draft.highlighted,
        characters: state.tuning.archetypes.iter().map(|a| a.name.clone()).collect(),
        selected_character: state.select_index,
        timer: format_timer(state.stats.run_time_ms),
        kills: state.stats.kills,
        bosses_defeated: state.stats.bosses_defeated,
        boss_alive: state.boss_alive(),
    }
}
