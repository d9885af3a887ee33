//! Screen layout shared by drawing and pointer hit-testing
//!
//! Everything is in arena units; the canvas backing store is sized to the
//! arena so no further transform is needed.

use glam::Vec2;

use crate::sim::EnemyKind;
use crate::sim::snapshot::EffectKind;

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn contains(&self, p: Vec2) -> bool {
        let max = self.min + self.size;
        p.x >= self.min.x && p.y >= self.min.y && p.x <= max.x && p.y <= max.y
    }

    pub fn center(&self) -> Vec2 {
        self.min + self.size / 2.0
    }
}

const CARD_SIZE: Vec2 = Vec2::new(300.0, 180.0);
const CARD_GAP: f32 = 30.0;

/// Card `index` of `count` side-by-side cards centered in the arena
///
/// Used for both the upgrade draft and the character select screen.
pub fn card_rect(arena: Vec2, index: usize, count: usize) -> Rect {
    let count = count.max(1) as f32;
    let row_width = count * CARD_SIZE.x + (count - 1.0) * CARD_GAP;
    let left = (arena.x - row_width) / 2.0;
    Rect {
        min: Vec2::new(
            left + index as f32 * (CARD_SIZE.x + CARD_GAP),
            (arena.y - CARD_SIZE.y) / 2.0,
        ),
        size: CARD_SIZE,
    }
}

/// Which card (if any) lies under `point`
pub fn card_at(arena: Vec2, count: usize, point: Vec2) -> Option<usize> {
    (0..count).find(|&i| card_rect(arena, i, count).contains(point))
}

/// Health bar above the top-left corner of the arena
pub fn health_bar() -> Rect {
    Rect {
        min: Vec2::new(20.0, 20.0),
        size: Vec2::new(240.0, 14.0),
    }
}

/// XP bar spanning the bottom edge
pub fn xp_bar(arena: Vec2) -> Rect {
    Rect {
        min: Vec2::new(0.0, arena.y - 8.0),
        size: Vec2::new(arena.x, 8.0),
    }
}

pub fn enemy_color(kind: EnemyKind) -> &'static str {
    match kind {
        EnemyKind::Normal => "#c0504d",
        EnemyKind::Shocker => "#f5d033",
        EnemyKind::Brute => "#d9822b",
        EnemyKind::Frost => "#6ec6f0",
        EnemyKind::Tank => "#7a7f8c",
        EnemyKind::Boss => "#a83fd6",
    }
}

/// Fill color and draw radius for effects
pub fn effect_style(kind: EffectKind) -> (&'static str, f32) {
    use crate::consts::{ALLY_RADIUS, BOLT_RADIUS, PICKUP_RADIUS, STAR_RADIUS};
    match kind {
        EffectKind::Bolt => ("#ffffff", BOLT_RADIUS),
        EffectKind::Star => ("#ffe680", STAR_RADIUS),
        EffectKind::Goose => ("#f2f2f2", 10.0),
        EffectKind::Ally => ("#9be89b", ALLY_RADIUS),
        EffectKind::Pickup => ("#4fd1c5", PICKUP_RADIUS),
    }
}
