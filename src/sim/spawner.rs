//! Enemy spawner and type classifier

use glam::Vec2;
use rand::Rng;

use super::registry::{EntityId, EntityInit};
use super::state::{EnemyKind, GameState, RunPhase};
use crate::tuning::SpawnerTuning;

/// Pick the type of the next enemy for `level`
///
/// Priority: every spawn on a positive multiple of the boss interval is a
/// boss; even levels from 2 up roll for a uniformly chosen elite; everything
/// else is normal.
pub fn choose_enemy_kind<R: Rng>(rng: &mut R, level: u32, tuning: &SpawnerTuning) -> EnemyKind {
    if level > 0 && level % tuning.boss_interval.max(1) == 0 {
        return EnemyKind::Boss;
    }
    if level >= 2 && level % 2 == 0 && rng.random_bool(tuning.elite_chance.clamp(0.0, 1.0)) {
        let i = rng.random_range(0..EnemyKind::ELITES.len());
        return EnemyKind::ELITES[i];
    }
    EnemyKind::Normal
}

/// Uniform point on a uniformly chosen arena edge, pulled `inset` units
/// inside the boundary and away from the corners
pub fn edge_position<R: Rng>(rng: &mut R, width: f32, height: f32, inset: f32) -> Vec2 {
    let along = |rng: &mut R, len: f32| {
        let (lo, hi) = (inset, len - inset);
        if hi <= lo { len / 2.0 } else { rng.random_range(lo..hi) }
    };
    let inset_x = inset.min(width / 2.0);
    let inset_y = inset.min(height / 2.0);
    match rng.random_range(0..4u8) {
        0 => Vec2::new(along(rng, width), inset_y),
        1 => Vec2::new(width - inset_x, along(rng, height)),
        2 => Vec2::new(along(rng, width), height - inset_y),
        _ => Vec2::new(inset_x, along(rng, height)),
    }
}

/// Spawn one enemy if the run is live
pub fn spawn_one(state: &mut GameState) -> Option<EntityId> {
    if state.phase != RunPhase::Playing {
        return None;
    }
    let level = state.player.level;
    let kind = choose_enemy_kind(&mut state.rng, level, &state.tuning.spawner);
    let stats = *state.tuning.enemies.get(kind);
    let pos = edge_position(
        &mut state.rng,
        state.tuning.arena.width,
        state.tuning.arena.height,
        stats.radius * 3.0,
    );
    let id = state.registry.spawn(EntityInit::Enemy { kind, stats, pos });

    if kind == EnemyKind::Boss {
        log::info!("Boss spawned at level {}", level);
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_level_one_always_normal() {
        let mut rng = Pcg32::seed_from_u64(9);
        let tuning = SpawnerTuning {
            elite_chance: 1.0,
            ..SpawnerTuning::default()
        };
        for _ in 0..100 {
            assert_eq!(choose_enemy_kind(&mut rng, 1, &tuning), EnemyKind::Normal);
            // Odd levels never roll elites
            assert_eq!(choose_enemy_kind(&mut rng, 3, &tuning), EnemyKind::Normal);
        }
    }

    #[test]
    fn test_boss_forced_on_every_boss_level_spawn() {
        let mut rng = Pcg32::seed_from_u64(9);
        let tuning = SpawnerTuning {
            elite_chance: 1.0,
            ..SpawnerTuning::default()
        };
        for _ in 0..20 {
            assert_eq!(choose_enemy_kind(&mut rng, 7, &tuning), EnemyKind::Boss);
            // Boss outranks the even-level elite roll
            assert_eq!(choose_enemy_kind(&mut rng, 14, &tuning), EnemyKind::Boss);
        }
        assert_ne!(choose_enemy_kind(&mut rng, 0, &tuning), EnemyKind::Boss);
        assert_ne!(choose_enemy_kind(&mut rng, 8, &tuning), EnemyKind::Boss);
    }

    #[test]
    fn test_even_level_elites() {
        let mut rng = Pcg32::seed_from_u64(9);
        let always = SpawnerTuning {
            elite_chance: 1.0,
            ..SpawnerTuning::default()
        };
        let never = SpawnerTuning {
            elite_chance: 0.0,
            ..SpawnerTuning::default()
        };
        for _ in 0..50 {
            assert!(choose_enemy_kind(&mut rng, 4, &always).is_elite());
            assert_eq!(choose_enemy_kind(&mut rng, 4, &never), EnemyKind::Normal);
        }
    }

    #[test]
    fn test_edge_position_inset() {
        let mut rng = Pcg32::seed_from_u64(11);
        for _ in 0..200 {
            let p = edge_position(&mut rng, 1280.0, 720.0, 42.0);
            assert!(p.x >= 42.0 && p.x <= 1280.0 - 42.0);
            assert!(p.y >= 42.0 && p.y <= 720.0 - 42.0);
            let on_edge = p.x == 42.0 || p.y == 42.0 || p.x == 1238.0 || p.y == 678.0;
            assert!(on_edge);
        }
    }

    #[test]
    fn test_edge_position_degenerate_arena() {
        let mut rng = Pcg32::seed_from_u64(11);
        let p = edge_position(&mut rng, 50.0, 50.0, 120.0);
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn test_spawn_only_while_playing() {
        let mut state = GameState::new(5, Tuning::default());
        assert!(spawn_one(&mut state).is_none());
        state.phase = RunPhase::Paused;
        assert!(spawn_one(&mut state).is_none());
        state.phase = RunPhase::Playing;
        let id = spawn_one(&mut state).unwrap();
        assert!(state.registry.enemy(id).is_some());
        assert!(state.registry.is_consistent());
    }

    #[test]
    fn test_boss_level_spawns_only_bosses() {
        let mut state = GameState::new(5, Tuning::default());
        state.phase = RunPhase::Playing;
        state.player.level = 7;
        for _ in 0..4 {
            spawn_one(&mut state);
        }
        assert!(state.boss_alive());
        let kinds: Vec<_> = state.registry.enemies().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EnemyKind::Boss; 4]);

        state.player.level = 8;
        let id = spawn_one(&mut state).unwrap();
        assert_ne!(state.registry.enemy(id).unwrap().kind, EnemyKind::Boss);
    }
}
