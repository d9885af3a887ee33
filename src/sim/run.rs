//! Run state machine transitions
//!
//! ```text
//! CharacterSelect -> Playing <-> PausedForUpgrade
//!                    Playing <-> Paused
//!                    (any active) -> GameOver -> reset -> CharacterSelect
//! ```
//!
//! Ending a run (game over or reset) cancels every scheduled task and clears
//! every transient entity before the next phase is entered.

use super::ability::make_ability;
use super::progression::UpgradeDraft;
use super::schedule::TaskKind;
use super::state::{Archetype, GameEvent, GameState, Player, RunPhase, RunStats};
use crate::format_timer;

/// Leave character select with `archetype`
///
/// Returns false if not on the select screen or the archetype has no
/// profile.
pub fn start_run(state: &mut GameState, archetype: Archetype) -> bool {
    if state.phase != RunPhase::CharacterSelect {
        return false;
    }
    let Some(profile) = state.tuning.profile(archetype).cloned() else {
        return false;
    };

    state.scheduler.cancel_all();
    state.registry.clear();
    state.player = Player::for_profile(&state.tuning, &profile);
    state.registry.spawn_player(state.player.pos, state.player.radius);
    state.stats = RunStats::default();
    state.draft = UpgradeDraft::default();
    state.frozen_at_ms = None;

    let now_ms = state.now_ms;
    state
        .scheduler
        .every(now_ms, state.tuning.spawner.interval_ms, TaskKind::SpawnEnemy);
    state
        .scheduler
        .every(now_ms, state.tuning.player.regen_interval_ms, TaskKind::Regen);

    let mut ability = make_ability(profile.archetype);
    ability.on_start(state);
    state.ability = Some(ability);
    state.phase = RunPhase::Playing;

    log::info!("Run started as {} (seed {})", profile.name, state.seed);
    true
}

/// Start a run with the highlighted archetype
pub fn confirm_selection(state: &mut GameState) -> bool {
    let Some(archetype) = state
        .tuning
        .archetypes
        .get(state.select_index)
        .map(|p| p.archetype)
    else {
        return false;
    };
    start_run(state, archetype)
}

pub fn select_next(state: &mut GameState) {
    let n = state.tuning.archetypes.len().max(1);
    state.select_index = (state.select_index + 1) % n;
}

pub fn select_prev(state: &mut GameState) {
    let n = state.tuning.archetypes.len().max(1);
    state.select_index = (state.select_index + n - 1) % n;
}

/// `Playing <-> Paused`; ignored in every other phase
pub fn toggle_pause(state: &mut GameState) -> bool {
    match state.phase {
        RunPhase::Playing => {
            state.freeze(RunPhase::Paused);
            true
        }
        RunPhase::Paused => {
            state.resume();
            true
        }
        _ => false,
    }
}

/// End the run; terminal until reset
pub fn game_over(state: &mut GameState) {
    if matches!(state.phase, RunPhase::GameOver | RunPhase::CharacterSelect) {
        return;
    }
    let cancelled = state.scheduler.cancel_all();
    log::debug!("Game over: cancelled {} scheduled tasks", cancelled);
    state.registry.clear();
    state.ability = None;
    state.draft.clear();
    state.frozen_at_ms = None;
    state.phase = RunPhase::GameOver;
    state.emit(GameEvent::GameOver);

    log::info!(
        "Game over at level {} with {} kills after {}",
        state.player.level,
        state.stats.kills,
        format_timer(state.stats.run_time_ms)
    );
}

/// Clear everything and return to character select
///
/// Available from every phase except character select itself.
pub fn reset(state: &mut GameState) -> bool {
    if state.phase == RunPhase::CharacterSelect {
        return false;
    }
    let cancelled = state.scheduler.cancel_all();
    log::debug!("Reset: cancelled {} scheduled tasks", cancelled);
    state.registry.clear();
    state.ability = None;
    state.draft.clear();
    state.player = Player::new(&state.tuning);
    state.stats = RunStats::default();
    state.frozen_at_ms = None;
    state.select_index = 0;
    state.phase = RunPhase::CharacterSelect;
    log::info!("Run reset");
    true
}
