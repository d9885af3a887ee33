//! Ability engine
//!
//! One strategy per archetype, chosen at character select and driven from
//! the tick loop while playing. Every archetype also carries the basic
//! auto-shot in [`bolt`].

pub mod aura;
pub mod bolt;
pub mod goose;
pub mod starfall;

use std::fmt::Debug;

use super::state::{Archetype, GameState};

pub use aura::AuraAbility;
pub use goose::GooseAbility;
pub use starfall::StarfallAbility;

/// Per-archetype ability state machine
pub trait Ability: Debug {
    fn archetype(&self) -> Archetype;

    /// Called once when the run starts
    fn on_start(&mut self, _state: &mut GameState) {}

    /// Called every simulated tick while playing
    fn update(&mut self, state: &mut GameState, dt: f32);
}

/// Fresh strategy for `archetype`
pub fn make_ability(archetype: Archetype) -> Box<dyn Ability> {
    match archetype {
        Archetype::Warden => Box::new(AuraAbility::default()),
        Archetype::Starcaller => Box::new(StarfallAbility::default()),
        Archetype::Gooseherd => Box::new(GooseAbility::default()),
    }
}

/// Cooldown gate shared by every ability: ready when never used or when
/// `cooldown_ms` scaled by the live cooldown multiplier has elapsed
#[inline]
pub fn cooldown_ready(
    last_ms: Option<f64>,
    now_ms: f64,
    cooldown_ms: f64,
    multiplier: f32,
) -> bool {
    last_ms.is_none_or(|last| now_ms - last >= cooldown_ms * multiplier as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_ability_matches_archetype() {
        for archetype in Archetype::ALL {
            assert_eq!(make_ability(archetype).archetype(), archetype);
        }
    }

    #[test]
    fn test_cooldown_multiplier_stretches_gate() {
        assert!(cooldown_ready(None, 0.0, 500.0, 1.0));
        assert!(cooldown_ready(Some(0.0), 500.0, 500.0, 1.0));
        assert!(!cooldown_ready(Some(0.0), 500.0, 500.0, 1.6));
        assert!(cooldown_ready(Some(0.0), 800.0, 500.0, 1.6));
    }
}
