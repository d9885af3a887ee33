//! XP, level-ups and the upgrade draft

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Archetype, GameEvent, GameState, Player, RunPhase};
use crate::consts::UPGRADE_OFFER_COUNT;

/// Upgradeable player parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKey {
    MoveSpeed,
    BoltCooldown,
    BoltDamage,
    AuraCooldown,
    AuraDamage,
    AuraRadius,
    AuraKnockback,
    StarCooldown,
    StarDamage,
    StarCount,
    GooseCount,
    GooseDamage,
    GooseOrbitSpeed,
}

/// What picking an upgrade does
///
/// Every effect re-reads the current value, so picking the same upgrade
/// twice compounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpgradeEffect {
    /// Multiply; result never drops below `floor`
    Scale { stat: StatKey, factor: f32, floor: Option<f32> },
    /// Add; result never exceeds `cap`
    Add { stat: StatKey, amount: f32, cap: Option<f32> },
    /// Restore health, capped at max
    Heal { amount: f32 },
    /// Raise max health and heal by the same amount
    RaiseMaxHealth { amount: f32 },
}

impl UpgradeEffect {
    pub fn apply(&self, player: &mut Player) {
        match *self {
            UpgradeEffect::Scale { stat, factor, floor } => {
                let mut value = player.stats.get(stat) * factor;
                if let Some(floor) = floor {
                    value = value.max(floor);
                }
                player.stats.set(stat, value);
            }
            UpgradeEffect::Add { stat, amount, cap } => {
                let mut value = player.stats.get(stat) + amount;
                if let Some(cap) = cap {
                    value = value.min(cap);
                }
                player.stats.set(stat, value);
            }
            UpgradeEffect::Heal { amount } => player.heal(amount),
            UpgradeEffect::RaiseMaxHealth { amount } => {
                player.max_health += amount.max(0.0);
                player.heal(amount);
            }
        }
    }
}

/// Static upgrade record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub name: String,
    pub description: String,
    /// `None` for upgrades every archetype can take
    #[serde(default)]
    pub archetype: Option<Archetype>,
    pub effect: UpgradeEffect,
}

impl Upgrade {
    pub fn applies_to(&self, archetype: Option<Archetype>) -> bool {
        self.archetype.is_none() || self.archetype == archetype
    }
}

/// Offers currently on screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpgradeDraft {
    /// Indices into `Tuning::upgrades`
    pub offers: Vec<usize>,
    pub highlighted: usize,
}

impl UpgradeDraft {
    pub fn is_open(&self) -> bool {
        !self.offers.is_empty()
    }

    pub fn highlight_next(&mut self) {
        if self.is_open() {
            self.highlighted = (self.highlighted + 1) % self.offers.len();
        }
    }

    pub fn highlight_prev(&mut self) {
        if self.is_open() {
            self.highlighted = (self.highlighted + self.offers.len() - 1) % self.offers.len();
        }
    }

    pub fn clear(&mut self) {
        self.offers.clear();
        self.highlighted = 0;
    }
}

/// Advance one level if the threshold is met; the overflow carries over
///
/// Returns whether a level was gained.
pub fn level_up(player: &mut Player, growth: f32) -> bool {
    if player.xp < player.xp_to_next {
        return false;
    }
    player.level += 1;
    player.xp -= player.xp_to_next;
    player.xp_to_next = ((player.xp_to_next as f64 * growth as f64).floor() as u32).max(1);
    true
}

/// Sample up to `count` distinct entries of `pool` without replacement
pub fn roll_offers<R: Rng>(rng: &mut R, pool: &[usize], count: usize) -> Vec<usize> {
    let amount = count.min(pool.len());
    rand::seq::index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

/// Indices of upgrades usable by the active archetype
pub fn eligible_upgrades(state: &GameState) -> Vec<usize> {
    state
        .tuning
        .upgrades
        .iter()
        .enumerate()
        .filter(|(_, u)| u.applies_to(state.player.archetype))
        .map(|(i, _)| i)
        .collect()
}

/// Add XP and open a draft if a threshold was crossed
pub fn grant_xp(state: &mut GameState, xp: u32) {
    state.player.xp = state.player.xp.saturating_add(xp);
    check_level_up(state);
}

/// Level up while `Playing` and over the threshold
///
/// A non-empty draft freezes the run in `PausedForUpgrade`. With nothing
/// to offer, the level is still gained and play continues.
pub fn check_level_up(state: &mut GameState) {
    if state.phase != RunPhase::Playing {
        return;
    }
    let growth = state.tuning.player.xp_growth;
    while level_up(&mut state.player, growth) {
        let level = state.player.level;
        state.emit(GameEvent::LevelUp { level });

        let pool = eligible_upgrades(state);
        let offers = roll_offers(&mut state.rng, &pool, UPGRADE_OFFER_COUNT);
        if offers.is_empty() {
            log::warn!("Level {}: upgrade pool is empty, skipping draft", level);
            continue;
        }

        let names: Vec<&str> = offers
            .iter()
            .filter_map(|&i| state.tuning.upgrades.get(i))
            .map(|u| u.name.as_str())
            .collect();
        log::info!("Level {} reached, offering {:?}", level, names);

        state.draft.offers = offers;
        state.draft.highlighted = 0;
        state.freeze(RunPhase::PausedForUpgrade);
        return;
    }
}

/// Apply the offer at `offer_index` and resume
///
/// Returns false when no draft is open or the index is out of range. If
/// XP is still over the next threshold, the following draft opens at once.
pub fn choose_upgrade(state: &mut GameState, offer_index: usize) -> bool {
    if state.phase != RunPhase::PausedForUpgrade {
        return false;
    }
    let Some(upgrade) = state
        .draft
        .offers
        .get(offer_index)
        .and_then(|&i| state.tuning.upgrades.get(i))
        .cloned()
    else {
        return false;
    };

    upgrade.effect.apply(&mut state.player);
    log::info!("Upgrade chosen: {}", upgrade.name);

    state.draft.clear();
    state.resume();
    check_level_up(state);
    true
}

/// Apply the highlighted offer
pub fn confirm_highlighted(state: &mut GameState) -> bool {
    let index = state.draft.highlighted;
    choose_upgrade(state, index)
}
