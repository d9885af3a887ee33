//! Data-driven game balance
//!
//! Every gameplay number lives here so a host can override balance with a
//! JSON blob. Missing fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::error::GameError;
use crate::sim::progression::{StatKey, Upgrade, UpgradeEffect};
use crate::sim::state::{Archetype, EnemyKind};

/// Arena extents and off-screen cull margins
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaTuning {
    pub width: f32,
    pub height: f32,
    /// Enemies, allies and stray companions beyond this margin are culled
    pub enemy_cull_margin: f32,
    /// Player bolts beyond this margin are culled
    pub bolt_cull_margin: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            enemy_cull_margin: 100.0,
            bolt_cull_margin: 50.0,
        }
    }
}

/// Enemy spawn cadence and type selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerTuning {
    pub interval_ms: f64,
    /// Boss is forced on every level that is a positive multiple of this
    pub boss_interval: u32,
    /// Chance of an elite on even levels >= 2
    pub elite_chance: f64,
    /// Chase speed before per-type multipliers (units/s)
    pub enemy_base_speed: f32,
}

impl Default for SpawnerTuning {
    fn default() -> Self {
        Self {
            interval_ms: 267.0,
            boss_interval: 7,
            elite_chance: 0.25,
            enemy_base_speed: 70.0,
        }
    }
}

/// Fixed stat block for one enemy type
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EnemyStats {
    pub radius: f32,
    pub health: f32,
    pub contact_damage: f32,
    pub speed_multiplier: f32,
    pub visual_scale: f32,
    /// XP carried by the orb this enemy drops
    pub xp_reward: u32,
}

/// Stat blocks for every enemy type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRoster {
    pub normal: EnemyStats,
    pub shocker: EnemyStats,
    pub brute: EnemyStats,
    pub frost: EnemyStats,
    pub tank: EnemyStats,
    pub boss: EnemyStats,
}

impl EnemyRoster {
    pub fn get(&self, kind: EnemyKind) -> &EnemyStats {
        match kind {
            EnemyKind::Normal => &self.normal,
            EnemyKind::Shocker => &self.shocker,
            EnemyKind::Brute => &self.brute,
            EnemyKind::Frost => &self.frost,
            EnemyKind::Tank => &self.tank,
            EnemyKind::Boss => &self.boss,
        }
    }
}

impl Default for EnemyRoster {
    fn default() -> Self {
        Self {
            normal: EnemyStats {
                radius: 14.0,
                health: 3.0,
                contact_damage: 10.0,
                speed_multiplier: 1.0,
                visual_scale: 1.0,
                xp_reward: 5,
            },
            shocker: EnemyStats {
                radius: 16.0,
                health: 6.0,
                contact_damage: 8.0,
                speed_multiplier: 1.15,
                visual_scale: 1.2,
                xp_reward: 15,
            },
            brute: EnemyStats {
                radius: 20.0,
                health: 9.0,
                contact_damage: 14.0,
                speed_multiplier: 0.9,
                visual_scale: 1.5,
                xp_reward: 15,
            },
            frost: EnemyStats {
                radius: 17.0,
                health: 7.0,
                contact_damage: 6.0,
                speed_multiplier: 0.8,
                visual_scale: 1.3,
                xp_reward: 15,
            },
            tank: EnemyStats {
                radius: 24.0,
                health: 20.0,
                contact_damage: 12.0,
                speed_multiplier: 0.6,
                visual_scale: 1.8,
                xp_reward: 20,
            },
            boss: EnemyStats {
                radius: 40.0,
                health: 80.0,
                contact_damage: 25.0,
                speed_multiplier: 0.55,
                visual_scale: 3.0,
                xp_reward: 60,
            },
        }
    }
}

/// Player defaults shared by every archetype
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub xp_to_first_level: u32,
    /// `xp_to_next` multiplier applied (then floored) on every level-up
    pub xp_growth: f32,
    pub invincibility_ms: f64,
    pub regen_interval_ms: f64,
    pub regen_amount: f32,
    pub pickup_magnet_radius: f32,
    pub pickup_magnet_speed: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            xp_to_first_level: 30,
            xp_growth: 1.7,
            invincibility_ms: 800.0,
            regen_interval_ms: 2000.0,
            regen_amount: 1.0,
            pickup_magnet_radius: 110.0,
            pickup_magnet_speed: 320.0,
        }
    }
}

/// Starting profile for one character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchetypeProfile {
    pub archetype: Archetype,
    pub name: String,
    pub max_health: f32,
    pub move_speed: f32,
}

/// Timed effects, elite passives and on-hit reactions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTuning {
    /// Hard-stun duration from a Shocker contact
    pub stun_ms: f64,
    /// Distance a Brute contact shoves the player
    pub player_knockback_distance: f32,
    pub player_knockback_ms: f64,
    /// Enemies ignore chase steering while a push plays out
    pub enemy_knockback_ms: f64,
    pub slow_aura_radius: f32,
    /// Player speed multiplier at point-blank range of a Frost elite
    pub slow_full_speed_multiplier: f32,
    /// Ability cooldown multiplier at point-blank range of a Frost elite
    pub slow_full_cooldown_multiplier: f32,
    /// Enemy contact damage multiplier while a boss is alive
    pub boss_rally_damage_multiplier: f32,
}

impl Default for StatusTuning {
    fn default() -> Self {
        Self {
            stun_ms: 700.0,
            player_knockback_distance: 60.0,
            player_knockback_ms: 180.0,
            enemy_knockback_ms: 150.0,
            slow_aura_radius: 220.0,
            slow_full_speed_multiplier: 0.5,
            slow_full_cooldown_multiplier: 1.6,
            boss_rally_damage_multiplier: 1.5,
        }
    }
}

/// Auto-aimed basic shot every archetype carries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoltTuning {
    pub cooldown_ms: f64,
    pub damage: f32,
    pub speed: f32,
    pub range: f32,
}

impl Default for BoltTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 700.0,
            damage: 1.0,
            speed: 480.0,
            range: 420.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraTuning {
    pub cooldown_ms: f64,
    pub damage: f32,
    pub radius: f32,
    pub knockback: f32,
}

impl Default for AuraTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 500.0,
            damage: 0.8,
            radius: 90.0,
            knockback: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfallTuning {
    pub cooldown_ms: f64,
    pub damage: f32,
    pub count: u32,
    pub cast_range: f32,
    pub aoe_radius: f32,
    pub speed: f32,
    /// Detonate once this close to the target point
    pub arrival_radius: f32,
    pub timeout_ms: f64,
    /// Delay between consecutive launches of one volley
    pub stagger_ms: f64,
    pub confusion_ms: f64,
    /// Minimum spacing between two detonation triggers of one star
    pub retrigger_guard_ms: f64,
}

impl Default for StarfallTuning {
    fn default() -> Self {
        Self {
            cooldown_ms: 1600.0,
            damage: 3.0,
            count: 3,
            cast_range: 460.0,
            aoe_radius: 70.0,
            speed: 420.0,
            arrival_radius: 12.0,
            timeout_ms: 5000.0,
            stagger_ms: 110.0,
            confusion_ms: 2200.0,
            retrigger_guard_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GooseTuning {
    pub count: u32,
    pub orbit_radius: f32,
    /// Radians per second before multipliers
    pub base_orbit_speed: f32,
    pub contact_radius: f32,
    /// Damage per tick of contact
    pub damage: f32,
    pub knockback: f32,
    pub ally_lifetime_ms: f64,
    pub ally_speed: f32,
    pub ally_damage: f32,
}

impl Default for GooseTuning {
    fn default() -> Self {
        Self {
            count: 3,
            orbit_radius: 72.0,
            base_orbit_speed: 2.6,
            contact_radius: 24.0,
            damage: 0.12,
            knockback: 6.0,
            ally_lifetime_ms: 4000.0,
            ally_speed: 230.0,
            ally_damage: 2.0,
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub arena: ArenaTuning,
    pub spawner: SpawnerTuning,
    pub enemies: EnemyRoster,
    pub player: PlayerTuning,
    pub archetypes: Vec<ArchetypeProfile>,
    pub status: StatusTuning,
    pub bolt: BoltTuning,
    pub aura: AuraTuning,
    pub starfall: StarfallTuning,
    pub goose: GooseTuning,
    /// Static upgrade pool; drafts sample from the entries usable by the
    /// active archetype
    pub upgrades: Vec<Upgrade>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            arena: ArenaTuning::default(),
            spawner: SpawnerTuning::default(),
            enemies: EnemyRoster::default(),
            player: PlayerTuning::default(),
            archetypes: vec![
                ArchetypeProfile {
                    archetype: Archetype::Warden,
                    name: "Warden".to_string(),
                    max_health: 170.0,
                    move_speed: 180.0,
                },
                ArchetypeProfile {
                    archetype: Archetype::Starcaller,
                    name: "Starcaller".to_string(),
                    max_health: 130.0,
                    move_speed: 200.0,
                },
                ArchetypeProfile {
                    archetype: Archetype::Gooseherd,
                    name: "Gooseherd".to_string(),
                    max_health: 150.0,
                    move_speed: 190.0,
                },
            ],
            status: StatusTuning::default(),
            bolt: BoltTuning::default(),
            aura: AuraTuning::default(),
            starfall: StarfallTuning::default(),
            goose: GooseTuning::default(),
            upgrades: default_upgrades(),
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), GameError> {
        let out_of_range = |msg: &str| Err(GameError::TuningOutOfRange(msg.to_string()));
        if self.arena.width <= 0.0 || self.arena.height <= 0.0 {
            return out_of_range("arena must have a positive size");
        }
        if self.spawner.interval_ms <= 0.0 {
            return out_of_range("spawner.interval_ms must be positive");
        }
        if self.spawner.boss_interval == 0 {
            return out_of_range("spawner.boss_interval must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.spawner.elite_chance) {
            return out_of_range("spawner.elite_chance must be within [0, 1]");
        }
        if self.player.xp_to_first_level == 0 {
            return out_of_range("player.xp_to_first_level must be at least 1");
        }
        if self.player.xp_growth <= 1.0 {
            return out_of_range("player.xp_growth must exceed 1");
        }
        if self.player.regen_interval_ms <= 0.0 {
            return out_of_range("player.regen_interval_ms must be positive");
        }
        if self.archetypes.is_empty() {
            return out_of_range("at least one archetype is required");
        }
        Ok(())
    }

    /// Starting profile for `archetype` (falls back to the first entry)
    pub fn profile(&self, archetype: Archetype) -> Option<&ArchetypeProfile> {
        self.archetypes
            .iter()
            .find(|p| p.archetype == archetype)
            .or_else(|| self.archetypes.first())
    }
}

fn upgrade(
    name: &str,
    description: &str,
    archetype: Option<Archetype>,
    effect: UpgradeEffect,
) -> Upgrade {
    Upgrade {
        name: name.to_string(),
        description: description.to_string(),
        archetype,
        effect,
    }
}

fn scale(stat: StatKey, factor: f32, floor: Option<f32>) -> UpgradeEffect {
    UpgradeEffect::Scale {
        stat,
        factor,
        floor,
    }
}

fn add(stat: StatKey, amount: f32, cap: Option<f32>) -> UpgradeEffect {
    UpgradeEffect::Add { stat, amount, cap }
}

/// The stock upgrade pool
pub fn default_upgrades() -> Vec<Upgrade> {
    use Archetype::*;
    use UpgradeEffect::{Heal, RaiseMaxHealth};
    vec![
        // Generic
        upgrade(
            "Swift Boots",
            "+10% movement speed",
            None,
            scale(StatKey::MoveSpeed, 1.1, None),
        ),
        upgrade(
            "Second Wind",
            "Restore 40 health",
            None,
            Heal { amount: 40.0 },
        ),
        upgrade(
            "Vitality",
            "+25 max health",
            None,
            RaiseMaxHealth { amount: 25.0 },
        ),
        upgrade(
            "Rapid Fire",
            "Bolts recharge 15% faster",
            None,
            scale(StatKey::BoltCooldown, 0.85, Some(120.0)),
        ),
        upgrade(
            "Heavy Bolts",
            "+1 bolt damage",
            None,
            add(StatKey::BoltDamage, 1.0, None),
        ),
        // Warden
        upgrade(
            "Searing Aura",
            "Aura damage x1.25",
            Some(Warden),
            scale(StatKey::AuraDamage, 1.25, None),
        ),
        upgrade(
            "Quickened Pulse",
            "Aura pulses 15% faster",
            Some(Warden),
            scale(StatKey::AuraCooldown, 0.85, Some(150.0)),
        ),
        upgrade(
            "Wide Aura",
            "+15 aura radius",
            Some(Warden),
            add(StatKey::AuraRadius, 15.0, Some(260.0)),
        ),
        upgrade(
            "Shockwave",
            "+10 aura knockback",
            Some(Warden),
            add(StatKey::AuraKnockback, 10.0, None),
        ),
        // Starcaller
        upgrade(
            "Starstorm",
            "+1 star per volley",
            Some(Starcaller),
            add(StatKey::StarCount, 1.0, Some(10.0)),
        ),
        upgrade(
            "Comet Tail",
            "Starfall recharges 15% faster",
            Some(Starcaller),
            scale(StatKey::StarCooldown, 0.85, Some(400.0)),
        ),
        upgrade(
            "Meteor Core",
            "Star damage x1.25",
            Some(Starcaller),
            scale(StatKey::StarDamage, 1.25, None),
        ),
        // Gooseherd
        upgrade(
            "Bigger Flock",
            "+1 orbiting goose",
            Some(Gooseherd),
            add(StatKey::GooseCount, 1.0, Some(8.0)),
        ),
        upgrade(
            "Angry Geese",
            "Goose damage x1.25",
            Some(Gooseherd),
            scale(StatKey::GooseDamage, 1.25, None),
        ),
        upgrade(
            "Tailwind",
            "Geese orbit 15% faster",
            Some(Gooseherd),
            scale(StatKey::GooseOrbitSpeed, 1.15, None),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_validates() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let tuning = Tuning::from_json(r#"{ "spawner": { "boss_interval": 5 } }"#).unwrap();
        assert_eq!(tuning.spawner.boss_interval, 5);
        // Untouched fields keep defaults
        assert_eq!(tuning.spawner.interval_ms, 267.0);
        assert_eq!(tuning.player.xp_to_first_level, 30);
        assert!(!tuning.upgrades.is_empty());
    }

    #[test]
    fn test_malformed_json_is_error() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, GameError::InvalidTuning(_)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = Tuning::from_json(r#"{ "player": { "xp_growth": 0.5 } }"#).unwrap_err();
        assert!(matches!(err, GameError::TuningOutOfRange(_)));
    }

    #[test]
    fn test_profile_lookup() {
        let tuning = Tuning::default();
        let p = tuning.profile(Archetype::Starcaller).unwrap();
        assert_eq!(p.name, "Starcaller");
    }
}
