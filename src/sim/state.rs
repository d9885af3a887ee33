//! Game state and core simulation types
//!
//! Everything a run needs lives in one owned [`GameState`]; no module-level
//! statics.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::physics::{CircleWorld, PhysicsWorld};
use super::progression::{StatKey, UpgradeDraft};
use super::registry::{EntityId, EntityRegistry};
use super::schedule::Scheduler;
use super::status::StatusEffects;
use crate::consts::PLAYER_RADIUS;
use crate::tuning::{ArchetypeProfile, Tuning};

/// Run state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    /// Choosing a character (initial)
    CharacterSelect,
    /// Active simulation
    Playing,
    /// Level-up draft on screen, simulation frozen
    PausedForUpgrade,
    /// Player pause, simulation frozen
    Paused,
    /// Run ended; only reset leaves this
    GameOver,
}

/// Playable character; selected once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// Melee damage aura
    Warden,
    /// Homing starfall volleys
    Starcaller,
    /// Orbiting geese that convert kills into allies
    Gooseherd,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [
        Archetype::Warden,
        Archetype::Starcaller,
        Archetype::Gooseherd,
    ];
}

/// What an enemy does to the player on contact besides damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnHitEffect {
    None,
    Stun,
    Knockback,
}

/// Enemy types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Normal,
    /// Stuns on contact
    Shocker,
    /// Knocks the player back on contact
    Brute,
    /// Radiates a slow / cooldown-penalty aura
    Frost,
    /// Large health pool
    Tank,
    Boss,
}

impl EnemyKind {
    pub const ELITES: [EnemyKind; 4] = [
        EnemyKind::Shocker,
        EnemyKind::Brute,
        EnemyKind::Frost,
        EnemyKind::Tank,
    ];

    pub fn is_elite(self) -> bool {
        Self::ELITES.contains(&self)
    }

    pub fn on_hit(self) -> OnHitEffect {
        match self {
            EnemyKind::Shocker => OnHitEffect::Stun,
            EnemyKind::Brute | EnemyKind::Boss => OnHitEffect::Knockback,
            _ => OnHitEffect::None,
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub contact_damage: f32,
    pub speed_multiplier: f32,
    pub visual_scale: f32,
    pub xp_reward: u32,
    /// Flees instead of chasing until this time
    pub confused_until: Option<f64>,
    /// Chase steering suspended until this time
    pub knockback_until: Option<f64>,
}

/// Player auto-shot
#[derive(Debug, Clone)]
pub struct Bolt {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub created_ms: f64,
}

/// Homing starfall projectile
#[derive(Debug, Clone)]
pub struct Star {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub target: Option<EntityId>,
    /// Last known target position; kept after the target dies
    pub target_pos: Vec2,
    pub damage: f32,
    pub created_ms: f64,
    pub last_trigger_ms: Option<f64>,
}

/// Orbiting goose slot (no physics body; position derived every tick)
#[derive(Debug, Clone)]
pub struct Companion {
    pub slot: u32,
    pub angle: f32,
    pub pos: Vec2,
}

/// Enemy converted by a goose kill
#[derive(Debug, Clone)]
pub struct Ally {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub created_ms: f64,
    pub expires_ms: f64,
}

/// XP orb
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub xp: u32,
}

/// Upgradeable ability parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub move_speed: f32,
    pub bolt_cooldown_ms: f64,
    pub bolt_damage: f32,
    pub bolt_speed: f32,
    pub bolt_range: f32,
    pub aura_cooldown_ms: f64,
    pub aura_damage: f32,
    pub aura_radius: f32,
    pub aura_knockback: f32,
    pub star_cooldown_ms: f64,
    pub star_damage: f32,
    pub star_count: u32,
    pub goose_count: u32,
    pub goose_damage: f32,
    /// Multiplier on the base orbit speed
    pub goose_orbit_speed: f32,
    pub goose_knockback: f32,
}

impl PlayerStats {
    pub fn from_tuning(tuning: &Tuning, move_speed: f32) -> Self {
        Self {
            move_speed,
            bolt_cooldown_ms: tuning.bolt.cooldown_ms,
            bolt_damage: tuning.bolt.damage,
            bolt_speed: tuning.bolt.speed,
            bolt_range: tuning.bolt.range,
            aura_cooldown_ms: tuning.aura.cooldown_ms,
            aura_damage: tuning.aura.damage,
            aura_radius: tuning.aura.radius,
            aura_knockback: tuning.aura.knockback,
            star_cooldown_ms: tuning.starfall.cooldown_ms,
            star_damage: tuning.starfall.damage,
            star_count: tuning.starfall.count,
            goose_count: tuning.goose.count,
            goose_damage: tuning.goose.damage,
            goose_orbit_speed: 1.0,
            goose_knockback: tuning.goose.knockback,
        }
    }

    pub fn get(&self, stat: StatKey) -> f32 {
        match stat {
            StatKey::MoveSpeed => self.move_speed,
            StatKey::BoltCooldown => self.bolt_cooldown_ms as f32,
            StatKey::BoltDamage => self.bolt_damage,
            StatKey::AuraCooldown => self.aura_cooldown_ms as f32,
            StatKey::AuraDamage => self.aura_damage,
            StatKey::AuraRadius => self.aura_radius,
            StatKey::AuraKnockback => self.aura_knockback,
            StatKey::StarCooldown => self.star_cooldown_ms as f32,
            StatKey::StarDamage => self.star_damage,
            StatKey::StarCount => self.star_count as f32,
            StatKey::GooseCount => self.goose_count as f32,
            StatKey::GooseDamage => self.goose_damage,
            StatKey::GooseOrbitSpeed => self.goose_orbit_speed,
        }
    }

    /// Counts round to the nearest whole number and never go negative
    pub fn set(&mut self, stat: StatKey, value: f32) {
        let count = || value.round().max(0.0) as u32;
        match stat {
            StatKey::MoveSpeed => self.move_speed = value,
            StatKey::BoltCooldown => self.bolt_cooldown_ms = value as f64,
            StatKey::BoltDamage => self.bolt_damage = value,
            StatKey::AuraCooldown => self.aura_cooldown_ms = value as f64,
            StatKey::AuraDamage => self.aura_damage = value,
            StatKey::AuraRadius => self.aura_radius = value,
            StatKey::AuraKnockback => self.aura_knockback = value,
            StatKey::StarCooldown => self.star_cooldown_ms = value as f64,
            StatKey::StarDamage => self.star_damage = value,
            StatKey::StarCount => self.star_count = count(),
            StatKey::GooseCount => self.goose_count = count(),
            StatKey::GooseDamage => self.goose_damage = value,
            StatKey::GooseOrbitSpeed => self.goose_orbit_speed = value,
        }
    }
}

/// The player (singleton)
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub xp: u32,
    pub level: u32,
    pub xp_to_next: u32,
    pub archetype: Option<Archetype>,
    pub stats: PlayerStats,
    pub status: StatusEffects,
    pub last_bolt_ms: Option<f64>,
}

impl Player {
    /// Pre-selection player: default archetype-less stats
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: Vec2::new(tuning.arena.width / 2.0, tuning.arena.height / 2.0),
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            health: 100.0,
            max_health: 100.0,
            xp: 0,
            level: 1,
            xp_to_next: tuning.player.xp_to_first_level,
            archetype: None,
            stats: PlayerStats::from_tuning(tuning, 180.0),
            status: StatusEffects::default(),
            last_bolt_ms: None,
        }
    }

    /// Fresh player for `profile`
    pub fn for_profile(tuning: &Tuning, profile: &ArchetypeProfile) -> Self {
        Self {
            health: profile.max_health,
            max_health: profile.max_health,
            archetype: Some(profile.archetype),
            stats: PlayerStats::from_tuning(tuning, profile.move_speed),
            ..Self::new(tuning)
        }
    }

    /// Apply damage, clamped at zero; returns the health actually lost
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.health;
        self.health = (self.health - amount.max(0.0)).clamp(0.0, self.max_health);
        before - self.health
    }

    /// Restore health, capped at max
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount.max(0.0)).clamp(0.0, self.max_health);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }
}

/// Discrete events for the audio dispatcher (and any other listener)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    EnemyDied { kind: EnemyKind },
    PlayerHit { damage: f32 },
    PickupCollected { xp: u32 },
    ShotFired,
    LevelUp { level: u32 },
    GameOver,
}

/// Per-run statistics
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub kills: u32,
    pub bosses_defeated: u32,
    /// Simulated time spent in `Playing`
    pub run_time_ms: f64,
}

/// Complete game state
#[derive(Debug)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: RunPhase,
    /// Host clock at the current tick
    pub now_ms: f64,
    pub player: Player,
    pub registry: EntityRegistry,
    pub scheduler: Scheduler,
    /// Active archetype strategy (None outside a run)
    pub ability: Option<Box<dyn Ability>>,
    pub draft: UpgradeDraft,
    /// Highlighted entry on the character select screen
    pub select_index: usize,
    pub stats: RunStats,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Clock reading when the simulation last froze
    pub frozen_at_ms: Option<f64>,
}

impl GameState {
    /// Create a new game state with the bundled physics backend
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::with_physics(seed, tuning, Box::new(CircleWorld::default()))
    }

    /// Create a new game state backed by `physics`
    pub fn with_physics(seed: u64, tuning: Tuning, physics: Box<dyn PhysicsWorld>) -> Self {
        let player = Player::new(&tuning);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            phase: RunPhase::CharacterSelect,
            now_ms: 0.0,
            player,
            registry: EntityRegistry::new(physics),
            scheduler: Scheduler::default(),
            ability: None,
            draft: UpgradeDraft::default(),
            select_index: 0,
            stats: RunStats::default(),
            events: Vec::new(),
            frozen_at_ms: None,
        }
    }

    /// Stop simulating and remember when the clock stopped
    pub fn freeze(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.frozen_at_ms.get_or_insert(self.now_ms);
    }

    /// Back to `Playing`; time spent frozen does not count toward scheduled
    /// tasks
    pub fn resume(&mut self) {
        if let Some(at) = self.frozen_at_ms.take() {
            self.scheduler.shift(self.now_ms - at);
        }
        self.phase = RunPhase::Playing;
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Whether any boss is currently alive
    pub fn boss_alive(&self) -> bool {
        self.registry.enemies().iter().any(|e| e.kind == EnemyKind::Boss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_character_select() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, RunPhase::CharacterSelect);
        assert!(state.ability.is_none());
        assert_eq!(state.player.level, 1);
        assert_eq!(state.player.xp_to_next, 30);
    }

    #[test]
    fn test_player_health_clamped() {
        let tuning = Tuning::default();
        let mut p = Player::new(&tuning);
        p.max_health = 150.0;
        p.health = 150.0;
        assert_eq!(p.apply_damage(10.0), 10.0);
        assert_eq!(p.health, 140.0);
        p.heal(500.0);
        assert_eq!(p.health, 150.0);
        p.apply_damage(1000.0);
        assert_eq!(p.health, 0.0);
        assert!(p.is_dead());
        // Negative damage is not a heal
        p.apply_damage(-20.0);
        assert_eq!(p.health, 0.0);
    }

    #[test]
    fn test_stat_counts_round() {
        let tuning = Tuning::default();
        let mut stats = PlayerStats::from_tuning(&tuning, 180.0);
        stats.set(StatKey::StarCount, 3.6);
        assert_eq!(stats.star_count, 4);
        stats.set(StatKey::GooseCount, -2.0);
        assert_eq!(stats.goose_count, 0);
    }

    #[test]
    fn test_enemy_kind_effects() {
        assert_eq!(EnemyKind::Shocker.on_hit(), OnHitEffect::Stun);
        assert_eq!(EnemyKind::Brute.on_hit(), OnHitEffect::Knockback);
        assert_eq!(EnemyKind::Normal.on_hit(), OnHitEffect::None);
        assert!(EnemyKind::Frost.is_elite());
        assert!(!EnemyKind::Boss.is_elite());
    }
}
