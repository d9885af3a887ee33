//! Entity registry
//!
//! Owns every live entity collection and is the only place physics bodies
//! are created or destroyed. Each body-backed entity maps to exactly one
//! body and each body maps back to exactly one entity (or the player).
//! Ids are never reused, so removing a stale id is a harmless no-op.

use std::collections::HashMap;

use glam::Vec2;

use super::physics::{BodyDesc, BodyHandle, BodyLabel, CollisionPair, PhysicsWorld};
use super::spatial::outside_bounds;
use super::state::{Ally, Bolt, Companion, Enemy, EnemyKind, Pickup, Star};
use crate::consts::{ALLY_RADIUS, BOLT_RADIUS, PICKUP_RADIUS, STAR_RADIUS};
use crate::tuning::EnemyStats;

/// Stable entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

/// Collection tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Enemy,
    Projectile,
    StarProjectile,
    Companion,
    Ally,
    Pickup,
}

/// Who owns a physics body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyOwner {
    Player,
    Entity(EntityKind, EntityId),
}

/// Spawn parameters, one variant per body-backed collection
#[derive(Debug, Clone, Copy)]
pub enum EntityInit {
    Enemy { kind: EnemyKind, stats: EnemyStats, pos: Vec2 },
    Bolt { pos: Vec2, vel: Vec2, damage: f32, now_ms: f64 },
    Star { pos: Vec2, target: Option<EntityId>, target_pos: Vec2, damage: f32, now_ms: f64 },
    Ally { pos: Vec2, damage: f32, now_ms: f64, lifetime_ms: f64 },
    Pickup { pos: Vec2, xp: u32 },
}

/// What a removal took out of the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Removed {
    pub kind: EntityKind,
    pub pos: Vec2,
}

#[derive(Debug)]
pub struct EntityRegistry {
    physics: Box<dyn PhysicsWorld>,
    next_id: u32,
    player_body: Option<BodyHandle>,
    enemies: Vec<Enemy>,
    bolts: Vec<Bolt>,
    stars: Vec<Star>,
    allies: Vec<Ally>,
    pickups: Vec<Pickup>,
    /// Orbit slots; positions are derived, so no bodies
    pub companions: Vec<Companion>,
    owners: HashMap<BodyHandle, BodyOwner>,
    bodies: HashMap<EntityId, BodyHandle>,
}

impl EntityRegistry {
    pub fn new(physics: Box<dyn PhysicsWorld>) -> Self {
        Self {
            physics,
            next_id: 1,
            player_body: None,
            enemies: Vec::new(),
            bolts: Vec::new(),
            stars: Vec::new(),
            allies: Vec::new(),
            pickups: Vec::new(),
            companions: Vec::new(),
            owners: HashMap::new(),
            bodies: HashMap::new(),
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn attach(&mut self, id: EntityId, kind: EntityKind, desc: BodyDesc) {
        let body = self.physics.create_body(desc);
        self.owners.insert(body, BodyOwner::Entity(kind, id));
        self.bodies.insert(id, body);
    }

    /// Register an entity and create its body in the same operation
    pub fn spawn(&mut self, init: EntityInit) -> EntityId {
        let id = self.next_entity_id();
        match init {
            EntityInit::Enemy { kind, stats, pos } => {
                let body = BodyDesc::circle(pos, stats.radius, BodyLabel::Enemy);
                self.attach(id, EntityKind::Enemy, body);
                self.enemies.push(Enemy {
                    id,
                    kind,
                    pos,
                    vel: Vec2::ZERO,
                    radius: stats.radius,
                    health: stats.health,
                    max_health: stats.health,
                    contact_damage: stats.contact_damage,
                    speed_multiplier: stats.speed_multiplier,
                    visual_scale: stats.visual_scale,
                    xp_reward: stats.xp_reward,
                    confused_until: None,
                    knockback_until: None,
                });
            }
            EntityInit::Bolt { pos, vel, damage, now_ms } => {
                let body = BodyDesc::circle(pos, BOLT_RADIUS, BodyLabel::Projectile);
                self.attach(id, EntityKind::Projectile, body);
                self.set_body_velocity(id, vel);
                self.bolts.push(Bolt {
                    id,
                    pos,
                    vel,
                    damage,
                    created_ms: now_ms,
                });
            }
            EntityInit::Star { pos, target, target_pos, damage, now_ms } => {
                let body = BodyDesc::circle(pos, STAR_RADIUS, BodyLabel::Starfall);
                self.attach(id, EntityKind::StarProjectile, body);
                self.stars.push(Star {
                    id,
                    pos,
                    vel: Vec2::ZERO,
                    target,
                    target_pos,
                    damage,
                    created_ms: now_ms,
                    last_trigger_ms: None,
                });
            }
            EntityInit::Ally { pos, damage, now_ms, lifetime_ms } => {
                let body = BodyDesc::circle(pos, ALLY_RADIUS, BodyLabel::Ally);
                self.attach(id, EntityKind::Ally, body);
                self.allies.push(Ally {
                    id,
                    pos,
                    vel: Vec2::ZERO,
                    damage,
                    created_ms: now_ms,
                    expires_ms: now_ms + lifetime_ms,
                });
            }
            EntityInit::Pickup { pos, xp } => {
                let body = BodyDesc::circle(pos, PICKUP_RADIUS, BodyLabel::Pickup);
                self.attach(id, EntityKind::Pickup, body);
                self.pickups.push(Pickup {
                    id,
                    pos,
                    vel: Vec2::ZERO,
                    xp,
                });
            }
        }
        id
    }

    /// Create (or replace) the player's body
    pub fn spawn_player(&mut self, pos: Vec2, radius: f32) -> BodyHandle {
        self.remove_player();
        let body = self.physics.create_body(BodyDesc::circle(pos, radius, BodyLabel::Player));
        self.owners.insert(body, BodyOwner::Player);
        self.player_body = Some(body);
        body
    }

    pub fn remove_player(&mut self) {
        if let Some(body) = self.player_body.take() {
            self.owners.remove(&body);
            self.physics.remove_body(body);
        }
    }

    pub fn player_body(&self) -> Option<BodyHandle> {
        self.player_body
    }

    /// Remove an entity and its body; `None` if it was already gone
    pub fn remove(&mut self, id: EntityId) -> Option<Removed> {
        let body = self.bodies.remove(&id)?;
        let kind = match self.owners.remove(&body) {
            Some(BodyOwner::Entity(kind, _)) => kind,
            _ => return None,
        };
        self.physics.remove_body(body);

        fn take<T>(
            items: &mut Vec<T>,
            id: EntityId,
            id_of: impl Fn(&T) -> EntityId,
            pos_of: impl Fn(&T) -> Vec2,
        ) -> Option<Vec2> {
            let idx = items.iter().position(|item| id_of(item) == id)?;
            Some(pos_of(&items.remove(idx)))
        }
        let pos = match kind {
            EntityKind::Enemy => take(&mut self.enemies, id, |e| e.id, |e| e.pos),
            EntityKind::Projectile => take(&mut self.bolts, id, |b| b.id, |b| b.pos),
            EntityKind::StarProjectile => take(&mut self.stars, id, |s| s.id, |s| s.pos),
            EntityKind::Ally => take(&mut self.allies, id, |a| a.id, |a| a.pos),
            EntityKind::Pickup => take(&mut self.pickups, id, |p| p.id, |p| p.pos),
            EntityKind::Companion => None,
        }?;
        Some(Removed { kind, pos })
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Body backing an entity
    pub fn body_of(&self, id: EntityId) -> Option<BodyHandle> {
        self.bodies.get(&id).copied()
    }

    /// Owner of a body, if it is still registered
    pub fn owner_of(&self, body: BodyHandle) -> Option<BodyOwner> {
        self.owners.get(&body).copied()
    }

    /// Visit `(id, position)` for every entity of `kind`
    pub fn for_each(&self, kind: EntityKind, mut f: impl FnMut(EntityId, Vec2)) {
        match kind {
            EntityKind::Enemy => self.enemies.iter().for_each(|e| f(e.id, e.pos)),
            EntityKind::Projectile => self.bolts.iter().for_each(|b| f(b.id, b.pos)),
            EntityKind::StarProjectile => self.stars.iter().for_each(|s| f(s.id, s.pos)),
            EntityKind::Ally => self.allies.iter().for_each(|a| f(a.id, a.pos)),
            EntityKind::Pickup => self.pickups.iter().for_each(|p| f(p.id, p.pos)),
            EntityKind::Companion => self
                .companions
                .iter()
                .for_each(|c| f(EntityId(c.slot), c.pos)),
        }
    }

    /// `(id, position)` pairs for `kind`, in registry order
    pub fn positions(&self, kind: EntityKind) -> Vec<(EntityId, Vec2)> {
        let mut out = Vec::new();
        self.for_each(kind, |id, pos| out.push((id, pos)));
        out
    }

    /// Remove every entity of `kind` more than `margin` outside the arena
    pub fn cull_out_of_bounds(
        &mut self,
        kind: EntityKind,
        width: f32,
        height: f32,
        margin: f32,
    ) -> Vec<EntityId> {
        if kind == EntityKind::Companion {
            let mut culled = Vec::new();
            self.companions.retain(|c| {
                let out = outside_bounds(c.pos, width, height, margin);
                if out {
                    culled.push(EntityId(c.slot));
                }
                !out
            });
            return culled;
        }
        let doomed: Vec<EntityId> = self
            .positions(kind)
            .into_iter()
            .filter(|(_, pos)| outside_bounds(*pos, width, height, margin))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove(id);
        }
        doomed
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn enemies_mut(&mut self) -> &mut [Enemy] {
        &mut self.enemies
    }

    pub fn enemy(&self, id: EntityId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_mut(&mut self, id: EntityId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|e| e.id == id)
    }

    pub fn bolts(&self) -> &[Bolt] {
        &self.bolts
    }

    pub fn bolt(&self, id: EntityId) -> Option<&Bolt> {
        self.bolts.iter().find(|b| b.id == id)
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn stars_mut(&mut self) -> &mut [Star] {
        &mut self.stars
    }

    pub fn star_mut(&mut self, id: EntityId) -> Option<&mut Star> {
        self.stars.iter_mut().find(|s| s.id == id)
    }

    pub fn allies(&self) -> &[Ally] {
        &self.allies
    }

    pub fn ally(&self, id: EntityId) -> Option<&Ally> {
        self.allies.iter().find(|a| a.id == id)
    }

    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    pub fn pickup(&self, id: EntityId) -> Option<&Pickup> {
        self.pickups.iter().find(|p| p.id == id)
    }

    /// Push a velocity to an entity's body (mirrored on the entity)
    pub fn set_velocity(&mut self, id: EntityId, vel: Vec2) {
        self.set_body_velocity(id, vel);
        if let Some(e) = self.enemies.iter_mut().find(|e| e.id == id) {
            e.vel = vel;
        } else if let Some(b) = self.bolts.iter_mut().find(|b| b.id == id) {
            b.vel = vel;
        } else if let Some(s) = self.stars.iter_mut().find(|s| s.id == id) {
            s.vel = vel;
        } else if let Some(a) = self.allies.iter_mut().find(|a| a.id == id) {
            a.vel = vel;
        } else if let Some(p) = self.pickups.iter_mut().find(|p| p.id == id) {
            p.vel = vel;
        }
    }

    fn set_body_velocity(&mut self, id: EntityId, vel: Vec2) {
        if let Some(&body) = self.bodies.get(&id) {
            self.physics.set_velocity(body, vel);
        }
    }

    pub fn set_player_velocity(&mut self, vel: Vec2) {
        if let Some(body) = self.player_body {
            self.physics.set_velocity(body, vel);
        }
    }

    pub fn set_player_position(&mut self, pos: Vec2) {
        if let Some(body) = self.player_body {
            self.physics.set_position(body, pos);
        }
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.player_body.and_then(|b| self.physics.position(b))
    }

    /// Run the physics step and pull positions back into the entities
    pub fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        let pairs = self.physics.step(dt);
        self.sync_from_physics();
        pairs
    }

    fn sync_from_physics(&mut self) {
        let physics = &self.physics;
        let bodies = &self.bodies;
        let pos_of = |id: EntityId| bodies.get(&id).and_then(|&b| physics.position(b));
        for e in &mut self.enemies {
            if let Some(p) = pos_of(e.id) {
                e.pos = p;
            }
        }
        for b in &mut self.bolts {
            if let Some(p) = pos_of(b.id) {
                b.pos = p;
            }
        }
        for s in &mut self.stars {
            if let Some(p) = pos_of(s.id) {
                s.pos = p;
            }
        }
        for a in &mut self.allies {
            if let Some(p) = pos_of(a.id) {
                a.pos = p;
            }
        }
        for p in &mut self.pickups {
            if let Some(pos) = pos_of(p.id) {
                p.pos = pos;
            }
        }
    }

    /// Number of body-backed entities (player excluded)
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.companions.is_empty()
    }

    /// Every body has one owner and every owner one body
    pub fn is_consistent(&self) -> bool {
        let expected = self.bodies.len() + usize::from(self.player_body.is_some());
        let collections = self.enemies.len()
            + self.bolts.len()
            + self.stars.len()
            + self.allies.len()
            + self.pickups.len();
        expected == self.physics.body_count()
            && expected == self.owners.len()
            && collections == self.bodies.len()
            && self.bodies.iter().all(|(&id, &body)| {
                let owned = matches!(
                    self.owners.get(&body),
                    Some(BodyOwner::Entity(_, owner)) if *owner == id
                );
                self.physics.contains(body) && owned
            })
            && self.player_body.is_none_or(|b| self.physics.contains(b))
    }

    /// Remove every entity, the player body, and all companion slots
    pub fn clear(&mut self) {
        self.enemies.clear();
        self.bolts.clear();
        self.stars.clear();
        self.allies.clear();
        self.pickups.clear();
        self.companions.clear();
        self.owners.clear();
        self.bodies.clear();
        self.player_body = None;
        self.physics.clear();
    }
}
