//! Physics/collision boundary
//!
//! The simulation talks to a 2D collision engine only through
//! [`PhysicsWorld`]: create/remove circle bodies, push positions and
//! velocities, step, and read back the collision-start pairs for that step.
//!
//! [`CircleWorld`] is the bundled backend: uniform-grid broad-phase, circle
//! narrow-phase, category/mask filtering, and positional separation of solid
//! (non-sensor) pairs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::Vec2;

/// Opaque handle to a body owned by a physics world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(u32);

/// Dispatch label carried by every body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BodyLabel {
    Player,
    Enemy,
    /// Player bolt
    Projectile,
    Starfall,
    Pickup,
    Ally,
}

/// Collision category bits
pub mod category {
    pub const DEFAULT: u32 = 0x0001;
    pub const PLAYER: u32 = 0x0002;
    pub const ENEMY: u32 = 0x0004;
    pub const PROJECTILE: u32 = 0x0008;
    pub const PICKUP: u32 = 0x0010;
}

/// Category/mask pair; two bodies interact only if each one's mask
/// includes the other's category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionFilter {
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    pub const PLAYER: Self = Self::new(
        category::PLAYER,
        category::DEFAULT | category::ENEMY | category::PICKUP,
    );
    pub const ENEMY: Self = Self::new(
        category::ENEMY,
        category::DEFAULT | category::PLAYER | category::PROJECTILE,
    );
    pub const PROJECTILE: Self = Self::new(category::PROJECTILE, category::ENEMY);
    pub const PICKUP: Self = Self::new(category::PICKUP, category::PLAYER);
    pub const ALLY: Self = Self::new(category::DEFAULT, category::ENEMY);

    pub const fn new(category: u32, mask: u32) -> Self {
        Self { category, mask }
    }

    #[inline]
    pub fn collides_with(&self, other: &Self) -> bool {
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Body creation parameters
#[derive(Debug, Clone, Copy)]
pub struct BodyDesc {
    pub position: Vec2,
    pub radius: f32,
    pub label: BodyLabel,
    pub filter: CollisionFilter,
    /// Sensors report contacts but are never pushed apart
    pub sensor: bool,
}

impl BodyDesc {
    /// Circle body with the filter and sensor flag standard for `label`
    pub fn circle(position: Vec2, radius: f32, label: BodyLabel) -> Self {
        let (filter, sensor) = match label {
            BodyLabel::Player => (CollisionFilter::PLAYER, false),
            BodyLabel::Enemy => (CollisionFilter::ENEMY, false),
            BodyLabel::Projectile | BodyLabel::Starfall => (CollisionFilter::PROJECTILE, true),
            BodyLabel::Pickup => (CollisionFilter::PICKUP, true),
            BodyLabel::Ally => (CollisionFilter::ALLY, true),
        };
        Self {
            position,
            radius,
            label,
            filter,
            sensor,
        }
    }
}

/// One side of a collision pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub body: BodyHandle,
    pub label: BodyLabel,
}

/// Two bodies that started touching during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionPair {
    pub a: Contact,
    pub b: Contact,
}

/// Engine-facing primitives the simulation relies on
pub trait PhysicsWorld: std::fmt::Debug {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Returns false if the body was already gone
    fn remove_body(&mut self, body: BodyHandle) -> bool;
    fn contains(&self, body: BodyHandle) -> bool;
    fn set_position(&mut self, body: BodyHandle, position: Vec2);
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);
    fn position(&self, body: BodyHandle) -> Option<Vec2>;
    /// Integrate one step and return the pairs that started touching
    fn step(&mut self, dt: f32) -> Vec<CollisionPair>;
    fn body_count(&self) -> usize;
    fn clear(&mut self);
}

#[derive(Debug, Clone)]
struct Body {
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    label: BodyLabel,
    filter: CollisionFilter,
    sensor: bool,
}

/// Uniform grid keyed by cell coordinate
#[derive(Debug, Default)]
struct SpatialHash {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
}

impl SpatialHash {
    fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    fn cell_key(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    fn insert(&mut self, id: u32, p: Vec2) {
        let key = self.cell_key(p);
        self.cells.entry(key).or_default().push(id);
    }

    fn query_into(&self, p: Vec2, radius: f32, buf: &mut Vec<u32>) {
        buf.clear();
        let r = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell_key(p);
        for ix in (cx - r)..=(cx + r) {
            for iy in (cy - r)..=(cy + r) {
                if let Some(ids) = self.cells.get(&(ix, iy)) {
                    buf.extend_from_slice(ids);
                }
            }
        }
    }
}

/// Bundled circle-body world
#[derive(Debug)]
pub struct CircleWorld {
    bodies: BTreeMap<u32, Body>,
    next_handle: u32,
    grid: SpatialHash,
    /// Sensor pairs overlapping at the end of the last step
    touching: BTreeSet<(u32, u32)>,
}

impl Default for CircleWorld {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl CircleWorld {
    /// `cell_size` should be about twice the typical body radius
    pub fn new(cell_size: f32) -> Self {
        Self {
            bodies: BTreeMap::new(),
            next_handle: 1,
            grid: SpatialHash::new(cell_size.max(1.0)),
            touching: BTreeSet::new(),
        }
    }

    fn overlapping_pairs(&mut self) -> BTreeSet<(u32, u32)> {
        self.grid.cells.clear();
        let mut max_radius = 0.0_f32;
        for (&id, body) in &self.bodies {
            self.grid.insert(id, body.pos);
            max_radius = max_radius.max(body.radius);
        }

        let mut pairs = BTreeSet::new();
        let mut buf = Vec::new();
        for (&id, body) in &self.bodies {
            self.grid.query_into(body.pos, body.radius + max_radius, &mut buf);
            for &other_id in &buf {
                if other_id <= id {
                    continue;
                }
                let Some(other) = self.bodies.get(&other_id) else {
                    continue;
                };
                if !body.filter.collides_with(&other.filter) {
                    continue;
                }
                let reach = body.radius + other.radius;
                if body.pos.distance_squared(other.pos) < reach * reach {
                    pairs.insert((id, other_id));
                }
            }
        }
        pairs
    }

    fn separate(&mut self, a: u32, b: u32) {
        let (Some(ba), Some(bb)) = (self.bodies.get(&a), self.bodies.get(&b)) else {
            return;
        };
        let delta = bb.pos - ba.pos;
        let dist = delta.length();
        let overlap = ba.radius + bb.radius - dist;
        if overlap <= 0.0 {
            return;
        }
        let normal = if dist > 0.0001 { delta / dist } else { Vec2::X };
        let push = normal * (overlap * 0.5 + 0.01);
        if let Some(body) = self.bodies.get_mut(&a) {
            body.pos -= push;
        }
        if let Some(body) = self.bodies.get_mut(&b) {
            body.pos += push;
        }
    }

    fn contact(&self, id: u32) -> Option<Contact> {
        self.bodies.get(&id).map(|b| Contact {
            body: BodyHandle(id),
            label: b.label,
        })
    }
}

impl PhysicsWorld for CircleWorld {
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        self.bodies.insert(
            id,
            Body {
                pos: desc.position,
                vel: Vec2::ZERO,
                radius: desc.radius,
                label: desc.label,
                filter: desc.filter,
                sensor: desc.sensor,
            },
        );
        BodyHandle(id)
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        self.touching.retain(|&(a, b)| a != body.0 && b != body.0);
        self.bodies.remove(&body.0).is_some()
    }

    fn contains(&self, body: BodyHandle) -> bool {
        self.bodies.contains_key(&body.0)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body.0) {
            b.pos = position;
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.bodies.get_mut(&body.0) {
            b.vel = velocity;
        }
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.bodies.get(&body.0).map(|b| b.pos)
    }

    fn step(&mut self, dt: f32) -> Vec<CollisionPair> {
        for body in self.bodies.values_mut() {
            body.pos += body.vel * dt;
        }

        let overlapping = self.overlapping_pairs();
        let mut started = Vec::new();
        let mut still_touching = BTreeSet::new();

        for &(a, b) in &overlapping {
            let solid = match (self.bodies.get(&a), self.bodies.get(&b)) {
                (Some(ba), Some(bb)) => !ba.sensor && !bb.sensor,
                _ => continue,
            };
            // Solid pairs are pushed apart inside this step, so a resting
            // contact reports a fresh start every step
            if solid {
                self.separate(a, b);
            } else {
                still_touching.insert((a, b));
                if self.touching.contains(&(a, b)) {
                    continue;
                }
            }
            if let (Some(ca), Some(cb)) = (self.contact(a), self.contact(b)) {
                started.push(CollisionPair { a: ca, b: cb });
            }
        }

        self.touching = still_touching;
        started
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn clear(&mut self) {
        self.bodies.clear();
        self.touching.clear();
        self.grid.cells.clear();
    }
}
