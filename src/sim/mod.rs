//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - One owned `GameState`, no statics
//! - Seeded RNG only
//! - Time enters only through `TickInput::now_ms` and `dt`
//! - Physics only through the `PhysicsWorld` trait

pub mod ability;
pub mod collision;
pub mod combat;
pub mod physics;
pub mod progression;
pub mod registry;
pub mod run;
pub mod schedule;
pub mod snapshot;
pub mod spatial;
pub mod spawner;
pub mod state;
pub mod status;
pub mod tick;

pub use ability::{Ability, make_ability};
pub use physics::{BodyHandle, BodyLabel, CircleWorld, CollisionPair, PhysicsWorld};
pub use progression::{StatKey, Upgrade, UpgradeEffect};
pub use registry::{EntityId, EntityKind, EntityRegistry};
pub use snapshot::{RenderSnapshot, snapshot};
pub use state::{Archetype, EnemyKind, GameEvent, GameState, RunPhase};
pub use tick::{TickInput, tick};
