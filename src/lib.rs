//! Starfall Survivors - a browser arena survivors-like
//!
//! Core modules:
//! - `sim`: Simulation (entities, abilities, collisions, progression, run state)
//! - `tuning`: Data-driven game balance and the static upgrade pool
//! - `settings`: Player preferences (audio, auto-pause)
//! - `error`: Error taxonomy for startup and configuration
//! - `renderer`: Canvas 2D drawing of the render snapshot
//! - `audio`: Web Audio dispatcher for simulation sound events

pub mod audio;
pub mod error;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::GameError;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal frame timestep (one simulation step per rendered frame)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Largest dt a single tick will integrate (tab switches, hitches)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions (world units, origin top-left)
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;

    /// Player body radius
    pub const PLAYER_RADIUS: f32 = 16.0;
    /// Player bolt radius
    pub const BOLT_RADIUS: f32 = 5.0;
    /// Starfall projectile radius
    pub const STAR_RADIUS: f32 = 9.0;
    /// XP orb radius
    pub const PICKUP_RADIUS: f32 = 7.0;
    /// Converted ally radius
    pub const ALLY_RADIUS: f32 = 11.0;

    /// Number of upgrades offered per level-up
    pub const UPGRADE_OFFER_COUNT: usize = 3;
}

/// Clamp a movement vector to unit length (diagonals stay at speed 1)
#[inline]
pub fn clamp_unit(v: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > 1.0 { v / len_sq.sqrt() } else { v }
}

/// Unit vector at `angle` radians
#[inline]
pub fn unit_at(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Format milliseconds as `mm:ss`
pub fn format_timer(ms: f64) -> String {
    let total_secs = (ms.max(0.0) / 1000.0).floor() as u64;
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_unit_diagonal() {
        let v = clamp_unit(Vec2::new(1.0, 1.0));
        assert!((v.length() - 1.0).abs() < 0.0001);
        let small = clamp_unit(Vec2::new(0.3, 0.0));
        assert_eq!(small, Vec2::new(0.3, 0.0));
    }

    #[test]
    fn test_format_timer() {
        assert_eq!(format_timer(0.0), "00:00");
        assert_eq!(format_timer(61_500.0), "01:01");
        assert_eq!(format_timer(-5.0), "00:00");
    }
}
