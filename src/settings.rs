//! Player preferences
//!
//! Persisted in LocalStorage on the web. Runs themselves are never saved.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Pause the run when the window loses focus
    pub auto_pause_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            auto_pause_on_blur: true,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "starfall_survivors_settings";

    /// Volume actually sent to the audio dispatcher
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0) * self.sfx_volume.clamp(0.0, 1.0)
        }
    }

    /// Parse stored JSON, falling back to defaults for anything missing
    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }

    /// Read from LocalStorage, defaults when absent or unreadable
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = local_storage().and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());
        match stored.as_deref().map(Self::from_json) {
            Some(Some(settings)) => {
                log::info!("Loaded settings from LocalStorage");
                settings
            }
            Some(None) => {
                log::warn!("Ignoring unreadable stored settings");
                Self::default()
            }
            None => Self::default(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let (Some(storage), Ok(json)) = (local_storage(), serde_json::to_string(self)) else {
            return;
        };
        if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
            log::warn!("Could not persist settings");
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No {} outside the browser, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_volume() {
        let mut s = Settings::default();
        assert!((s.effective_volume() - 0.8).abs() < 1e-6);
        s.sfx_volume = 0.5;
        assert!((s.effective_volume() - 0.4).abs() < 1e-6);
        s.muted = true;
        assert_eq!(s.effective_volume(), 0.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{ "muted": true }"#).unwrap();
        assert!(s.muted);
        assert!(s.auto_pause_on_blur);
        assert_eq!(s.master_volume, 0.8);
        assert!(Settings::from_json("garbage").is_none());
    }
}
