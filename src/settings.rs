//! Remembered start-form inputs
//!
//! Persisted to LocalStorage so the player name and difficulty survive
//! page reloads and prefill the form.

use serde::{Deserialize, Serialize};

use crate::sim::Difficulty;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Last player name entered on the start form
    pub player: String,
    /// Last selected difficulty tier
    pub difficulty: Difficulty,
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "fly_swat_settings";

    /// Load remembered inputs from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded remembered form inputs");
                    return settings;
                }
            }
        }

        Self::default()
    }

    /// Save remembered inputs to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            player: "anna".to_string(),
            difficulty: Difficulty::Hard,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.player, "anna");
        assert_eq!(back.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_default_is_easy_and_anonymous() {
        let settings = Settings::default();
        assert!(settings.player.is_empty());
        assert_eq!(settings.difficulty, Difficulty::Easy);
    }
}
