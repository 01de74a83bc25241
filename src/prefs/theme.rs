//! Dark/light theme preference.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{PreferenceStore, PrefsError};

/// Preference key the theme is stored under.
pub const THEME_KEY: &str = "theme";

/// Page color scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    /// Interpret a stored value. Only an exact `"dark"` selects dark mode.
    #[must_use]
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    /// Label and icon name of the toggle button, which offers the other mode.
    #[must_use]
    pub fn toggle_label(self) -> (&'static str, &'static str) {
        match self {
            Self::Dark => ("Light Mode", "sun"),
            Self::Light => ("Dark Mode", "moon"),
        }
    }

    /// Read the persisted theme from `store`.
    pub fn load(store: &dyn PreferenceStore) -> Result<Self, PrefsError> {
        Ok(Self::from_stored(store.get(THEME_KEY)?.as_deref()))
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings read once at startup and injected into the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub theme: ThemePreference,
}

impl Settings {
    pub fn load(store: &dyn PreferenceStore) -> Result<Self, PrefsError> {
        Ok(Self {
            theme: ThemePreference::load(store)?,
        })
    }
}

/// Current theme plus the store it is written through.
#[derive(Debug)]
pub struct ThemeToggle {
    store: Arc<dyn PreferenceStore>,
    current: RwLock<ThemePreference>,
}

impl ThemeToggle {
    #[must_use]
    pub fn new(store: Arc<dyn PreferenceStore>, settings: Settings) -> Self {
        Self {
            store,
            current: RwLock::new(settings.theme),
        }
    }

    #[must_use]
    pub fn current(&self) -> ThemePreference {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Flip the theme and persist it. The in-memory value only changes once
    /// the store accepted the write.
    pub fn toggle(&self) -> Result<ThemePreference, PrefsError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = current.toggled();
        self.store.set(THEME_KEY, next.as_str())?;
        *current = next;

        info!(name: "theme.toggled", theme = %next, "Theme preference updated");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferenceStore;

    #[test]
    fn test_unknown_values_fall_back_to_light() {
        assert_eq!(ThemePreference::from_stored(None), ThemePreference::Light);
        assert_eq!(
            ThemePreference::from_stored(Some("Dark")),
            ThemePreference::Light
        );
        assert_eq!(
            ThemePreference::from_stored(Some("dark")),
            ThemePreference::Dark
        );
    }

    #[test]
    fn test_toggle_twice_restores_persisted_value() {
        let store = Arc::new(MemoryPreferenceStore::new());
        store.set(THEME_KEY, "dark").unwrap();

        let settings = Settings::load(store.as_ref()).unwrap();
        let toggle = ThemeToggle::new(Arc::clone(&store) as Arc<dyn PreferenceStore>, settings);
        assert_eq!(toggle.current(), ThemePreference::Dark);

        assert_eq!(toggle.toggle().unwrap(), ThemePreference::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));

        assert_eq!(toggle.toggle().unwrap(), ThemePreference::Dark);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_toggle_label_offers_other_mode() {
        assert_eq!(ThemePreference::Dark.toggle_label(), ("Light Mode", "sun"));
        assert_eq!(ThemePreference::Light.toggle_label(), ("Dark Mode", "moon"));
    }
}
