//! Colour theme preference

use std::sync::Arc;

use crate::KeyValueStore;

/// Storage key of the theme preference
pub const THEME_STORAGE_KEY: &str = "helfinka-theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Anything but `"light"` reads as dark
    pub fn from_stored(value: &str) -> Self {
        if value == "light" {
            Self::Light
        } else {
            Self::Dark
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted theme choice
#[derive(Clone)]
pub struct ThemePreference {
    storage: Arc<dyn KeyValueStore>,
}

impl ThemePreference {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn get(&self) -> Theme {
        match self.storage.get(THEME_STORAGE_KEY) {
            Ok(Some(value)) => Theme::from_stored(&value),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read theme preference");
                Theme::default()
            }
        }
    }

    pub fn set(&self, theme: Theme) {
        if let Err(e) = self.storage.set(THEME_STORAGE_KEY, theme.as_str()) {
            tracing::warn!(error = %e, "Failed to persist theme preference");
        }
    }

    /// Flip and persist, returning the new theme
    pub fn toggle(&self) -> Theme {
        let theme = self.get().toggled();
        self.set(theme);
        theme
    }
}

impl std::fmt::Debug for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemePreference").finish_non_exhaustive()
    }
}
