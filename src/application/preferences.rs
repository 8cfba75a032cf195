use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::storage::{KeyValueStorage, StorageError, THEME_KEY};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Light/dark choice, stored under its own key and independent of the tasks.
pub struct ThemePreference<S: KeyValueStorage> {
    storage: S,
    theme: Theme,
}

impl<S: KeyValueStorage> ThemePreference<S> {
    pub async fn load(storage: S) -> Self {
        let theme = match storage.get(THEME_KEY).await {
            Ok(Some(raw)) if raw == "dark" => Theme::Dark,
            _ => Theme::Light,
        };
        Self { storage, theme }
    }

    pub fn theme(&self) -> Theme { self.theme }

    pub async fn set(&mut self, theme: Theme) -> Result<Theme, StorageError> {
        self.theme = theme;
        debug!(theme = theme.as_str(), "theme changed");
        self.storage.set(THEME_KEY, theme.as_str()).await?;
        Ok(theme)
    }

    pub async fn toggle(&mut self) -> Result<Theme, StorageError> {
        let next = self.theme.toggled();
        self.set(next).await
    }
}
