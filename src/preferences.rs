//! Persisted UI preferences for list screens.
//!
//! A [`PreferenceStore`] is opened by the screen that needs it, writes through
//! to its YAML file on every change and is closed with the screen. There is
//! no process-wide instance.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ListError, Result};

/// How a list screen lays out its items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Browse,
    Grid,
    Table,
}

enum_display_fromstr!(
    ViewMode,
    crate::error::ListError::invalid_view_mode,
    {
        Browse => "browse",
        Grid => "grid",
        Table => "table",
    }
);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub view_mode: ViewMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    preferences: Preferences,
}

impl PreferenceStore {
    /// Load preferences from `path`. A missing or unreadable file yields the
    /// defaults; it is rewritten on the first change.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = match load(&path) {
            Ok(Some(preferences)) => preferences,
            Ok(None) => Preferences::default(),
            Err(e) => {
                warn!("ignoring preferences at {}: {e}", path.display());
                Preferences::default()
            }
        };

        Self { path, preferences }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn view_mode(&self) -> ViewMode {
        self.preferences.view_mode
    }

    pub fn page_size(&self) -> Option<u32> {
        self.preferences.page_size
    }

    /// Stored page size, or `fallback` when none was chosen yet
    pub fn page_size_or(&self, fallback: u32) -> u32 {
        self.preferences.page_size.unwrap_or(fallback)
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) -> Result<()> {
        self.preferences.view_mode = view_mode;
        self.persist()
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Result<()> {
        self.preferences.page_size = Some(page_size.max(1));
        self.persist()
    }

    /// Release the store, handing back the final preferences.
    pub fn close(self) -> Preferences {
        self.preferences
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml_ng::to_string(&self.preferences)?;
        fs::write(&self.path, content).map_err(|e| {
            ListError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to write preferences at {}: {}",
                    self.path.display(),
                    e
                ),
            ))
        })?;
        debug!("saved preferences to {}", self.path.display());
        Ok(())
    }
}

fn load(path: &Path) -> Result<Option<Preferences>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let mut preferences: Preferences = serde_yaml_ng::from_str(&content)?;
    if preferences.page_size == Some(0) {
        preferences.page_size = None;
    }
    Ok(Some(preferences))
}
