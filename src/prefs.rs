//! Persisted display preferences.
//!
//! The status table remembers which source groups are expanded between
//! runs. The map lives in a small JSON file (path set in the config);
//! loaded once per run, written back after every change. A missing or
//! unreadable file falls back to defaults rather than failing the command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::models::SourceType;

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default)]
    expanded: BTreeMap<SourceType, bool>,
}

#[derive(Debug)]
pub struct TogglePrefs {
    path: PathBuf,
    expanded: BTreeMap<SourceType, bool>,
}

impl TogglePrefs {
    /// Load the preference file, tolerating absence and corruption.
    pub fn load(path: &Path) -> Self {
        let expanded = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<PrefsFile>(&raw) {
                Ok(file) => file.expanded,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring malformed prefs file");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            expanded,
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = PrefsFile {
            expanded: self.expanded.clone(),
        };
        let raw = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Sources with no recorded preference start expanded.
    pub fn is_expanded(&self, source: SourceType) -> bool {
        self.expanded.get(&source).copied().unwrap_or(true)
    }

    /// Flip one source, leaving every other entry untouched.
    pub fn toggle(&mut self, source: SourceType) -> bool {
        let next = !self.is_expanded(source);
        self.expanded.insert(source, next);
        next
    }

    pub fn set(&mut self, source: SourceType, expanded: bool) {
        self.expanded.insert(source, expanded);
    }

    /// Whether a toggle-all over `sources` should expand or collapse:
    /// expand if fewer than half of them are currently expanded.
    pub fn should_expand_all(&self, sources: &[SourceType]) -> bool {
        let expanded = sources.iter().filter(|s| self.is_expanded(**s)).count();
        expanded < sources.len().div_ceil(2)
    }

    /// Write one state for every listed source at once.
    pub fn set_all(&mut self, sources: &[SourceType], expanded: bool) {
        for source in sources {
            self.expanded.insert(*source, expanded);
        }
    }

    /// Auto-expand for filter matches: only ever turns sources on, never
    /// collapses a source the user expanded by hand.
    pub fn expand_matching(&mut self, sources: &[SourceType]) {
        for source in sources {
            self.expanded.insert(*source, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn prefs_in(dir: &TempDir) -> TogglePrefs {
        TogglePrefs::load(&dir.path().join("prefs.json"))
    }

    #[test]
    fn test_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);
        prefs.set(SourceType::Web, false);
        prefs.set(SourceType::Slack, true);
        prefs.save().unwrap();

        let reloaded = prefs_in(&dir);
        assert!(!reloaded.is_expanded(SourceType::Web));
        assert!(reloaded.is_expanded(SourceType::Slack));
    }

    #[test]
    fn test_missing_and_malformed_files_fall_back() {
        let dir = TempDir::new().unwrap();
        let prefs = prefs_in(&dir);
        assert!(prefs.is_expanded(SourceType::Github));

        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        let prefs = TogglePrefs::load(&path);
        assert!(prefs.is_expanded(SourceType::Github));
    }

    #[test]
    fn test_toggle_flips_only_one_source() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);
        prefs.set(SourceType::Web, true);
        prefs.set(SourceType::Slack, true);

        assert!(!prefs.toggle(SourceType::Web));
        assert!(!prefs.is_expanded(SourceType::Web));
        assert!(prefs.is_expanded(SourceType::Slack));
    }

    #[test]
    fn test_toggle_all_threshold() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);
        let sources = [SourceType::Web, SourceType::Slack, SourceType::Github];

        // All expanded (the default): the control should collapse.
        assert!(!prefs.should_expand_all(&sources));

        prefs.set_all(&sources, false);
        assert!(prefs.should_expand_all(&sources));

        // One of three expanded is still fewer than half.
        prefs.set(SourceType::Web, true);
        assert!(prefs.should_expand_all(&sources));

        prefs.set(SourceType::Slack, true);
        assert!(!prefs.should_expand_all(&sources));
    }

    #[test]
    fn test_expand_matching_never_collapses() {
        let dir = TempDir::new().unwrap();
        let mut prefs = prefs_in(&dir);
        prefs.set(SourceType::Web, true);
        prefs.set(SourceType::Slack, false);

        prefs.expand_matching(&[SourceType::Slack]);
        assert!(prefs.is_expanded(SourceType::Slack));
        // Web was not in the match set but stays expanded.
        assert!(prefs.is_expanded(SourceType::Web));
    }
}
