//! Sandboxed save directory.
//!
//! Every path handed to the store is resolved lexically against its
//! canonical root before any file is read or written. Anything that would
//! land outside the root, directly or through a symbolic link, is refused
//! with `PathEscape`.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::rules::GameEngine;

use super::document::{from_document, SaveDocument, SaveInfo};
use super::error::{PersistenceError, Result};

const SAVE_EXTENSION: &str = "json";

/// Longest sanitised name kept in a file name.
const MAX_NAME_LEN: usize = 64;

/// Saves sharing one name and timestamp before `save` gives up.
const MAX_SAME_NAME: u32 = 100;

/// A directory of save files.
#[derive(Clone, Debug)]
pub struct SaveStore {
    root: PathBuf,
}

impl SaveStore {
    /// Use `root` as the save directory, creating it if needed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let root = normalise(&absolute).ok_or_else(|| PersistenceError::PathEscape(absolute.clone()))?;
        fs::create_dir_all(&root)?;
        Ok(Self {
            root: fs::canonicalize(&root)?,
        })
    }

    /// The platform data directory.
    ///
    /// - Linux: `~/.local/share/aggravation/saves`
    /// - macOS: `~/Library/Application Support/aggravation/saves`
    /// - Windows: `%APPDATA%\aggravation\saves`
    /// - Fallback: `./saves`
    pub fn open_default() -> Result<Self> {
        let dir = directories::ProjectDirs::from("", "", "aggravation")
            .map(|dirs| dirs.data_dir().join("saves"))
            .unwrap_or_else(|| PathBuf::from("./saves"));
        Self::new(dir)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.root
    }

    /// File name for a save called `name` made at `timestamp`.
    ///
    /// ```
    /// use aggravation::persist::SaveStore;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
    /// assert_eq!(SaveStore::file_name_for("Friday game", at), "Friday_game.json");
    /// assert_eq!(SaveStore::file_name_for("../../evil", at), "evil.json");
    /// assert_eq!(SaveStore::file_name_for("", at), "save_20240501_123000.json");
    /// ```
    #[must_use]
    pub fn file_name_for(name: &str, timestamp: DateTime<Utc>) -> String {
        let sanitised: String = name
            .chars()
            .filter_map(|ch| match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => Some(ch),
                ' ' | '/' | '\\' => Some('_'),
                _ => None,
            })
            .take(MAX_NAME_LEN)
            .collect();
        let sanitised = sanitised.trim_matches('_');

        if sanitised.is_empty() {
            format!("save_{}.{SAVE_EXTENSION}", timestamp.format("%Y%m%d_%H%M%S"))
        } else {
            format!("{sanitised}.{SAVE_EXTENSION}")
        }
    }

    /// Resolve `path` (absolute, or relative to the root) inside the store.
    ///
    /// Symbolic links below the root are refused, dangling ones included,
    /// so a resolved path can never reach outside the directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let escape = || PersistenceError::PathEscape(path.to_path_buf());
        let resolved = normalise(&self.root.join(path))
            .filter(|resolved| resolved.starts_with(&self.root) && *resolved != self.root)
            .ok_or_else(escape)?;

        let linked = resolved
            .ancestors()
            .take_while(|ancestor| *ancestor != self.root)
            .any(|ancestor| fs::symlink_metadata(ancestor).is_ok_and(|meta| meta.file_type().is_symlink()));
        if linked {
            return Err(escape());
        }
        Ok(resolved)
    }

    /// Save under a file name derived from `name`. Returns the written path.
    ///
    /// An existing save of the same name is kept; the new file gets the
    /// save time, and a counter if needed, appended to its name.
    pub fn save(&self, engine: &GameEngine, name: &str) -> Result<PathBuf> {
        let document = super::document::to_document(engine, name);
        let path = self.unused_path(name, document.timestamp)?;
        self.write(&path, &document)
    }

    /// Save to an explicit path inside the store, replacing any file there.
    pub fn save_to(&self, engine: &GameEngine, path: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let path = self.resolve(path)?;
        self.write(&path, &super::document::to_document(engine, name))
    }

    fn unused_path(&self, name: &str, timestamp: DateTime<Utc>) -> Result<PathBuf> {
        let file_name = Self::file_name_for(name, timestamp);
        let path = self.resolve(&file_name)?;
        if !taken(&path) {
            return Ok(path);
        }

        let stem = file_name.trim_end_matches(&format!(".{SAVE_EXTENSION}")).to_string();
        let stamped = format!("{stem}_{}", timestamp.format("%Y%m%d_%H%M%S"));
        for attempt in 1..=MAX_SAME_NAME {
            let candidate = match attempt {
                1 => format!("{stamped}.{SAVE_EXTENSION}"),
                n => format!("{stamped}_{n}.{SAVE_EXTENSION}"),
            };
            let path = self.resolve(candidate)?;
            if !taken(&path) {
                return Ok(path);
            }
        }
        Err(io::Error::new(io::ErrorKind::AlreadyExists, format!("too many saves named {stem}")).into())
    }

    fn write(&self, path: &Path, document: &SaveDocument) -> Result<PathBuf> {
        let temp_path = self.resolve(path.with_extension("json.tmp"))?;
        let json = document.to_json()?;

        fs::write(&temp_path, json)?;
        if let Err(err) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        tracing::debug!("Saved {:?} to {}", document.name, path.display());
        Ok(path.to_path_buf())
    }

    /// Read and parse a save file without restoring it.
    pub fn load_document(&self, path: impl AsRef<Path>) -> Result<SaveDocument> {
        let path = self.resolve(path)?;
        if !path.is_file() {
            return Err(PersistenceError::NotFound(path));
        }
        let json = fs::read_to_string(&path)?;
        SaveDocument::from_json(&json)
    }

    /// Restore the game saved at `path`.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<GameEngine> {
        let path = path.as_ref();
        let loaded = self
            .load_document(path)
            .and_then(|document| from_document(&document));

        match &loaded {
            Ok(engine) => tracing::debug!(
                "Loaded {}-player game from {} ({} to move)",
                engine.state().player_count(),
                path.display(),
                engine.current_player()
            ),
            Err(err) => tracing::warn!("Rejected save {}: {}", path.display(), err),
        }
        loaded
    }

    pub fn delete(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = self.resolve(path)?;
        if !path.is_file() {
            return Err(PersistenceError::NotFound(path));
        }
        fs::remove_file(&path)?;
        tracing::debug!("Deleted save {}", path.display());
        Ok(())
    }

    pub fn info(&self, path: impl AsRef<Path>) -> Result<SaveInfo> {
        let resolved = self.resolve(&path)?;
        let document = self.load_document(&resolved)?;
        Ok(SaveInfo::new(resolved, &document))
    }

    /// Every readable save, newest first. Unreadable files are skipped.
    pub fn list(&self) -> Result<Vec<SaveInfo>> {
        let mut saves = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            match self.info(&path) {
                Ok(info) => saves.push(info),
                Err(err) => tracing::warn!("Skipping save {}: {}", path.display(), err),
            }
        }

        saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.path.cmp(&b.path)));
        Ok(saves)
    }
}

/// Whether anything, a dangling link included, already sits at `path`.
fn taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Collapse `.` and `..` without touching the filesystem. `None` if `..`
/// climbs above the filesystem root.
fn normalise(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    return None;
                }
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalise() {
        assert_eq!(normalise(Path::new("/a/b/../c/./d")), Some(PathBuf::from("/a/c/d")));
        assert_eq!(normalise(Path::new("/a/../..")), None);
        assert_eq!(normalise(Path::new("/")), Some(PathBuf::from("/")));
    }

    #[test]
    fn test_file_name_sanitised() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        assert_eq!(SaveStore::file_name_for("valid name with spaces", at), "valid_name_with_spaces.json");
        assert_eq!(SaveStore::file_name_for("a/b/c", at), "a_b_c.json");
        assert_eq!(SaveStore::file_name_for("../../../etc/passwd", at), "etc_passwd.json");
        assert_eq!(SaveStore::file_name_for("..", at), "save_20240102_030405.json");
        assert_eq!(SaveStore::file_name_for("x".repeat(200).as_str(), at).len(), MAX_NAME_LEN + 5);
    }

    #[test]
    fn test_resolve_stays_inside() {
        let dir = tempfile::tempdir().unwrap();
        let store = SaveStore::new(dir.path()).unwrap();

        assert_eq!(store.resolve("game.json").unwrap(), store.dir().join("game.json"));
        assert_eq!(store.resolve("sub/../game.json").unwrap(), store.dir().join("game.json"));
        assert!(matches!(store.resolve("../game.json"), Err(PersistenceError::PathEscape(_))));
        assert!(matches!(store.resolve("/etc/passwd"), Err(PersistenceError::PathEscape(_))));
        assert!(matches!(store.resolve("."), Err(PersistenceError::PathEscape(_))));
    }
}
