use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::app_dirs::AppDirs;
use crate::error::{Error, Result};
use crate::profile::Profile;

/// Durable home of the player's [`Profile`]
pub trait ProfileStore {
    /// Never fails: missing or corrupt data loads as a fresh default profile
    fn load(&self) -> Profile;
    fn save(&self, profile: &Profile) -> Result<()>;

    /// Load, record one personal best, and save again
    fn save_personal_best(&self, level_id: u32, wpm: f64, accuracy: f64) -> Result<Profile> {
        let mut profile = self.load();
        profile.record_personal_best(level_id, wpm, accuracy);
        self.save(&profile)?;
        Ok(profile)
    }

    /// Load, force one unlock flag, and save again
    fn set_unlocked(&self, level_id: u32, unlocked: bool) -> Result<Profile> {
        let mut profile = self.load();
        profile.set_unlocked(level_id, unlocked);
        self.save(&profile)?;
        Ok(profile)
    }
}

#[derive(Debug, Clone)]
pub struct FileProfileStore {
    path: PathBuf,
}

impl FileProfileStore {
    /// Store at the per-user profile path; errors if the directory cannot be created
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: AppDirs::profile_path()?,
        })
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Option<Value> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no profile yet, starting fresh");
                return None;
            }
            Err(err) => {
                info!(path = %self.path.display(), error = %err, "profile unreadable, starting fresh");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(doc) => Some(doc),
            Err(err) => {
                info!(path = %self.path.display(), error = %err, "profile corrupt, starting fresh");
                None
            }
        }
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn save_error(&self, source: io::Error) -> Error {
        Error::Save {
            path: self.path.clone(),
            source,
        }
    }
}

impl ProfileStore for FileProfileStore {
    fn load(&self) -> Profile {
        // an absent file still runs through merge and migrations
        let stored = self
            .read_document()
            .unwrap_or_else(|| Value::Object(Map::new()));
        match Profile::from_document(stored) {
            Ok(profile) => profile,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "profile did not decode, using defaults");
                Profile::default()
            }
        }
    }

    fn save(&self, profile: &Profile) -> Result<()> {
        let data = serde_json::to_vec_pretty(profile)?;
        let dir = self.dir();
        fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;

        // the temp file is removed on drop if anything below fails
        let mut tmp = tempfile::Builder::new()
            .prefix("profile.")
            .suffix(".json")
            .tempfile_in(dir)
            .map_err(|e| self.save_error(e))?;
        write_all_synced(&mut tmp, &data).map_err(|e| self.save_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.save_error(e.error))?;

        debug!(path = %self.path.display(), bytes = data.len(), "profile saved");
        Ok(())
    }
}

fn write_all_synced(tmp: &mut NamedTempFile, data: &[u8]) -> io::Result<()> {
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::PersonalBest;
    use assert_matches::assert_matches;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        assert_eq!(store.load(), Profile::default());
    }

    #[test]
    fn roundtrip_default_profile() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        let profile = store.load();
        store.save(&profile).unwrap();
        assert_eq!(store.load(), profile);
    }

    #[test]
    fn save_and_load_custom_profile() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        let mut profile = Profile::default();
        profile.record_personal_best(1, 21.4, 0.93);
        profile.unlock_next_level(1);
        profile.settings.seed = 7;
        profile.settings.color = false;
        profile
            .settings
            .extra
            .insert("layout".to_string(), json!("dvorak"));

        store.save(&profile).unwrap();
        assert_eq!(store.load(), profile);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(&path, b"\x00\xffnot json{{").unwrap();
        let store = FileProfileStore::with_path(&path);
        assert_eq!(store.load(), Profile::default());
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        store.save(&Profile::default()).unwrap();
        store.save(&Profile::default()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["profile.json".to_string()]);
    }

    #[test]
    fn failed_save_surfaces_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        // a directory where the file should go makes the final rename fail
        fs::create_dir(&path).unwrap();

        let store = FileProfileStore::with_path(&path);
        assert_matches!(
            store.save(&Profile::default()),
            Err(Error::Save { path: p, .. }) if p == path
        );

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["profile.json".to_string()]);
        assert!(path.is_dir());
    }

    #[test]
    fn save_under_a_file_reports_create_dir() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let store = FileProfileStore::with_path(blocker.join("profile.json"));
        assert_matches!(store.save(&Profile::default()), Err(Error::CreateDir { .. }));
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("profile.json");
        let store = FileProfileStore::with_path(&path);
        store.save(&Profile::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_personal_best_persists_through_canonical_ops() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        store.save_personal_best(2, 30.0, 0.8).unwrap();
        let profile = store.save_personal_best(2, 25.0, 0.95).unwrap();
        assert_eq!(profile.personal_best(2), Some(&PersonalBest::new(30.0, 0.95)));
        assert_eq!(store.load(), profile);
    }

    #[test]
    fn set_unlocked_persists() {
        let dir = tempdir().unwrap();
        let store = FileProfileStore::with_path(dir.path().join("profile.json"));
        store.set_unlocked(4, true).unwrap();
        assert!(store.load().is_unlocked(4));
        store.set_unlocked(4, false).unwrap();
        assert!(!store.load().is_unlocked(4));
    }

    #[test]
    fn legacy_file_is_migrated_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.json");
        fs::write(
            &path,
            r#"{"version":"1.0","pbs":{"1":{"wpm":14.2,"acc":0.88}},"unlocks":{"1":true,"2":true}}"#,
        )
        .unwrap();
        let profile = FileProfileStore::with_path(&path).load();
        assert_eq!(profile.personal_best(1), Some(&PersonalBest::new(14.2, 0.88)));
        assert!(profile.is_unlocked(2));
        assert_eq!(profile.settings.seed, 42);
    }
}
