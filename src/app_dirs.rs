use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const APP_NAME: &str = "TimedTyper";
pub const PROFILE_FILE: &str = "profile.json";

/// Overrides the profile location entirely
pub const PROFILE_ENV: &str = "TIMED_TYPER_PROFILE";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Per-user data directory, without touching the filesystem
    pub fn data_dir() -> Option<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            Some(proj_dirs.data_local_dir().to_path_buf())
        } else {
            std::env::var_os("HOME").map(|home| PathBuf::from(home).join(APP_NAME))
        }
    }

    /// Resolve the profile path, creating its directory if needed.
    /// Failing to create the directory is fatal: progress could never be saved.
    pub fn profile_path() -> Result<PathBuf> {
        let path = match std::env::var_os(PROFILE_ENV) {
            Some(custom) => PathBuf::from(custom),
            None => Self::data_dir().ok_or(Error::DataDir)?.join(PROFILE_FILE),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn profile_path_honours_env_and_reports_create_dir() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("nested").join("me.json");
        std::env::set_var(PROFILE_ENV, &custom);
        let resolved = AppDirs::profile_path();

        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        std::env::set_var(PROFILE_ENV, blocker.join("me.json"));
        let blocked = AppDirs::profile_path();
        std::env::remove_var(PROFILE_ENV);

        assert_eq!(resolved.unwrap(), custom);
        assert!(dir.path().join("nested").is_dir());
        assert_matches!(blocked, Err(Error::CreateDir { path, .. }) if path == blocker);
    }

    #[test]
    fn data_dir_mentions_app_name() {
        if let Some(dir) = AppDirs::data_dir() {
            let dir = dir.to_string_lossy().to_lowercase();
            assert!(dir.contains(&APP_NAME.to_lowercase()));
        }
    }
}
