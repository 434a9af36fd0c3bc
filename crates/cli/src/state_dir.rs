//! Platform-specific state directory management

use directories::ProjectDirs;
use std::path::PathBuf;
use tracing::warn;

const SESSION_FILE: &str = "session.json";

/// Manages platform-specific application directories
pub struct StateDir {
    /// Project directories from the directories crate
    project_dirs: Option<ProjectDirs>,
    /// Override directory for testing or custom installations
    override_dir: Option<PathBuf>,
}

impl StateDir {
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("", "", "panaderia");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Keep everything under `path`
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Directory for settings, the durable session and logs
    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        if let Some(project_dirs) = &self.project_dirs {
            project_dirs.data_dir().to_path_buf()
        } else {
            PathBuf::from("./.panaderia")
        }
    }

    /// Directory scoped to the login session
    ///
    /// Uses the platform runtime directory, which is cleared on logout or
    /// reboot, and falls back to the cache directory where there is none.
    pub fn runtime_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.join("run");
        }

        match &self.project_dirs {
            Some(dirs) => dirs
                .runtime_dir()
                .unwrap_or_else(|| dirs.cache_dir())
                .to_path_buf(),
            None => self.data_dir().join("run"),
        }
    }

    /// Durable tier, used when "remember me" is set
    pub fn durable_session_file(&self) -> PathBuf {
        self.data_dir().join(SESSION_FILE)
    }

    /// Ephemeral tier
    pub fn ephemeral_session_file(&self) -> PathBuf {
        self.runtime_dir().join(SESSION_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir().join("config.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.data_dir().join("cli.log")
    }
}

impl Default for StateDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_layout() {
        let dir = StateDir::with_override("/tmp/panaderia-test");
        assert_eq!(
            dir.durable_session_file(),
            PathBuf::from("/tmp/panaderia-test/session.json")
        );
        assert_eq!(
            dir.ephemeral_session_file(),
            PathBuf::from("/tmp/panaderia-test/run/session.json")
        );
        assert_eq!(
            dir.settings_file(),
            PathBuf::from("/tmp/panaderia-test/config.toml")
        );
    }

    #[test]
    fn test_tiers_are_distinct() {
        let dir = StateDir::new();
        assert_ne!(dir.durable_session_file(), dir.ephemeral_session_file());
    }
}
