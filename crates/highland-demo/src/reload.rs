//! Hot-reload of `config.ron` while the fly-over runs.

use std::path::{Path, PathBuf};

use highland_config::{CliArgs, Config};
use tracing::{debug, info, warn};

/// Watches the config file and produces updated settings when it changes.
pub struct ConfigWatcher {
    dir: PathBuf,
    /// Settings as last read from disk, before CLI overrides.
    on_disk: Config,
}

impl ConfigWatcher {
    pub fn new(dir: &Path, on_disk: Config) -> Self {
        Self {
            dir: dir.to_path_buf(),
            on_disk,
        }
    }

    /// Re-read the file. Returns the effective settings, CLI overrides
    /// reapplied, when the file changed and the result validates.
    ///
    /// Invalid edits are logged and skipped; the next edit is compared
    /// against them, so fixing the file picks the change up again.
    pub fn poll(&mut self, args: &CliArgs) -> Option<Config> {
        let fresh = match self.on_disk.reload(&self.dir) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return None,
            Err(e) => {
                debug!("config reload skipped: {e}");
                return None;
            }
        };
        self.on_disk = fresh.clone();

        let mut effective = fresh;
        effective.apply_cli_overrides(args);
        match effective.validate() {
            Ok(()) => {
                info!("config.ron changed, applying new settings");
                Some(effective)
            }
            Err(e) => {
                warn!("ignoring edited config.ron: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// An untouched file yields nothing, even when CLI overrides differ from it.
    #[test]
    fn test_unchanged_file_is_quiet() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = Config::load_or_create(dir.path()).unwrap();
        let mut watcher = ConfigWatcher::new(dir.path(), on_disk);
        let args = CliArgs {
            view_radius: Some(2),
            ..Default::default()
        };
        assert!(watcher.poll(&args).is_none());
        assert!(watcher.poll(&args).is_none());
    }

    /// An edit is picked up once, with CLI overrides still winning.
    #[test]
    fn test_edit_applies_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = Config::load_or_create(dir.path()).unwrap();
        let mut watcher = ConfigWatcher::new(dir.path(), on_disk.clone());

        let mut edited = on_disk;
        edited.terrain.lod_factor = 2.0;
        edited.terrain.view_radius = 9;
        edited.save(dir.path()).unwrap();

        let args = CliArgs {
            view_radius: Some(3),
            ..Default::default()
        };
        let applied = watcher.poll(&args).unwrap();
        assert_eq!(applied.terrain.lod_factor, 2.0);
        assert_eq!(applied.terrain.view_radius, 3);
        assert!(watcher.poll(&args).is_none());
    }

    /// Edits that fail validation are not applied.
    #[test]
    fn test_invalid_edit_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let on_disk = Config::load_or_create(dir.path()).unwrap();
        let mut watcher = ConfigWatcher::new(dir.path(), on_disk.clone());

        let mut edited = on_disk;
        edited.terrain.chunk_size = 0;
        edited.save(dir.path()).unwrap();
        assert!(watcher.poll(&CliArgs::default()).is_none());

        edited.terrain.chunk_size = 32;
        edited.save(dir.path()).unwrap();
        let applied = watcher.poll(&CliArgs::default()).unwrap();
        assert_eq!(applied.terrain.chunk_size, 32);
    }
}
