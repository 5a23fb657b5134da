//! Configuration file watcher for hot reload.
//!
//! Every write to the config file is re-loaded and re-validated. A config
//! that fails either step is logged and dropped; the server keeps running
//! with the pipeline it already has.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Watches one config file and publishes every valid new version.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end that `HttpServer::run`
    /// consumes.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in notify's background thread.
    ///
    /// Updates stop when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(config) = reload_on(&event, &watched) {
                        if update_tx.send(config).is_err() {
                            debug!("Config receiver gone, dropping update");
                        }
                    }
                }
                Err(e) => error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// The config to publish for `event`, if any.
///
/// Only content changes and re-creations of the file trigger a reload.
/// Load or validation failures are logged and yield `None`.
fn reload_on(event: &Event, path: &Path) -> Option<AppConfig> {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return None;
    }

    info!(path = ?path, "Config file changed, reloading");
    match load_config(path) {
        Ok(config) => {
            debug!(aliveness_url = ?config.aliveness_url, "Reloaded config");
            Some(config)
        }
        Err(e) => {
            error!(error = %e, "Failed to reload config, keeping current configuration");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, EventKind, ModifyKind};
    use serde_json::json;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tokio::time::timeout;

    const INITIAL: &str = "ALIVENESS_URL = \"/a/\"\n";
    const INVALID: &str = "middleware = [\"not-a-stage\"]\n";

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // Overwrite in place with a single write so the watcher never sees a
    // truncated file. `content` must be at least as long as what it replaces.
    fn overwrite(path: &Path, content: &str) {
        let mut file = OpenOptions::new().write(true).open(path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    fn modified(path: &Path) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf())
    }

    #[test]
    fn test_modify_reloads() {
        let file = write_config(INITIAL);
        let config = reload_on(&modified(file.path()), file.path()).unwrap();
        assert_eq!(config.aliveness_url, Some(json!("/a/")));
    }

    #[test]
    fn test_create_reloads() {
        let file = write_config(INITIAL);
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(file.path().into());
        assert!(reload_on(&event, file.path()).is_some());
    }

    #[test]
    fn test_access_is_ignored() {
        let file = write_config(INITIAL);
        let event = Event::new(EventKind::Access(AccessKind::Any)).add_path(file.path().into());
        assert!(reload_on(&event, file.path()).is_none());
    }

    #[test]
    fn test_invalid_file_is_not_published() {
        let file = write_config(INVALID);
        assert!(reload_on(&modified(file.path()), file.path()).is_none());
    }

    #[test]
    fn test_missing_file_is_not_published() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.toml");
        assert!(reload_on(&modified(&path), &path).is_none());
    }

    #[tokio::test]
    async fn test_rewrite_publishes_new_config() {
        let file = write_config(INITIAL);
        let (watcher, mut rx) = ConfigWatcher::new(file.path());
        let _watcher = watcher.run().unwrap();

        overwrite(file.path(), "ALIVENESS_URL = \"/health-check/\"\n");

        let config = timeout(Duration::from_secs(10), async {
            loop {
                let config = rx.recv().await.unwrap();
                if config.aliveness_url == Some(json!("/health-check/")) {
                    break config;
                }
            }
        })
        .await
        .expect("no config update received");
        assert_eq!(config.aliveness_url, Some(json!("/health-check/")));
    }

    #[tokio::test]
    async fn test_invalid_rewrite_publishes_nothing() {
        let file = write_config(INITIAL);
        let (watcher, mut rx) = ConfigWatcher::new(file.path());
        let _watcher = watcher.run().unwrap();

        overwrite(file.path(), INVALID);
        assert!(
            timeout(Duration::from_millis(500), rx.recv()).await.is_err(),
            "invalid config was published"
        );

        // still watching after the failed reload
        overwrite(file.path(), "ALIVENESS_URL = [\"/health-check/\", \"/ready/\"]\n");
        let config = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no config update received")
            .unwrap();
        assert_eq!(
            config.aliveness_url,
            Some(json!(["/health-check/", "/ready/"]))
        );
    }
}
