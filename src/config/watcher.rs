//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself: editors that
//! save by writing a new file and renaming it over the old one would
//! otherwise detach the watch after the first save.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::{load_config, ConfigError};
use crate::config::schema::SslConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<SslConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<SslConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in a background thread.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = self.path.file_name().map(OsString::from);
        let path = self.path.clone();
        let tx = self.update_tx;
        // Several events usually fire per save; only changed content is sent.
        let last_seen = Mutex::new(std::fs::read_to_string(&path).ok());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !is_relevant(&event, file_name.as_deref()) {
                        return;
                    }
                    let content = std::fs::read_to_string(&path).ok();
                    if let Ok(mut last) = last_seen.lock() {
                        if content.is_some() && *last == content {
                            return;
                        }
                        *last = content;
                    }

                    tracing::info!(path = ?path, "Config file change detected, reloading");
                    match load_config(&path) {
                        Ok(config) => {
                            if tx.send(config).is_err() {
                                tracing::debug!("Config receiver dropped; ignoring update");
                            }
                        }
                        Err(ConfigError::Validation(errors)) => {
                            for error in &errors {
                                tracing::error!(error = %error, "Invalid config");
                            }
                            tracing::error!("Keeping current configuration");
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to reload config; keeping current configuration");
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// A create, modify or rename event touching the watched file.
fn is_relevant(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
        return false;
    }
    match file_name {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_events() {
        let name = Some(std::ffi::OsStr::new("ssl-helper.toml"));
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/etc/app/ssl-helper.toml"),
            name
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/etc/app/ssl-helper.toml"),
            name
        ));
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/etc/app/other.toml"),
            name
        ));
        assert!(!is_relevant(
            &event(EventKind::Remove(RemoveKind::File), "/etc/app/ssl-helper.toml"),
            name
        ));
    }

    #[tokio::test]
    async fn test_change_is_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ssl-helper.toml");
        std::fs::write(&path, "hostname = \"example.com\"\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        std::fs::write(&path, "hostname = \"example.org\"\nhttps_port = 8443\n").unwrap();

        let config = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("no config update received")
            .unwrap();
        assert_eq!(config.hostname.as_deref(), Some("example.org"));
        assert_eq!(config.effective_https_port(), 8443);
    }
}
