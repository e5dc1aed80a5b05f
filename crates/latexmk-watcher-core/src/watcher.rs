//! Artifact watcher
//!
//! Polls a file's modification time and runs an action each time it moves
//! past the last time seen. The baseline is the wall-clock time the watcher
//! was created, not the file's mtime: an artifact that is already on disk
//! only triggers once it is rebuilt.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Callback run when the watched file changes
pub type Action = Box<dyn FnMut(&Path) + Send + 'static>;

/// Watches one file for modification
pub struct Watcher {
    path: PathBuf,
    interval: Duration,
    action: Action,
    last_seen: SystemTime,
}

impl Watcher {
    /// Create an idle watcher; nothing is polled until [`Watcher::start`]
    pub fn new<F>(path: impl Into<PathBuf>, interval: Duration, action: F) -> Self
    where
        F: FnMut(&Path) + Send + 'static,
    {
        Self {
            path: path.into(),
            interval,
            action: Box::new(action),
            last_seen: SystemTime::now(),
        }
    }

    /// Replace the baseline timestamp
    pub fn with_baseline(mut self, baseline: SystemTime) -> Self {
        self.last_seen = baseline;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Latest modification time acted upon (or the baseline)
    pub fn last_seen(&self) -> SystemTime {
        self.last_seen
    }

    /// Check the file once, running the action if it changed
    ///
    /// Returns whether the action ran. A missing file is not an error.
    pub fn tick(&mut self) -> bool {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "artifact does not exist yet");
                return false;
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to stat artifact: {}", e);
                return false;
            }
        };

        if modified <= self.last_seen {
            return false;
        }

        info!(path = %self.path.display(), "artifact updated");
        (self.action)(&self.path);
        self.last_seen = modified;
        true
    }

    /// Start polling in a background task
    ///
    /// The first check happens one interval from now. A slow check delays the
    /// next one instead of letting ticks pile up. Must be called from within a
    /// tokio runtime.
    pub fn start(mut self) -> WatchHandle {
        let path = self.path.clone();
        let period = self.interval.max(Duration::from_millis(1));

        debug!(path = %path.display(), interval_ms = period.as_millis() as u64, "starting watcher");

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                self.tick();
            }
        });

        WatchHandle { path, task }
    }
}

/// A running watcher
#[derive(Debug)]
pub struct WatchHandle {
    path: PathBuf,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling. The action will not run again.
    pub fn stop(&self) {
        debug!(path = %self.path.display(), "stopping watcher");
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn counting_watcher(path: &Path, interval: Duration) -> (Watcher, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let watcher = Watcher::new(path, interval, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (watcher, fired)
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_missing_file_never_fires() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        let (mut watcher, fired) = counting_watcher(&path, Duration::from_millis(10));

        for _ in 0..5 {
            assert!(!watcher.tick());
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_older_file_does_not_fire() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        fs::write(&path, "old").unwrap();

        let t0 = SystemTime::now();
        set_mtime(&path, t0 - Duration::from_secs(5));
        let (watcher, fired) = counting_watcher(&path, Duration::from_millis(10));
        let mut watcher = watcher.with_baseline(t0);

        assert!(!watcher.tick());
        assert!(!watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        set_mtime(&path, t0 + Duration::from_secs(1));
        assert!(watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_baseline_is_construction_time_not_file_mtime() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        fs::write(&path, "old").unwrap();
        set_mtime(&path, SystemTime::now() - Duration::from_secs(5));

        let (mut watcher, fired) = counting_watcher(&path, Duration::from_millis(10));
        let constructed = watcher.last_seen();
        assert!(constructed > fs::metadata(&path).unwrap().modified().unwrap());

        assert!(!watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        set_mtime(&path, constructed + Duration::from_secs(1));
        assert!(watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fires_once_per_change() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        fs::write(&path, "pdf").unwrap();

        let t0 = SystemTime::now();
        let (watcher, fired) = counting_watcher(&path, Duration::from_millis(10));
        let mut watcher = watcher.with_baseline(t0);

        set_mtime(&path, t0 + Duration::from_secs(1));
        assert!(watcher.tick());
        assert!(!watcher.tick());
        assert!(!watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(
            watcher.last_seen(),
            fs::metadata(&path).unwrap().modified().unwrap()
        );

        set_mtime(&path, t0 + Duration::from_secs(2));
        assert!(watcher.tick());
        assert!(!watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_recreated_with_older_mtime_does_not_fire() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        fs::write(&path, "pdf").unwrap();

        let t0 = SystemTime::now();
        let (watcher, fired) = counting_watcher(&path, Duration::from_millis(10));
        let mut watcher = watcher.with_baseline(t0);

        set_mtime(&path, t0 + Duration::from_secs(10));
        assert!(watcher.tick());

        fs::remove_file(&path).unwrap();
        assert!(!watcher.tick());

        fs::write(&path, "rebuilt").unwrap();
        set_mtime(&path, t0 + Duration::from_secs(5));
        assert!(!watcher.tick());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_action_receives_watched_path() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        fs::write(&path, "pdf").unwrap();

        let seen = Arc::new(std::sync::Mutex::new(None));
        let sink = seen.clone();
        let t0 = SystemTime::now();
        let mut watcher = Watcher::new(&path, Duration::from_millis(10), move |p| {
            *sink.lock().unwrap() = Some(p.to_path_buf());
        })
        .with_baseline(t0);

        set_mtime(&path, t0 + Duration::from_secs(1));
        watcher.tick();
        assert_eq!(seen.lock().unwrap().as_deref(), Some(path.as_path()));
    }

    #[tokio::test]
    async fn test_started_watcher_polls_and_stops() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("main.pdf");
        let (watcher, fired) = counting_watcher(&path, Duration::from_millis(10));
        let baseline = watcher.last_seen();

        let handle = watcher.start();
        assert!(handle.is_running());
        assert_eq!(handle.path(), path.as_path());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Stage the file elsewhere so the watcher never sees the write's own mtime
        let staged = temp.path().join("staged.pdf");
        fs::write(&staged, "pdf").unwrap();
        set_mtime(&staged, baseline + Duration::from_secs(1));
        fs::rename(&staged, &path).unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        handle.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_running());

        set_mtime(&path, baseline + Duration::from_secs(2));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
