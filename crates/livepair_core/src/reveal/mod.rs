//! Post-export reveal in the platform file browser.
//!
//! After both pairings land, the file browser is asked to highlight the
//! outputs. A follow-up "open in viewer" action must not launch while the
//! browser activation is still in flight (it would steal focus), so the
//! coordinator polls the frontmost-application identity with a bounded
//! wall-clock timeout before returning. Timing out is not an error; it
//! only waives the ordering guarantee.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Platform file-browser collaborator.
pub trait FileBrowser: Send + Sync {
    /// Ask the browser to highlight the given paths.
    fn reveal(&self, paths: &[PathBuf]);

    /// Identity of the currently frontmost application, if known.
    fn frontmost_app_id(&self) -> Option<String>;
}

/// Coordinates reveal-then-wait ordering around the file browser.
pub struct RevealCoordinator {
    browser: Arc<dyn FileBrowser>,
    expected_app_id: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl RevealCoordinator {
    /// Create a coordinator expecting `expected_app_id` to become frontmost.
    pub fn new(browser: Arc<dyn FileBrowser>, expected_app_id: impl Into<String>) -> Self {
        Self {
            browser,
            expected_app_id: expected_app_id.into(),
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Override the activation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Reveal `paths`, then block until the browser is frontmost or the
    /// timeout elapses.
    ///
    /// Blocking: runs on the caller's worker thread, never the control
    /// thread.
    pub fn reveal_and_wait(&self, paths: &[PathBuf]) {
        self.browser.reveal(paths);

        let start = Instant::now();
        loop {
            if self.browser.frontmost_app_id().as_deref() == Some(self.expected_app_id.as_str()) {
                tracing::debug!(
                    "File browser frontmost after {:?}",
                    start.elapsed()
                );
                return;
            }
            if start.elapsed() >= self.timeout {
                tracing::debug!(
                    "File browser did not become frontmost within {:?}; proceeding",
                    self.timeout
                );
                return;
            }
            thread::sleep(self.poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct MockBrowser {
        revealed: Mutex<Vec<PathBuf>>,
        frontmost: Option<String>,
    }

    impl MockBrowser {
        fn new(frontmost: Option<&str>) -> Self {
            Self {
                revealed: Mutex::new(Vec::new()),
                frontmost: frontmost.map(String::from),
            }
        }
    }

    impl FileBrowser for MockBrowser {
        fn reveal(&self, paths: &[PathBuf]) {
            self.revealed.lock().extend_from_slice(paths);
        }

        fn frontmost_app_id(&self) -> Option<String> {
            self.frontmost.clone()
        }
    }

    #[test]
    fn returns_immediately_when_browser_is_frontmost() {
        let browser = Arc::new(MockBrowser::new(Some("org.files.browser")));
        let coordinator = RevealCoordinator::new(browser.clone(), "org.files.browser")
            .with_timeout(Duration::from_secs(5));

        let start = Instant::now();
        coordinator.reveal_and_wait(&[PathBuf::from("/out/a.JPG")]);

        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(browser.revealed.lock().as_slice(), &[PathBuf::from("/out/a.JPG")]);
    }

    #[test]
    fn times_out_without_error_when_never_frontmost() {
        let browser = Arc::new(MockBrowser::new(Some("some.other.app")));
        let coordinator = RevealCoordinator::new(browser, "org.files.browser")
            .with_timeout(Duration::from_millis(150))
            .with_poll_interval(Duration::from_millis(20));

        let start = Instant::now();
        coordinator.reveal_and_wait(&[PathBuf::from("/out/a.JPG")]);

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(150));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[test]
    fn unknown_frontmost_identity_polls_until_timeout() {
        let browser = Arc::new(MockBrowser::new(None));
        let coordinator = RevealCoordinator::new(browser, "org.files.browser")
            .with_timeout(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(20));

        coordinator.reveal_and_wait(&[]);
    }
}
