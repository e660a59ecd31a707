//! Hands the current selection and the active ignore patterns to the parsing
//! engine, allowing at most one outstanding submission.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::error::CoreError;
use super::preset::PresetRegistry;
use super::selection::SelectionEngine;

/// Everything the parsing engine needs for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRequest {
    pub paths: Vec<String>,
    pub ignore_patterns: Vec<String>,
}

impl ParseRequest {
    /// Snapshots the selected leaves and the active preset's patterns.
    pub fn from_selection(selection: &SelectionEngine, presets: &PresetRegistry) -> Self {
        Self {
            paths: selection.resolved_leaf_paths(),
            ignore_patterns: presets.active_patterns(),
        }
    }
}

/// The external parsing engine.
#[async_trait]
pub trait ParseEngine: Send + Sync {
    async fn submit_parse(&self, request: &ParseRequest) -> anyhow::Result<()>;
}

/// Serializes submissions: a second call while one is outstanding is
/// rejected, never queued.
pub struct SubmissionCoordinator {
    engine: Arc<dyn ParseEngine>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SubmissionCoordinator {
    pub fn new(engine: Arc<dyn ParseEngine>) -> Self {
        Self {
            engine,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Submits `request` to the engine.
    ///
    /// Fails without calling the engine when there is nothing to parse or
    /// another submission is still running. Engine failures are returned as
    /// [`CoreError::Submission`] and are not retried.
    pub async fn submit(&self, request: ParseRequest) -> Result<(), CoreError> {
        if request.paths.is_empty() {
            return Err(CoreError::EmptySelection);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Rejected submission: another one is still running");
            return Err(CoreError::SubmissionInProgress);
        }
        let _guard = InFlightGuard(&self.in_flight);

        tracing::info!(
            "Submitting {} paths with {} ignore patterns",
            request.paths.len(),
            request.ignore_patterns.len()
        );

        match self.engine.submit_parse(&request).await {
            Ok(()) => {
                tracing::info!("Submission completed");
                Ok(())
            }
            Err(source) => {
                tracing::error!("Submission failed: {:#}", source);
                Err(CoreError::Submission { source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::{oneshot, Mutex};

    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ParseEngine for CountingEngine {
        async fn submit_parse(&self, _request: &ParseRequest) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("engine exploded");
            }
            Ok(())
        }
    }

    /// Blocks every call until the test releases it.
    struct GatedEngine {
        started: Mutex<Option<oneshot::Sender<()>>>,
        release: Mutex<Option<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl ParseEngine for GatedEngine {
        async fn submit_parse(&self, _request: &ParseRequest) -> anyhow::Result<()> {
            if let Some(started) = self.started.lock().await.take() {
                let _ = started.send(());
            }
            let release = self.release.lock().await.take();
            if let Some(release) = release {
                let _ = release.await;
            }
            Ok(())
        }
    }

    fn request(paths: &[&str]) -> ParseRequest {
        ParseRequest {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            ignore_patterns: vec![".git".to_string()],
        }
    }

    #[tokio::test]
    async fn test_empty_selection_never_reaches_the_engine() {
        let engine = Arc::new(CountingEngine::default());
        let coordinator = SubmissionCoordinator::new(engine.clone());

        let err = coordinator.submit(request(&[])).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptySelection));
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_submission_releases_the_flag() {
        let engine = Arc::new(CountingEngine::default());
        let coordinator = SubmissionCoordinator::new(engine.clone());

        coordinator.submit(request(&["a.txt"])).await.unwrap();
        coordinator.submit(request(&["a.txt"])).await.unwrap();
        assert_eq!(engine.calls.load(Ordering::SeqCst), 2);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_engine_failure_is_surfaced_without_retry() {
        let engine = Arc::new(CountingEngine {
            fail: true,
            ..Default::default()
        });
        let coordinator = SubmissionCoordinator::new(engine.clone());

        let err = coordinator.submit(request(&["a.txt"])).await.unwrap_err();
        match err {
            CoreError::Submission { source } => assert!(source.to_string().contains("exploded")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_second_submission_while_first_is_pending_is_rejected() {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        let engine = Arc::new(GatedEngine {
            started: Mutex::new(Some(started_tx)),
            release: Mutex::new(Some(release_rx)),
        });
        let coordinator = Arc::new(SubmissionCoordinator::new(engine));

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.submit(request(&["a.txt"])).await })
        };
        started_rx.await.unwrap();
        assert!(coordinator.is_in_flight());

        let err = coordinator.submit(request(&["b.txt"])).await.unwrap_err();
        assert!(matches!(err, CoreError::SubmissionInProgress));

        release_tx.send(()).unwrap();
        first.await.unwrap().unwrap();
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn test_request_snapshots_selection_and_active_preset() {
        use crate::core::pathset::normalize;
        use crate::core::preset::MemoryPresetStore;
        use crate::core::tree::build;

        let mut selection =
            SelectionEngine::new(build(&normalize(["/p/a/b.txt", "/p/a/c.txt", "/p/d.txt"]).unwrap()));
        selection.toggle("a/c.txt").unwrap();

        let mut presets = PresetRegistry::new(Arc::new(MemoryPresetStore::default()));
        presets
            .create("Git", vec![".git".into(), ".gitignore".into()])
            .await
            .unwrap();
        presets.select(Some("Git")).unwrap();

        let request = ParseRequest::from_selection(&selection, &presets);
        assert_eq!(request.paths, vec!["/p/a/b.txt", "/p/d.txt"]);
        assert_eq!(request.ignore_patterns, vec![".git", ".gitignore"]);
    }
}
