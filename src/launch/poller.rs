//! Document readiness polling.
//!
//! The host creates a document as soon as a binary is opened, but names it with
//! a placeholder until initial analysis has finished. A document is ready once
//! its name is real and, when the caller knows which file it opened, the host
//! reports that file as the document's executable path.

use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tokio::time::error::Elapsed;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tracing::{debug, info};

/// Substring of the host's placeholder names ("Untitled 1", "Untitled 2", ...).
pub const PLACEHOLDER_MARKER: &str = "Untitle";
/// Delay between polls.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Upper bound on any single wait.
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// The control port is not accepting connections yet.
    #[error("host not reachable yet: {0}")]
    Transient(String),
    #[error("polling failed: {0}")]
    Fatal(String),
    #[error("timed out after {}s waiting for {what}", .waited.as_secs())]
    Timeout { what: &'static str, waited: Duration },
}

/// Where the poller reads the live document list from.
pub trait DocumentSource {
    fn list_documents(&self) -> impl Future<Output = Result<Vec<String>, PollError>> + Send;

    /// Executable path the host recorded for `name`, if any.
    fn document_path(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, PollError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Analyzing,
    Ready,
}

/// A document observed in the host, identified by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRef {
    pub name: String,
    pub readiness: Readiness,
}

impl DocumentRef {
    fn ready(name: &str) -> Self {
        Self {
            name: name.to_string(),
            readiness: Readiness::Ready,
        }
    }
}

/// Readiness state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Searching,
    /// A new document appeared but is still a placeholder or its path does
    /// not match yet.
    FoundUnready(String),
    Ready(DocumentRef),
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    /// `None` polls forever.
    pub timeout: Option<Duration>,
    pub placeholder_marker: String,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Some(Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS)),
            placeholder_marker: PLACEHOLDER_MARKER.to_string(),
        }
    }
}

pub struct Poller<S> {
    source: S,
    config: PollConfig,
    /// Shared deadline; overrides the per-wait `config.timeout` when set.
    deadline: Option<Instant>,
}

impl<S: DocumentSource> Poller<S> {
    pub fn new(source: S, config: PollConfig) -> Self {
        Self {
            source,
            config,
            deadline: None,
        }
    }

    /// Bound every wait by one instant instead of a fresh `config.timeout`.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn is_placeholder(&self, name: &str) -> bool {
        name.contains(&self.config.placeholder_marker)
    }

    /// Run `fut` under the shared deadline, or the configured timeout.
    async fn bounded<T>(
        &self,
        what: &'static str,
        fut: impl Future<Output = Result<T, PollError>>,
    ) -> Result<T, PollError> {
        let started = Instant::now();
        let expired = |_: Elapsed| PollError::Timeout {
            what,
            waited: started.elapsed(),
        };
        match (self.deadline, self.config.timeout) {
            (Some(deadline), _) => timeout_at(deadline, fut).await.map_err(expired)?,
            (None, Some(limit)) => timeout(limit, fut).await.map_err(expired)?,
            (None, None) => fut.await,
        }
    }

    /// Read the document list, retrying while the host is unreachable.
    pub async fn snapshot(&self) -> Result<Vec<String>, PollError> {
        self.bounded("document list", async {
            loop {
                match self.source.list_documents().await {
                    Ok(docs) => return Ok(docs),
                    Err(PollError::Transient(e)) => debug!(error = %e, "Host not reachable yet"),
                    Err(e) => return Err(e),
                }
                sleep(self.config.interval).await;
            }
        })
        .await
    }

    /// Wait until a document named exactly `name` is listed.
    pub async fn wait_for_document(&self, name: &str) -> Result<(), PollError> {
        let started = Instant::now();
        self.bounded("document", async {
            loop {
                match self.source.list_documents().await {
                    Ok(docs) if docs.iter().any(|d| d == name) => return Ok(()),
                    Ok(_) => {}
                    Err(PollError::Transient(e)) => debug!(error = %e, "Host not reachable yet"),
                    Err(e) => return Err(e),
                }
                sleep(self.config.interval).await;
            }
        })
        .await?;
        info!(
            document = %name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document available"
        );
        Ok(())
    }

    /// Wait for any new, non-placeholder document relative to `before`.
    pub async fn wait_for_new_document(&self, before: &[String]) -> Result<DocumentRef, PollError> {
        self.wait_until_ready(before, None).await
    }

    /// Wait for a document that is not in `before` to become ready.
    pub async fn wait_until_ready(
        &self,
        before: &[String],
        target_path: Option<&str>,
    ) -> Result<DocumentRef, PollError> {
        let before: HashSet<&str> = before.iter().map(String::as_str).collect();
        let started = Instant::now();
        let mut state = PollState::Searching;

        let doc = self
            .bounded("document readiness", async {
                loop {
                    match self.step(&state, &before, target_path).await {
                        Ok(PollState::Ready(doc)) => return Ok(doc),
                        Ok(next) => {
                            if next != state {
                                if let PollState::FoundUnready(name) = &next {
                                    info!(document = %name, "Found new document, waiting for analysis");
                                }
                                state = next;
                            }
                        }
                        Err(PollError::Transient(e)) => debug!(error = %e, "Host not reachable yet"),
                        Err(e) => return Err(e),
                    }
                    sleep(self.config.interval).await;
                }
            })
            .await?;

        info!(
            document = %doc.name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document ready"
        );
        Ok(doc)
    }

    /// One observation of the document list.
    pub async fn step(
        &self,
        state: &PollState,
        before: &HashSet<&str>,
        target_path: Option<&str>,
    ) -> Result<PollState, PollError> {
        let docs = self.source.list_documents().await?;
        match state {
            PollState::Searching => {
                let new: Vec<&String> = docs
                    .iter()
                    .filter(|d| !before.contains(d.as_str()))
                    .collect();
                match new.as_slice() {
                    [] => Ok(PollState::Searching),
                    [only] if !self.is_placeholder(only) => {
                        if self.path_matches(only, target_path).await? {
                            Ok(PollState::Ready(DocumentRef::ready(only)))
                        } else {
                            Ok(PollState::FoundUnready((*only).clone()))
                        }
                    }
                    [first, ..] => Ok(PollState::FoundUnready((*first).clone())),
                }
            }
            PollState::FoundUnready(candidate) => {
                for doc in &docs {
                    if self.is_placeholder(doc) {
                        continue;
                    }
                    let known_before = before.contains(doc.as_str());
                    if target_path.is_none() && known_before {
                        continue;
                    }
                    if self.path_matches(doc, target_path).await? {
                        return Ok(PollState::Ready(DocumentRef::ready(doc)));
                    }
                }
                Ok(PollState::FoundUnready(candidate.clone()))
            }
            PollState::Ready(doc) => Ok(PollState::Ready(doc.clone())),
        }
    }

    async fn path_matches(&self, name: &str, target_path: Option<&str>) -> Result<bool, PollError> {
        let Some(target) = target_path else {
            return Ok(true);
        };
        let path = self.source.document_path(name).await?;
        Ok(path.as_deref() == Some(target))
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::{DocumentSource, PollError};
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays a fixed sequence of document lists; the last frame repeats.
    pub(crate) struct ScriptedSource {
        frames: Mutex<VecDeque<Result<Vec<String>, String>>>,
        paths: HashMap<String, String>,
        pub(crate) observations: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn new(frames: Vec<Result<Vec<&str>, &str>>) -> Self {
            let frames = frames
                .into_iter()
                .map(|f| {
                    f.map(|docs| docs.into_iter().map(String::from).collect())
                        .map_err(String::from)
                })
                .collect();
            Self {
                frames: Mutex::new(frames),
                paths: HashMap::new(),
                observations: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_path(mut self, name: &str, path: &str) -> Self {
            self.paths.insert(name.to_string(), path.to_string());
            self
        }

        pub(crate) fn observed(&self) -> usize {
            self.observations.load(Ordering::SeqCst)
        }
    }

    impl DocumentSource for ScriptedSource {
        async fn list_documents(&self) -> Result<Vec<String>, PollError> {
            self.observations.fetch_add(1, Ordering::SeqCst);
            let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
            let frame = if frames.len() > 1 {
                frames.pop_front()
            } else {
                frames.front().cloned()
            };
            match frame {
                Some(Ok(docs)) => Ok(docs),
                Some(Err(e)) => Err(PollError::Transient(e)),
                None => Ok(Vec::new()),
            }
        }

        async fn document_path(&self, name: &str) -> Result<Option<String>, PollError> {
            Ok(self.paths.get(name).cloned())
        }
    }
}
