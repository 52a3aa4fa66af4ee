//! Exam runner: drives the exam state machine with a countdown task.
//!
//! The countdown is a spawned task bound to one session id. It holds only a
//! weak reference to the runner, stops as soon as the session it belongs to
//! is no longer playing, and is aborted on submit, reset, shutdown and drop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tutor_core::exam::{
    ExamMachine, ExamResult, ExamSnapshot, ExamState, Navigation, SubmitOutcome,
};
use tutor_core::types::{ContentKind, ContentRequest, Level};
use tutor_core::validation::validate_batch;
use tutor_core::ExamError;
use uuid::Uuid;

use super::provider::{ContentProvider, ProviderError};
use crate::store::{Lifetime, Storage, StoreError};

/// Durable key holding finished exam results, oldest first.
pub const RESULTS_KEY: &str = "exam_results";

/// Results kept in the history; older ones are dropped first.
pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Error)]
pub enum ExamRunError {
    #[error("content fetch failed: {0}")]
    ContentFetchFailed(#[from] ProviderError),

    #[error(transparent)]
    Exam(#[from] ExamError),

    #[error("an exam is already being started")]
    StartInProgress,

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ExamRunError>;

#[derive(Debug, Clone)]
pub struct ExamSettings {
    pub question_count: usize,
    pub duration_secs: u32,
    /// Real time between countdown ticks; each tick removes one second.
    pub tick: Duration,
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self {
            question_count: 40,
            duration_secs: 3000,
            tick: Duration::from_secs(1),
        }
    }
}

struct ExamRunnerInner {
    provider: Arc<dyn ContentProvider>,
    storage: Storage,
    settings: ExamSettings,
    machine: Mutex<ExamMachine>,
    timer: StdMutex<Option<JoinHandle<()>>>,
    /// Set while a start is fetching its question set.
    starting: AtomicBool,
    history_lock: StdMutex<()>,
}

/// Clears `starting` however the start ends, including cancellation.
struct StartGuard<'a>(&'a AtomicBool);

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ExamRunnerInner {
    fn cancel_timer(&self) {
        let mut timer = self.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }

    /// Append a result to the history once per session, keeping the most
    /// recent [`MAX_HISTORY`] entries.
    fn record_result(&self, result: &ExamResult) -> std::result::Result<(), StoreError> {
        let _guard = self.history_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history: Vec<ExamResult> = self
            .storage
            .get_json(Lifetime::Durable, RESULTS_KEY)?
            .unwrap_or_default();
        if history.iter().any(|r| r.session_id == result.session_id) {
            return Ok(());
        }
        history.push(result.clone());
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }
        self.storage.set_json(Lifetime::Durable, RESULTS_KEY, &history)
    }

    fn on_finished(&self, result: &ExamResult) {
        tracing::info!(
            session = %result.session_id,
            reason = ?result.reason,
            score = result.score,
            total = result.total,
            "exam finished"
        );
        if let Err(e) = self.record_result(result) {
            tracing::warn!(session = %result.session_id, "failed to record exam result: {}", e);
        }
    }
}

impl Drop for ExamRunnerInner {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

/// Timed exam runner.
///
/// Clone-able; clones share one machine and one countdown.
#[derive(Clone)]
pub struct ExamRunner {
    inner: Arc<ExamRunnerInner>,
}

impl ExamRunner {
    pub fn new(provider: Arc<dyn ContentProvider>, storage: Storage, settings: ExamSettings) -> Self {
        let machine = ExamMachine::new(settings.duration_secs);
        Self {
            inner: Arc::new(ExamRunnerInner {
                provider,
                storage,
                settings,
                machine: Mutex::new(machine),
                timer: StdMutex::new(None),
                starting: AtomicBool::new(false),
                history_lock: StdMutex::new(()),
            }),
        }
    }

    pub async fn snapshot(&self) -> ExamSnapshot {
        self.inner.machine.lock().await.snapshot()
    }

    pub async fn state(&self) -> ExamState {
        self.inner.machine.lock().await.state()
    }

    /// Fetch a question set and start playing.
    ///
    /// A finished exam is cleared first. On any failure the machine stays
    /// in `Setup` and the call can simply be retried. A second start while
    /// one is still fetching is rejected without calling the provider.
    pub async fn start(&self, level: Level) -> Result<ExamSnapshot> {
        let _starting = {
            let mut machine = self.inner.machine.lock().await;
            if self.inner.starting.swap(true, Ordering::SeqCst) {
                return Err(ExamRunError::StartInProgress);
            }
            let guard = StartGuard(&self.inner.starting);
            if machine.state() == ExamState::Finished {
                machine.reset()?;
                self.inner.cancel_timer();
            } else if machine.state() == ExamState::Playing {
                return Err(ExamError::InvalidTransition {
                    state: ExamState::Playing,
                    action: "start",
                }
                .into());
            }
            guard
        };

        let request = ContentRequest {
            kind: ContentKind::ExamQuestion,
            level,
            count: self.inner.settings.question_count,
            topic: None,
        };
        let items = self.inner.provider.request(&request).await.map_err(|e| {
            tracing::warn!(%level, "exam question request failed: {}", e);
            e
        })?;

        let batch = validate_batch(ContentKind::ExamQuestion, items);
        if !batch.rejected.is_empty() {
            tracing::debug!(rejected = batch.rejected.len(), "discarded invalid exam questions");
        }
        let questions: Vec<_> = batch
            .items
            .iter()
            .filter_map(|item| item.as_exam_question().cloned())
            .collect();

        let mut machine = self.inner.machine.lock().await;
        let session_id = machine.begin(level, questions, Utc::now())?;
        self.spawn_timer(session_id);
        tracing::info!(
            session = %session_id,
            %level,
            questions = machine.session().map_or(0, |s| s.questions.len()),
            duration_secs = self.inner.settings.duration_secs,
            "exam started"
        );
        Ok(machine.snapshot())
    }

    /// Record `choice` for question `index`, replacing any earlier answer.
    pub async fn answer(&self, index: usize, choice: &str) -> Result<()> {
        self.inner.machine.lock().await.answer(index, choice)?;
        Ok(())
    }

    pub async fn clear_answer(&self, index: usize) -> Result<()> {
        self.inner.machine.lock().await.clear_answer(index)?;
        Ok(())
    }

    pub async fn navigate(&self, nav: Navigation) -> Result<usize> {
        Ok(self.inner.machine.lock().await.navigate(nav)?)
    }

    /// Learner submission; see [`ExamMachine::submit`].
    pub async fn submit(&self, confirm: bool) -> Result<SubmitOutcome> {
        let mut machine = self.inner.machine.lock().await;
        let was_playing = machine.state() == ExamState::Playing;
        let outcome = machine.submit(confirm, Utc::now())?;
        if let SubmitOutcome::Finished { result } = &outcome {
            if was_playing {
                self.inner.cancel_timer();
                self.inner.on_finished(result);
            }
        }
        Ok(outcome)
    }

    /// Clear the session and return to `Setup`.
    pub async fn reset(&self) -> Result<()> {
        let mut machine = self.inner.machine.lock().await;
        machine.reset()?;
        self.inner.cancel_timer();
        Ok(())
    }

    /// Finished results, oldest first.
    pub fn history(&self) -> Result<Vec<ExamResult>> {
        Ok(self
            .inner
            .storage
            .get_json(Lifetime::Durable, RESULTS_KEY)?
            .unwrap_or_default())
    }

    /// Stop the countdown. Called when the host UI is torn down.
    pub fn shutdown(&self) {
        self.inner.cancel_timer();
    }

    fn spawn_timer(&self, session_id: Uuid) {
        let weak: Weak<ExamRunnerInner> = Arc::downgrade(&self.inner);
        let period = self.inner.settings.tick;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let mut machine = inner.machine.lock().await;
                if machine.state() != ExamState::Playing || machine.session_id() != Some(session_id) {
                    break;
                }
                if let Some(result) = machine.tick(Utc::now()) {
                    drop(machine);
                    inner.on_finished(&result);
                    break;
                }
            }
        });

        let mut timer = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = timer.replace(handle) {
            previous.abort();
        }
    }
}
