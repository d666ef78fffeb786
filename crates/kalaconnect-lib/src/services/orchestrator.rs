// Request Orchestrator
//
// Runs one cancellable generation request at a time and publishes its
// ProcessingState. Progress is cosmetic: a scripted ticker advances the stage
// on a fixed interval until the real operation settles.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::processing::{ProcessingState, ProgressStage, STAGE_CANCELLED, STAGE_COMPLETE};
use crate::services::ai::{AIError, AIResult};

/// Timings of the orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Time between cosmetic progress stages
    pub progress_interval: Duration,
    /// Grace period before a settled request's state is reset to idle
    pub settle_delay: Duration,
    /// How long the cancellation notice stays visible
    pub cancel_clear_delay: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(800),
            settle_delay: Duration::from_millis(1000),
            cancel_clear_delay: Duration::from_millis(2000),
        }
    }
}

/// Source of cosmetic progress stages
pub trait ProgressReporter: Send + Sync {
    /// Stage to publish on the given tick (0-based), or None once nothing is left to show
    fn stage_at(&self, tick: usize) -> Option<ProgressStage>;
}

/// Fixed script of stages. The final stage is reserved for success and is never
/// published by the ticker.
#[derive(Debug, Clone)]
pub struct ScriptedProgress {
    stages: Vec<ProgressStage>,
}

impl ScriptedProgress {
    pub fn new(stages: Vec<ProgressStage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[ProgressStage] {
        &self.stages
    }
}

impl Default for ScriptedProgress {
    fn default() -> Self {
        Self::new(vec![
            ProgressStage::new("Analyzing craft image...", 10),
            ProgressStage::new("Understanding cultural context...", 25),
            ProgressStage::new("Generating authentic content...", 50),
            ProgressStage::new("Crafting multilingual text...", 75),
            ProgressStage::new("Finalizing heritage context...", 90),
            ProgressStage::new("Complete!", 100),
        ])
    }
}

impl ProgressReporter for ScriptedProgress {
    fn stage_at(&self, tick: usize) -> Option<ProgressStage> {
        if tick + 1 < self.stages.len() {
            self.stages.get(tick).cloned()
        } else {
            None
        }
    }
}

/// Reporter that never advances past the initial stage
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn stage_at(&self, _tick: usize) -> Option<ProgressStage> {
        None
    }
}

struct ActiveRequest {
    id: u64,
    token: CancellationToken,
}

struct Inner {
    config: OrchestratorConfig,
    reporter: Arc<dyn ProgressReporter>,
    state: watch::Sender<ProcessingState>,
    active: Mutex<Option<ActiveRequest>>,
    /// Id of the most recently started request
    latest: AtomicU64,
}

impl Inner {
    fn owns_slot(&self, id: u64) -> bool {
        self.active
            .lock()
            .map(|active| active.as_ref().is_some_and(|a| a.id == id))
            .unwrap_or(false)
    }

    fn is_latest(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }

    /// Publish only while the request still holds the slot
    fn publish_for(&self, id: u64, next: ProcessingState) {
        if self.owns_slot(id) {
            self.state.send_replace(next);
        }
    }

    fn release(&self, id: u64) {
        if let Ok(mut active) = self.active.lock() {
            if active.as_ref().is_some_and(|a| a.id == id) {
                *active = None;
            }
        }
    }
}

/// Releases the slot when the request settles (or its future is dropped) and
/// schedules the deferred reset to idle.
struct SlotGuard {
    inner: Arc<Inner>,
    id: u64,
    token: CancellationToken,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.inner.release(self.id);

        let inner = Arc::clone(&self.inner);
        let id = self.id;
        let token = self.token.clone();
        let reset = move || {
            // The cancel path owns its own reset, and a newer request owns the state
            if inner.is_latest(id) && !token.is_cancelled() {
                inner.state.send_replace(ProcessingState::idle());
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let delay = self.inner.config.settle_delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    reset();
                });
            }
            Err(_) => reset(),
        }
    }
}

/// Single-slot cancellable request runner with observable progress
#[derive(Clone)]
pub struct RequestOrchestrator {
    inner: Arc<Inner>,
}

impl Default for RequestOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestOrchestrator {
    pub fn new() -> Self {
        Self::with_config(OrchestratorConfig::default(), Arc::new(ScriptedProgress::default()))
    }

    pub fn with_config(config: OrchestratorConfig, reporter: Arc<dyn ProgressReporter>) -> Self {
        let (state, _) = watch::channel(ProcessingState::idle());
        Self {
            inner: Arc::new(Inner {
                config,
                reporter,
                state,
                active: Mutex::new(None),
                latest: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    /// Current state snapshot
    pub fn state(&self) -> ProcessingState {
        self.inner.state.borrow().clone()
    }

    /// Observe state changes
    pub fn subscribe(&self) -> watch::Receiver<ProcessingState> {
        self.inner.state.subscribe()
    }

    /// Whether a request currently holds the slot
    pub fn is_busy(&self) -> bool {
        self.inner
            .active
            .lock()
            .map(|active| active.is_some())
            .unwrap_or(false)
    }

    fn acquire(&self) -> AIResult<(u64, CancellationToken)> {
        let mut active = self
            .inner
            .active
            .lock()
            .map_err(|e| AIError::ApiError(format!("Orchestrator lock poisoned: {}", e)))?;
        if active.is_some() {
            return Err(AIError::Busy);
        }

        let id = self.inner.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        *active = Some(ActiveRequest {
            id,
            token: token.clone(),
        });
        Ok((id, token))
    }

    /// Run `operation` as the in-flight request.
    ///
    /// The operation receives the request's cancellation token. It is raced
    /// against that token, so a cancelled request settles with
    /// `AIError::Cancelled` even if the operation ignores the token. Fails
    /// with `AIError::Busy` while another request holds the slot.
    pub async fn start_request<F, Fut, T>(&self, operation: F) -> AIResult<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = AIResult<T>>,
    {
        let (id, token) = self.acquire()?;
        let _guard = SlotGuard {
            inner: Arc::clone(&self.inner),
            id,
            token: token.clone(),
        };

        self.inner.state.send_replace(ProcessingState::started());
        log::debug!("Request {} started", id);

        let period = self.inner.config.progress_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut tick = 0usize;

        let operation = operation(token.clone());
        tokio::pin!(operation);

        let result = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break Err(AIError::Cancelled),
                result = &mut operation => break result,
                _ = ticker.tick() => {
                    if let Some(stage) = self.inner.reporter.stage_at(tick) {
                        self.inner.publish_for(
                            id,
                            ProcessingState {
                                is_processing: true,
                                stage: stage.stage,
                                progress: stage.progress,
                            },
                        );
                    }
                    tick += 1;
                }
            }
        };

        match &result {
            Ok(_) => {
                self.inner.publish_for(
                    id,
                    ProcessingState {
                        is_processing: true,
                        stage: STAGE_COMPLETE.to_string(),
                        progress: 100,
                    },
                );
                log::debug!("Request {} completed", id);
            }
            Err(AIError::Cancelled) => log::debug!("Request {} cancelled", id),
            Err(e) => log::debug!("Request {} failed: {}", id, e),
        }

        result
    }

    /// Cancel the in-flight request. Returns false (and changes nothing) when idle.
    pub fn cancel_request(&self) -> bool {
        let taken = match self.inner.active.lock() {
            Ok(mut active) => active.take(),
            Err(_) => None,
        };
        let Some(request) = taken else {
            return false;
        };

        request.token.cancel();
        self.inner.state.send_replace(ProcessingState::cancelled());
        log::info!("Request {} cancelled by user", request.id);

        let inner = Arc::clone(&self.inner);
        let id = request.id;
        let clear = move || {
            if inner.is_latest(id) {
                inner.state.send_if_modified(|state| {
                    if !state.is_processing && state.stage == STAGE_CANCELLED {
                        *state = ProcessingState::idle();
                        true
                    } else {
                        false
                    }
                });
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let delay = self.inner.config.cancel_clear_delay;
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    clear();
                });
            }
            Err(_) => clear(),
        }
        true
    }
}
