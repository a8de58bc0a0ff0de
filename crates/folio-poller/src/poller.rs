//! Fixed-interval poller with a retry side schedule.
//!
//! Each poller is one tokio task that exclusively owns its [`PollState`].
//! The task refreshes immediately on start and then on every interval tick,
//! never running two refreshes at once: a tick (or retry) that fires while a
//! refresh is in flight is skipped, not queued. After a failure the retry
//! policy may arm a one-shot retry timer next to the interval timer.
//!
//! Stopping cancels the task's token, which drops any in-flight refresh
//! without recording its outcome, and joins the task. Once
//! [`PollerHandle::stop`] returns the state is frozen.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use folio_core::{PollState, RefreshError, RetryDecision, RetryPolicy};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

type RefreshFuture<T> = Pin<Box<dyn Future<Output = Result<T, RefreshError>> + Send>>;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Used as the tracing span field.
    pub name: String,
    pub interval: Duration,
    /// `None` disables the retry side schedule; failures then wait for the
    /// next interval tick.
    pub retry: Option<RetryPolicy>,
}

impl PollerConfig {
    pub fn new(name: impl Into<String>, interval: Duration) -> Self {
        Self {
            name: name.into(),
            interval,
            retry: None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = Some(policy);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Start,
    Interval,
    Retry,
    Manual,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Start => "start",
            Trigger::Interval => "interval",
            Trigger::Retry => "retry",
            Trigger::Manual => "manual",
        }
    }
}

// ─── Handle / reader ─────────────────────────────────────────────────

/// Owning handle of a running poller. Dropping it cancels the poller;
/// [`stop`](Self::stop) additionally waits for the task to finish.
pub struct PollerHandle<T> {
    name: String,
    cancel: CancellationToken,
    manual: Arc<Notify>,
    state: watch::Receiver<PollState<T>>,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> PollerHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only view that can be handed to consumers.
    pub fn reader(&self) -> PollReader<T> {
        PollReader {
            rx: self.state.clone(),
        }
    }

    pub fn snapshot(&self) -> PollState<T> {
        self.state.borrow().clone()
    }

    /// Reset the retry schedule and refresh now, unless a refresh is
    /// already in flight.
    pub fn retry_now(&self) {
        self.manual.notify_one();
    }

    /// Cancel the in-flight refresh, clear both timers and wait for the
    /// task to exit. No state mutation happens after this returns.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            tracing::warn!(poller = %self.name, "poller task ended abnormally: {e}");
        }
    }
}

impl<T> Drop for PollerHandle<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Read-only snapshot access to a poller's state.
pub struct PollReader<T> {
    rx: watch::Receiver<PollState<T>>,
}

impl<T> Clone for PollReader<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T: Clone> PollReader<T> {
    pub fn snapshot(&self) -> PollState<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next published state. Returns `false` once the poller
    /// has stopped and no unseen state remains.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Snapshot and mark it seen, so the next [`changed`](Self::changed)
    /// waits for a newer state.
    pub fn snapshot_and_mark_seen(&mut self) -> PollState<T> {
        self.rx.borrow_and_update().clone()
    }
}

// ─── Start ───────────────────────────────────────────────────────────

/// Spawn a poller on the current tokio runtime.
///
/// `refresh` is called once per cycle with a token that is cancelled when
/// the poller stops; a refresh that observes it should return
/// `FetchError::Cancelled`, which the poller discards.
pub fn start<T, F, Fut>(config: PollerConfig, refresh: F) -> PollerHandle<T>
where
    T: Clone + Send + Sync + 'static,
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let manual = Arc::new(Notify::new());
    let (tx, rx) = watch::channel(PollState::new());
    let name = config.name.clone();

    let span = tracing::info_span!("poller", name = %config.name);
    let task = PollTask {
        config,
        refresh,
        cancel: cancel.clone(),
        manual: Arc::clone(&manual),
        state: PollState::new(),
        tx,
        retry_at: None,
    };
    let join = tokio::spawn(task.run().instrument(span));

    PollerHandle {
        name,
        cancel,
        manual,
        state: rx,
        task: Some(join),
    }
}

// ─── Task ────────────────────────────────────────────────────────────

struct PollTask<T, F> {
    config: PollerConfig,
    refresh: F,
    cancel: CancellationToken,
    manual: Arc<Notify>,
    state: PollState<T>,
    tx: watch::Sender<PollState<T>>,
    retry_at: Option<Instant>,
}

impl<T, F, Fut> PollTask<T, F>
where
    T: Clone + Send + Sync + 'static,
    F: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, RefreshError>> + Send + 'static,
{
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.config.interval.max(MIN_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut in_flight: Option<RefreshFuture<T>> = None;

        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            retry = self.config.retry.is_some(),
            "poller started"
        );

        // The first tick completes immediately.
        ticker.tick().await;
        self.trigger(Trigger::Start, &mut in_flight);

        loop {
            let retry_at = self.retry_at;
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                result = poll_in_flight(&mut in_flight) => {
                    in_flight = None;
                    self.complete(result);
                }
                _ = ticker.tick() => self.trigger(Trigger::Interval, &mut in_flight),
                () = sleep_until(retry_at) => {
                    self.retry_at = None;
                    self.trigger(Trigger::Retry, &mut in_flight);
                }
                () = self.manual.notified() => {
                    self.state.reset_retries();
                    self.retry_at = None;
                    self.publish();
                    self.trigger(Trigger::Manual, &mut in_flight);
                }
            }
        }

        if in_flight.is_some() {
            tracing::debug!("dropping in-flight refresh");
        }
        tracing::info!("poller stopped");
    }

    fn trigger(&mut self, trigger: Trigger, in_flight: &mut Option<RefreshFuture<T>>) {
        if in_flight.is_some() {
            tracing::debug!(trigger = trigger.as_str(), "refresh in flight, skipping");
            return;
        }
        // Whatever triggered this cycle, its outcome decides the next retry.
        self.retry_at = None;
        self.state.begin(Utc::now());
        self.publish();

        let token = self.cancel.child_token();
        *in_flight = Some(Box::pin((self.refresh)(token)));
        tracing::debug!(trigger = trigger.as_str(), "refresh started");
    }

    fn complete(&mut self, result: Result<T, RefreshError>) {
        let now = Utc::now();
        match result {
            Ok(value) => {
                self.state.record_success(value, now);
                self.retry_at = None;
                tracing::debug!("refresh succeeded");
            }
            Err(e) if e.is_cancelled() => {
                self.state.abandon();
                tracing::debug!("refresh cancelled");
            }
            Err(e) => {
                let kind = e.kind();
                let message = e.to_string();
                match self
                    .state
                    .record_failure(e, self.config.retry.as_ref(), now)
                {
                    Some(RetryDecision::Retry(delay)) => {
                        self.retry_at = Some(Instant::now() + delay);
                        tracing::warn!(
                            kind,
                            attempt = self.state.retry_count,
                            retry_in_ms = delay.as_millis() as u64,
                            "refresh failed: {message}"
                        );
                    }
                    Some(RetryDecision::GiveUp) => {
                        tracing::warn!(
                            kind,
                            "refresh failed, retries exhausted until next interval: {message}"
                        );
                    }
                    None => tracing::warn!(kind, "refresh failed: {message}"),
                }
            }
        }
        self.publish();
    }

    fn publish(&self) {
        self.tx.send_replace(self.state.clone());
    }
}

async fn poll_in_flight<T>(slot: &mut Option<RefreshFuture<T>>) -> Result<T, RefreshError> {
    match slot {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{FetchError, PollPhase};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    const INTERVAL: Duration = Duration::from_secs(30);

    fn transport_err() -> RefreshError {
        FetchError::Transport("connection refused".into()).into()
    }

    /// Records the (paused) instant of every refresh call.
    #[derive(Clone, Default)]
    struct Calls(Arc<Mutex<Vec<Instant>>>);

    impl Calls {
        fn record(&self) -> usize {
            let mut calls = self.0.lock().expect("calls lock");
            calls.push(Instant::now());
            calls.len()
        }

        fn count(&self) -> usize {
            self.0.lock().expect("calls lock").len()
        }

        fn gaps_ms(&self) -> Vec<u128> {
            let calls = self.0.lock().expect("calls lock");
            calls
                .windows(2)
                .map(|w| (w[1] - w[0]).as_millis())
                .collect()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_immediately_then_every_interval() {
        let calls = Calls::default();
        let c = calls.clone();
        let handle = start(PollerConfig::new("test", INTERVAL), move |_| {
            let n = c.record();
            async move { Ok::<_, RefreshError>(n) }
        });

        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.count(), 1);
        let snap = handle.snapshot();
        assert_eq!(snap.last_value, Some(1));
        assert_eq!(snap.phase, PollPhase::Success);
        assert!(!snap.is_loading);

        sleep(INTERVAL).await;
        assert_eq!(calls.count(), 2);
        sleep(INTERVAL).await;
        assert_eq!(calls.count(), 3);
        assert_eq!(calls.gaps_ms(), vec![30_000, 30_000]);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_in_flight_refresh_are_skipped() {
        let calls = Calls::default();
        let c = calls.clone();
        let handle = start(PollerConfig::new("slow", INTERVAL), move |_| {
            c.record();
            async move {
                sleep(Duration::from_secs(70)).await;
                Ok::<_, RefreshError>(())
            }
        });

        // Ticks at 30s and 60s fire while the first refresh is pending.
        sleep(Duration::from_secs(65)).await;
        assert_eq!(calls.count(), 1);
        assert!(handle.snapshot().is_loading);

        // First refresh completes at 70s; nothing is queued behind it.
        sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.count(), 1);
        assert_eq!(handle.snapshot().phase, PollPhase::Success);

        // Next regular tick at 90s.
        sleep(Duration::from_secs(16)).await;
        assert_eq!(calls.count(), 2);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn retry_delays_then_give_up_until_next_tick() {
        let calls = Calls::default();
        let c = calls.clone();
        let config = PollerConfig::new("failing", INTERVAL).with_retry(RetryPolicy::default());
        let handle = start(config, move |_| {
            c.record();
            async move { Err::<(), _>(transport_err()) }
        });

        sleep(Duration::from_secs(29)).await;
        assert_eq!(calls.count(), 4);
        assert_eq!(calls.gaps_ms(), vec![1000, 2000, 4000]);

        let snap = handle.snapshot();
        assert_eq!(snap.phase, PollPhase::Failed);
        assert_eq!(snap.retry_count, 3);
        assert!(snap.has_given_up());

        // Interval polling continues after giving up, but arms no retry.
        sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.count(), 5);
        sleep(Duration::from_secs(20)).await;
        assert_eq!(calls.count(), 5);
        assert!(handle.snapshot().has_given_up());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn success_resets_retry_count() {
        let attempts = Arc::new(AtomicU32::new(0));
        let a = Arc::clone(&attempts);
        let config = PollerConfig::new("flaky", INTERVAL).with_retry(RetryPolicy::default());
        let handle = start(config, move |_| {
            let n = a.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 { Err(transport_err()) } else { Ok(n) }
            }
        });

        // Failures at 0s and 1s, success on the retry at 3s.
        sleep(Duration::from_secs(10)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let snap = handle.snapshot();
        assert_eq!(snap.last_value, Some(2));
        assert_eq!(snap.retry_count, 0);
        assert!(snap.last_error.is_none());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_policy_waits_for_interval() {
        let calls = Calls::default();
        let c = calls.clone();
        let handle = start(PollerConfig::new("plain", INTERVAL), move |_| {
            c.record();
            async move { Err::<(), _>(transport_err()) }
        });

        sleep(Duration::from_secs(29)).await;
        assert_eq!(calls.count(), 1);
        let snap = handle.snapshot();
        let info = snap.last_error.expect("error surfaced");
        assert!(!info.gave_up);
        assert!(info.next_retry_ms.is_none());
        assert_eq!(snap.retry_count, 0);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_flight_leaves_state_untouched() {
        let tokens: Arc<Mutex<Vec<CancellationToken>>> = Arc::default();
        let t = Arc::clone(&tokens);
        let handle = start(PollerConfig::new("stopping", INTERVAL), move |token| {
            t.lock().expect("tokens lock").push(token);
            async move {
                sleep(Duration::from_secs(10)).await;
                Ok::<_, RefreshError>(1u32)
            }
        });
        let mut reader = handle.reader();

        sleep(Duration::from_secs(1)).await;
        let before = handle.snapshot();
        assert!(before.is_loading);

        handle.stop().await;
        assert!(tokens.lock().expect("tokens lock")[0].is_cancelled());

        sleep(Duration::from_secs(60)).await;
        assert_eq!(reader.snapshot(), before);
        reader.snapshot_and_mark_seen();
        assert!(!reader.changed().await);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_outcome_is_not_reported() {
        let handle = start(PollerConfig::new("cancelled", INTERVAL), move |_| async move {
            Err::<(), RefreshError>(FetchError::Cancelled.into())
        });
        sleep(Duration::from_secs(1)).await;
        let snap = handle.snapshot();
        assert!(snap.last_error.is_none());
        assert!(!snap.is_loading);
        assert_eq!(snap.phase, PollPhase::Idle);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn retry_now_restarts_schedule_after_give_up() {
        let calls = Calls::default();
        let c = calls.clone();
        let policy = RetryPolicy {
            base_delay_ms: 1000,
            max_attempts: 1,
        };
        let config = PollerConfig::new("manual", INTERVAL).with_retry(policy);
        let handle = start(config, move |_| {
            c.record();
            async move { Err::<(), _>(transport_err()) }
        });

        // Fail at 0s, retry at 1s fails and gives up.
        sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.count(), 2);
        assert!(handle.snapshot().has_given_up());

        handle.retry_now();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.count(), 3);
        // The manual attempt failed with a fresh schedule: one retry armed.
        let snap = handle.snapshot();
        assert!(!snap.has_given_up());
        assert_eq!(snap.retry_count, 1);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.count(), 4);
        assert!(handle.snapshot().has_given_up());
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn retry_now_mid_flight_resets_count_without_second_refresh() {
        let calls = Calls::default();
        let c = calls.clone();
        let config = PollerConfig::new("busy", INTERVAL).with_retry(RetryPolicy::default());
        let handle = start(config, move |_| {
            let n = c.record();
            async move {
                if n > 1 {
                    sleep(Duration::from_secs(5)).await;
                }
                Err::<(), _>(transport_err())
            }
        });

        // Fails at 0s; the retry at 1s is slow and still pending at 2s.
        sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.count(), 2);
        assert_eq!(handle.snapshot().retry_count, 1);

        handle.retry_now();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.count(), 2);
        let snap = handle.snapshot();
        assert!(snap.is_loading);
        assert_eq!(snap.retry_count, 0);

        // The pending refresh fails at 6s and starts over from attempt 0.
        sleep(Duration::from_millis(4_400)).await;
        assert_eq!(calls.count(), 2);
        let snap = handle.snapshot();
        assert_eq!(snap.retry_count, 1);
        assert_eq!(snap.last_error.expect("error").next_retry_ms, Some(1000));

        sleep(Duration::from_secs(1)).await;
        assert_eq!(calls.count(), 3);
        assert_eq!(calls.gaps_ms(), vec![1000, 6000]);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels_task() {
        let tokens: Arc<Mutex<Vec<CancellationToken>>> = Arc::default();
        let t = Arc::clone(&tokens);
        let handle = start(PollerConfig::new("dropped", INTERVAL), move |token| {
            t.lock().expect("tokens lock").push(token);
            std::future::pending::<Result<(), RefreshError>>()
        });
        sleep(Duration::from_millis(10)).await;
        drop(handle);
        sleep(Duration::from_millis(10)).await;

        let tokens = tokens.lock().expect("tokens lock");
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn reader_observes_changes() {
        let handle = start(PollerConfig::new("reader", INTERVAL), move |_| async move {
            Ok::<_, RefreshError>("value")
        });
        let mut reader = handle.reader();
        let mut saw_value = false;
        while reader.changed().await {
            if reader.snapshot_and_mark_seen().last_value == Some("value") {
                saw_value = true;
                break;
            }
        }
        assert!(saw_value);
        handle.stop().await;
    }
}
