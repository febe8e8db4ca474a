//! Single-worker FIFO delivery queue.
//!
//! Every outbound message goes through one background task, so at most one
//! `sendMessage` call is in flight at any time and delivery attempts keep the
//! global order in which they were enqueued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{Notify, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::{DeliveryConfig, MessageSender, OutboundMessage, SendError};

/// Terminal result of one dequeued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    SkippedBlocked,
    SkippedForbidden,
    FailedRetriesExhausted,
}

/// Reasons `enqueue` can refuse a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("delivery queue has been stopped")]
    Stopped,

    #[error("no tokio runtime available to run the delivery worker")]
    NoRuntime,
}

/// Outcome counters.
#[derive(Debug, Default)]
pub struct DeliveryStats {
    delivered: AtomicU64,
    skipped_blocked: AtomicU64,
    skipped_forbidden: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`] plus the queue depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliverySnapshot {
    pub delivered: u64,
    pub skipped_blocked: u64,
    pub skipped_forbidden: u64,
    pub failed: u64,
    pub pending: u64,
}

impl DeliverySnapshot {
    /// Messages that reached a terminal outcome.
    pub fn completed(&self) -> u64 {
        self.delivered + self.skipped_blocked + self.skipped_forbidden + self.failed
    }
}

impl DeliveryStats {
    fn record(&self, outcome: DeliveryOutcome) {
        let counter = match outcome {
            DeliveryOutcome::Delivered => &self.delivered,
            DeliveryOutcome::SkippedBlocked => &self.skipped_blocked,
            DeliveryOutcome::SkippedForbidden => &self.skipped_forbidden,
            DeliveryOutcome::FailedRetriesExhausted => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Running,
    Stopped,
}

struct Inner {
    sender: Arc<dyn MessageSender>,
    config: DeliveryConfig,
    tx: mpsc::UnboundedSender<OutboundMessage>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<OutboundMessage>>>,
    state: Mutex<WorkerState>,
    wake: Notify,
    worker_alive: AtomicBool,
    pending: AtomicU64,
    stats: DeliveryStats,
}

impl Inner {
    fn is_stopped(&self) -> bool {
        *self.state.lock() == WorkerState::Stopped
    }
}

/// Handle to the delivery queue. Cloning is cheap and shares the queue.
#[derive(Clone)]
pub struct DeliveryQueue {
    inner: Arc<Inner>,
}

impl DeliveryQueue {
    /// Create a queue. The worker is spawned lazily by the first `enqueue`
    /// (or an explicit [`start`](Self::start)).
    pub fn new(sender: Arc<dyn MessageSender>, config: DeliveryConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                sender,
                config,
                tx,
                rx: Mutex::new(Some(rx)),
                state: Mutex::new(WorkerState::Idle),
                wake: Notify::new(),
                worker_alive: AtomicBool::new(false),
                pending: AtomicU64::new(0),
                stats: DeliveryStats::default(),
            }),
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.inner.config
    }

    /// Spawn the worker if it's not running yet.
    pub fn start(&self) -> Result<(), DeliveryError> {
        let mut state = self.inner.state.lock();
        self.ensure_worker(&mut state)
    }

    /// Append a message to the tail of the queue. Never waits.
    pub fn enqueue(&self, message: OutboundMessage) -> Result<(), DeliveryError> {
        let mut state = self.inner.state.lock();
        self.ensure_worker(&mut state)?;

        // Sent under the state lock so concurrent producers are ordered by
        // lock acquisition.
        self.inner.pending.fetch_add(1, Ordering::Relaxed);
        if self.inner.tx.send(message).is_err() {
            self.inner.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(DeliveryError::Stopped);
        }
        Ok(())
    }

    fn ensure_worker(&self, state: &mut WorkerState) -> Result<(), DeliveryError> {
        match *state {
            WorkerState::Running => Ok(()),
            WorkerState::Stopped => Err(DeliveryError::Stopped),
            WorkerState::Idle => {
                let handle = Handle::try_current().map_err(|_| DeliveryError::NoRuntime)?;
                let rx = self.inner.rx.lock().take().ok_or(DeliveryError::Stopped)?;

                self.inner.worker_alive.store(true, Ordering::SeqCst);
                handle.spawn(run_worker(self.inner.clone(), rx));
                *state = WorkerState::Running;
                Ok(())
            }
        }
    }

    /// Ask the worker to exit.
    ///
    /// The flag is observed at the worker's next wake-up: an item that is
    /// being retried finishes its attempt sequence first. Messages still in
    /// the queue are dropped (and no longer counted as pending) and later
    /// `enqueue` calls fail.
    pub fn stop(&self) {
        let mut state = self.inner.state.lock();
        if *state != WorkerState::Stopped {
            *state = WorkerState::Stopped;
            self.inner.wake.notify_one();
            info!("Delivery queue stopping, {} message(s) pending", self.pending());
        }
    }

    pub fn is_worker_running(&self) -> bool {
        self.inner.worker_alive.load(Ordering::SeqCst)
    }

    /// Number of messages enqueued but not yet picked up by the worker.
    pub fn pending(&self) -> u64 {
        self.inner.pending.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> DeliverySnapshot {
        let stats = &self.inner.stats;
        DeliverySnapshot {
            delivered: stats.delivered.load(Ordering::Relaxed),
            skipped_blocked: stats.skipped_blocked.load(Ordering::Relaxed),
            skipped_forbidden: stats.skipped_forbidden.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }
}

impl std::fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("pending", &self.pending())
            .field("worker_running", &self.is_worker_running())
            .finish()
    }
}

async fn run_worker(inner: Arc<Inner>, mut rx: mpsc::UnboundedReceiver<OutboundMessage>) {
    info!("Delivery worker started");

    loop {
        if inner.is_stopped() {
            break;
        }

        let message = tokio::select! {
            biased;
            message = rx.recv() => message,
            _ = inner.wake.notified() => continue,
        };

        let Some(message) = message else {
            break;
        };
        inner.pending.fetch_sub(1, Ordering::Relaxed);

        let outcome = send_with_retry(inner.sender.as_ref(), &inner.config, &message).await;
        inner.stats.record(outcome);

        sleep(inner.config.pacing).await;
    }

    // Nothing is accepted once stopped, so this empties the queue for good.
    rx.close();
    let mut dropped = 0u64;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        inner.pending.fetch_sub(dropped, Ordering::Relaxed);
        warn!("Dropped {} undelivered message(s) on stop", dropped);
    }

    inner.worker_alive.store(false, Ordering::SeqCst);
    info!("Delivery worker stopped");
}

/// Attempt bookkeeping for one message.
#[derive(Debug, Default)]
struct RetryState {
    attempt: u32,
    last_wait: Option<Duration>,
}

/// Deliver one message, retrying transient failures.
///
/// Always returns a terminal outcome; nothing escapes to the worker loop.
pub(crate) async fn send_with_retry(
    sender: &dyn MessageSender,
    config: &DeliveryConfig,
    message: &OutboundMessage,
) -> DeliveryOutcome {
    let target = message.target();
    let mut retry = RetryState::default();

    while retry.attempt < config.max_attempts {
        retry.attempt += 1;
        let is_last = retry.attempt >= config.max_attempts;

        let wait = match sender.send(message).await {
            Ok(()) => {
                debug!("Delivered message to {} (attempt {})", target, retry.attempt);
                return DeliveryOutcome::Delivered;
            }
            Err(SendError::Blocked) => {
                info!("User {} has blocked the bot", target);
                return DeliveryOutcome::SkippedBlocked;
            }
            Err(SendError::Forbidden) => {
                info!("Bot doesn't have permission to write in chat {}", target);
                return DeliveryOutcome::SkippedForbidden;
            }
            Err(SendError::RateLimited { retry_after }) => {
                if is_last {
                    break;
                }
                let wait = retry_after.min(config.max_flood_wait);
                info!("FloodWait detected for {}, waiting {:?}", target, wait);
                wait
            }
            Err(SendError::Other(e)) => {
                error!("Error sending message to {}: {}", target, e);
                if is_last {
                    break;
                }
                config.error_backoff
            }
        };

        retry.last_wait = Some(wait);
        sleep(wait).await;
    }

    warn!(
        "Max retries reached for message to {} after {} attempt(s), last wait {:?}",
        target, retry.attempt, retry.last_wait
    );
    DeliveryOutcome::FailedRetriesExhausted
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::collections::{HashMap, VecDeque};

    use async_trait::async_trait;
    use teloxide::types::ChatId;
    use tokio::time::Instant;

    /// Fake sender: replies from a per-text script, `Ok` when exhausted.
    #[derive(Default)]
    pub(crate) struct ScriptedSender {
        script: Mutex<HashMap<String, VecDeque<Result<(), SendError>>>>,
        always_fail: Mutex<Vec<String>>,
        attempts: Mutex<Vec<(String, String, Instant)>>,
        sent: Mutex<Vec<OutboundMessage>>,
    }

    impl ScriptedSender {
        pub(crate) fn script(&self, text: &str, replies: Vec<Result<(), SendError>>) {
            self.script.lock().insert(text.to_string(), replies.into());
        }

        pub(crate) fn fail_always(&self, text: &str) {
            self.always_fail.lock().push(text.to_string());
        }

        /// (destination, text, time) of every attempt, in call order.
        pub(crate) fn attempts(&self) -> Vec<(String, String, Instant)> {
            self.attempts.lock().clone()
        }

        pub(crate) fn texts(&self) -> Vec<String> {
            self.attempts.lock().iter().map(|(_, t, _)| t.clone()).collect()
        }

        /// Every message handed to `send`, as received.
        pub(crate) fn messages(&self) -> Vec<OutboundMessage> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl MessageSender for ScriptedSender {
        async fn send(&self, message: &OutboundMessage) -> Result<(), SendError> {
            self.attempts
                .lock()
                .push((message.target(), message.text.clone(), Instant::now()));
            self.sent.lock().push(message.clone());

            if self.always_fail.lock().contains(&message.text) {
                return Err(SendError::Other("poisoned".into()));
            }
            self.script
                .lock()
                .get_mut(&message.text)
                .and_then(VecDeque::pop_front)
                .unwrap_or(Ok(()))
        }
    }

    pub(crate) fn queue_with(sender: &Arc<ScriptedSender>) -> DeliveryQueue {
        DeliveryQueue::new(sender.clone(), DeliveryConfig::default())
    }

    /// Let virtual time run until `n` messages reached a terminal outcome.
    pub(crate) async fn settle(queue: &DeliveryQueue, n: u64) {
        for _ in 0..100_000 {
            if queue.snapshot().completed() >= n {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("queue did not settle: {:?}", queue.snapshot());
    }

    fn msg(text: &str) -> OutboundMessage {
        OutboundMessage::new(ChatId(1), text)
    }

    fn flood(secs: u64) -> Result<(), SendError> {
        Err(SendError::RateLimited {
            retry_after: Duration::from_secs(secs),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fifo_across_concurrent_producers() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut producers = Vec::new();
        for p in 0..4 {
            let queue = queue.clone();
            let order = order.clone();
            producers.push(tokio::spawn(async move {
                for i in 0..25 {
                    let text = format!("p{p}-{i}");
                    {
                        let mut order = order.lock();
                        order.push(text.clone());
                        queue.enqueue(msg(&text)).unwrap();
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        settle(&queue, 100).await;
        assert_eq!(sender.texts(), *order.lock());
        assert_eq!(queue.snapshot().delivered, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocked_recipient_is_never_retried() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("hi", vec![Err(SendError::Blocked)]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("hi")).unwrap();
        settle(&queue, 1).await;

        assert_eq!(sender.attempts().len(), 1);
        assert_eq!(queue.snapshot().skipped_blocked, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_chat_is_skipped() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("hi", vec![Err(SendError::Forbidden)]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("hi")).unwrap();
        settle(&queue, 1).await;

        assert_eq!(sender.attempts().len(), 1);
        assert_eq!(queue.snapshot().skipped_forbidden, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flood_wait_is_capped_and_gives_up_after_three_attempts() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("hi", vec![flood(30), flood(30), flood(30), Ok(())]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("hi")).unwrap();
        settle(&queue, 1).await;

        let attempts = sender.attempts();
        assert_eq!(attempts.len(), 3);
        for pair in attempts.windows(2) {
            let gap = pair[1].2 - pair[0].2;
            assert!(gap >= Duration::from_secs(10), "gap {gap:?}");
            assert!(gap < Duration::from_secs(11), "gap {gap:?}");
        }
        let snapshot = queue.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.delivered, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_flood_wait_uses_hint_then_delivers() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("hi", vec![flood(2)]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("hi")).unwrap();
        settle(&queue, 1).await;

        let attempts = sender.attempts();
        assert_eq!(attempts.len(), 2);
        let gap = attempts[1].2 - attempts[0].2;
        assert!(gap >= Duration::from_secs(2) && gap < Duration::from_secs(3));
        assert_eq!(queue.snapshot().delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_error_backs_off_one_second() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("hi", vec![Err(SendError::Other("reset".into()))]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("hi")).unwrap();
        settle(&queue, 1).await;

        let attempts = sender.attempts();
        assert_eq!(attempts.len(), 2);
        let gap = attempts[1].2 - attempts[0].2;
        assert!(gap >= Duration::from_secs(1) && gap < Duration::from_secs(2));
        assert_eq!(queue.snapshot().delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_head_does_not_starve_the_queue() {
        let sender = Arc::new(ScriptedSender::default());
        sender.fail_always("poison");
        let queue = queue_with(&sender);

        queue.enqueue(msg("poison")).unwrap();
        queue.enqueue(msg("next")).unwrap();
        settle(&queue, 2).await;

        assert_eq!(sender.texts(), vec!["poison", "poison", "poison", "next"]);
        let snapshot = queue.snapshot();
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enqueue_never_waits_for_delivery() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);

        let before = Instant::now();
        for i in 0..10_000 {
            queue.enqueue(msg(&i.to_string())).unwrap();
        }

        assert_eq!(Instant::now(), before);
        assert_eq!(queue.pending(), 10_000);
        assert!(sender.attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_worker_drains_backlog_in_arrival_order() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);
        queue.start().unwrap();

        // Worker is parked on the empty queue.
        sleep(Duration::from_secs(5)).await;
        assert!(queue.is_worker_running());

        for i in 1..=5 {
            queue.enqueue(msg(&format!("m{i}"))).unwrap();
        }
        settle(&queue, 5).await;

        assert_eq!(sender.texts(), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_sends_are_paced() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);

        for i in 0..3 {
            queue.enqueue(msg(&i.to_string())).unwrap();
        }
        settle(&queue, 3).await;

        for pair in sender.attempts().windows(2) {
            assert!(pair[1].2 - pair[0].2 >= Duration::from_millis(50));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_parks_worker_and_rejects_new_messages() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);
        queue.start().unwrap();
        sleep(Duration::from_millis(100)).await;

        queue.stop();
        sleep(Duration::from_millis(100)).await;

        assert!(!queue.is_worker_running());
        assert_eq!(queue.enqueue(msg("late")), Err(DeliveryError::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_lets_current_retry_sequence_finish() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("slow", vec![flood(5)]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("slow")).unwrap();
        sleep(Duration::from_secs(1)).await;
        queue.stop();

        settle(&queue, 1).await;
        assert_eq!(queue.snapshot().delivered, 1);
        sleep(Duration::from_secs(1)).await;
        assert!(!queue.is_worker_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_clears_pending_backlog() {
        let sender = Arc::new(ScriptedSender::default());
        sender.script("slow", vec![flood(5)]);
        let queue = queue_with(&sender);

        queue.enqueue(msg("slow")).unwrap();
        for i in 0..4 {
            queue.enqueue(msg(&format!("queued{i}"))).unwrap();
        }
        sleep(Duration::from_secs(1)).await;
        assert_eq!(queue.pending(), 4);

        queue.stop();
        settle(&queue, 1).await;
        sleep(Duration::from_secs(1)).await;

        assert!(!queue.is_worker_running());
        assert_eq!(sender.texts(), vec!["slow", "slow"]);
        let snapshot = queue.snapshot();
        assert_eq!(snapshot.pending, 0);
        assert_eq!(snapshot.completed(), 1);
    }

    #[test]
    fn test_enqueue_without_runtime_is_rejected() {
        let sender = Arc::new(ScriptedSender::default());
        let queue = queue_with(&sender);

        assert_eq!(queue.enqueue(msg("hi")), Err(DeliveryError::NoRuntime));
        assert_eq!(queue.pending(), 0);
    }
}
