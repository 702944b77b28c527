//! In-process interval scheduler.
//!
//! Each registered job runs at most once at a time. A tick that arrives while
//! the previous run is still in flight is dropped and counted, never queued.
//! Stopping the scheduler cancels the timers only; a run already in progress
//! finishes on its own.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Work the scheduler can drive. `run` reports success; it must not panic,
/// but a panic is contained and counted as a failure.
#[async_trait]
pub trait ScheduledJob: Send + Sync + 'static {
    fn id(&self) -> &str;
    async fn run(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Succeeded,
    Failed,
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JobStats {
    pub runs: u64,
    pub failures: u64,
    pub skipped: u64,
}

/// Per-id state. Re-registering swaps `job` but keeps the slot, so the
/// in-flight flag and counters belong to the id rather than to one job value.
struct JobSlot {
    id: String,
    job: RwLock<Arc<dyn ScheduledJob>>,
    in_flight: AtomicBool,
    runs: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// Clears the in-flight flag when a run ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl JobSlot {
    fn new(job: Arc<dyn ScheduledJob>) -> Self {
        Self {
            id: job.id().to_owned(),
            job: RwLock::new(job),
            in_flight: AtomicBool::new(false),
            runs: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    fn current(&self) -> Arc<dyn ScheduledJob> {
        self.job
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn replace(&self, job: Arc<dyn ScheduledJob>) {
        *self.job.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = job;
    }

    fn try_claim(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    fn skip(&self) -> TickOutcome {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        warn!(job_id = %self.id, "previous run still in progress, skipping tick");
        TickOutcome::Skipped
    }

    async fn tick(&self) -> TickOutcome {
        let Some(_claim) = self.try_claim() else {
            return self.skip();
        };

        let job = self.current();
        let ok = match AssertUnwindSafe(job.run()).catch_unwind().await {
            Ok(ok) => ok,
            Err(_) => {
                error!(job_id = %self.id, "job panicked");
                false
            }
        };

        self.runs.fetch_add(1, Ordering::Relaxed);
        if ok {
            TickOutcome::Succeeded
        } else {
            self.failures.fetch_add(1, Ordering::Relaxed);
            TickOutcome::Failed
        }
    }

    fn stats(&self) -> JobStats {
        JobStats {
            runs: self.runs.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}

struct JobEntry {
    slot: Arc<JobSlot>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl JobEntry {
    fn arm(&mut self) {
        if self.timer.is_none() {
            self.timer = Some(spawn_timer(self.slot.clone(), self.interval));
        }
    }

    fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

fn spawn_timer(slot: Arc<JobSlot>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            // Runs are detached from the timer so aborting it never cuts one short.
            if slot.in_flight.load(Ordering::Acquire) {
                slot.skip();
                continue;
            }
            let slot = slot.clone();
            tokio::spawn(async move {
                slot.tick().await;
            });
        }
    })
}

/// Registry of interval jobs plus their timers.
pub struct Scheduler {
    jobs: Mutex<HashMap<String, JobEntry>>,
    running: AtomicBool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::init()
    }
}

impl Scheduler {
    /// Creates an empty, stopped scheduler.
    pub fn init() -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            running: AtomicBool::new(false),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<String, JobEntry>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `job` under its id, replacing any job already using that id.
    /// Returns `true` when an existing registration was replaced.
    ///
    /// A replacement takes over the id's slot: a run of the previous job that
    /// is still in flight keeps blocking new ticks, and stats carry over.
    pub fn ensure_registered(&self, job: Arc<dyn ScheduledJob>, interval: Duration) -> bool {
        let id = job.id().to_owned();
        let mut jobs = self.registry();
        let running = self.is_running();

        let replaced = match jobs.get_mut(&id) {
            Some(entry) => {
                entry.disarm();
                entry.slot.replace(job);
                entry.interval = interval;
                if running {
                    entry.arm();
                }
                true
            }
            None => {
                let mut entry = JobEntry {
                    slot: Arc::new(JobSlot::new(job)),
                    interval,
                    timer: None,
                };
                if running {
                    entry.arm();
                }
                jobs.insert(id.clone(), entry);
                false
            }
        };

        info!(job_id = %id, interval_secs = interval.as_secs_f64(), replaced, "job registered");
        replaced
    }

    /// Unregisters a job. Removing an unknown id is a no-op returning `false`.
    pub fn remove_job(&self, id: &str) -> bool {
        match self.registry().remove(id) {
            Some(mut entry) => {
                entry.disarm();
                info!(job_id = %id, "job removed");
                true
            }
            None => false,
        }
    }

    /// Arms every registered job. Returns `false` if already running.
    pub fn start(&self) -> bool {
        let mut jobs = self.registry();
        if self.running.swap(true, Ordering::AcqRel) {
            return false;
        }
        for entry in jobs.values_mut() {
            entry.arm();
        }
        info!(jobs = jobs.len(), "scheduler started");
        true
    }

    /// Cancels all timers. Runs already in progress complete normally.
    pub fn stop(&self) {
        let mut jobs = self.registry();
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        for entry in jobs.values_mut() {
            entry.disarm();
        }
        info!("scheduler stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.registry().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn stats(&self, id: &str) -> Option<JobStats> {
        self.registry().get(id).map(|entry| entry.slot.stats())
    }

    /// Triggers one tick of `id` immediately, obeying the same overlap rule
    /// as timer ticks. `None` when no such job is registered.
    pub async fn run_now(&self, id: &str) -> Option<TickOutcome> {
        let slot = self.registry().get(id).map(|entry| entry.slot.clone())?;
        Some(slot.tick().await)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    struct CountingJob {
        id: &'static str,
        outcome: bool,
        calls: AtomicUsize,
    }

    impl CountingJob {
        fn new(id: &'static str, outcome: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ScheduledJob for CountingJob {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
        }
    }

    /// Blocks inside `run` until released.
    struct GateJob {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ScheduledJob for GateJob {
        fn id(&self) -> &str {
            "gate"
        }

        async fn run(&self) -> bool {
            self.started.notify_one();
            self.release.notified().await;
            true
        }
    }

    /// Sleeps while tracking how many copies of itself run at once.
    struct SlowJob {
        active: AtomicUsize,
        max_observed_concurrent: AtomicUsize,
        completed: AtomicUsize,
    }

    #[async_trait]
    impl ScheduledJob for SlowJob {
        fn id(&self) -> &str {
            "slow"
        }

        async fn run(&self) -> bool {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_observed_concurrent.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(120)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.completed.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    struct PanickingJob;

    #[async_trait]
    impl ScheduledJob for PanickingJob {
        fn id(&self) -> &str {
            "panics"
        }

        async fn run(&self) -> bool {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_disarms() {
        let scheduler = Scheduler::init();
        scheduler.ensure_registered(CountingJob::new("a", true), Duration::from_secs(60));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(scheduler.is_running());

        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(scheduler.start());
        scheduler.stop();
    }

    #[tokio::test]
    async fn registering_the_same_id_replaces_the_job() {
        let scheduler = Scheduler::init();
        let first = CountingJob::new("fetch", true);
        let second = CountingJob::new("fetch", false);

        assert!(!scheduler.ensure_registered(first.clone(), Duration::from_secs(60)));
        assert!(scheduler.ensure_registered(second.clone(), Duration::from_secs(60)));
        assert_eq!(scheduler.job_ids(), vec!["fetch".to_string()]);

        assert_eq!(scheduler.run_now("fetch").await, Some(TickOutcome::Failed));
        assert_eq!(first.calls.load(Ordering::SeqCst), 0);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn removing_jobs() {
        let scheduler = Scheduler::init();
        scheduler.ensure_registered(CountingJob::new("a", true), Duration::from_secs(60));

        assert!(scheduler.remove_job("a"));
        assert!(!scheduler.remove_job("a"));
        assert!(!scheduler.remove_job("never-registered"));
        assert_eq!(scheduler.run_now("a").await, None);
    }

    #[tokio::test]
    async fn outcomes_are_counted() {
        let scheduler = Scheduler::init();
        scheduler.ensure_registered(CountingJob::new("ok", true), Duration::from_secs(60));
        scheduler.ensure_registered(CountingJob::new("bad", false), Duration::from_secs(60));

        assert_eq!(scheduler.run_now("ok").await, Some(TickOutcome::Succeeded));
        assert_eq!(scheduler.run_now("bad").await, Some(TickOutcome::Failed));
        assert_eq!(scheduler.run_now("bad").await, Some(TickOutcome::Failed));

        assert_eq!(
            scheduler.stats("bad"),
            Some(JobStats {
                runs: 2,
                failures: 2,
                skipped: 0
            })
        );
        assert_eq!(scheduler.stats("ok").unwrap().failures, 0);
    }

    #[tokio::test]
    async fn tick_during_a_run_is_skipped_not_queued() {
        let scheduler = Arc::new(Scheduler::init());
        let job = Arc::new(GateJob {
            started: Notify::new(),
            release: Notify::new(),
        });
        scheduler.ensure_registered(job.clone(), Duration::from_secs(3600));

        let background = scheduler.clone();
        let first = tokio::spawn(async move { background.run_now("gate").await });
        job.started.notified().await;

        assert_eq!(scheduler.run_now("gate").await, Some(TickOutcome::Skipped));

        job.release.notify_one();
        assert_eq!(first.await.unwrap(), Some(TickOutcome::Succeeded));

        let stats = scheduler.stats("gate").unwrap();
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn replacing_a_job_mid_run_keeps_the_overlap_guard() {
        let scheduler = Arc::new(Scheduler::init());
        let gate = Arc::new(GateJob {
            started: Notify::new(),
            release: Notify::new(),
        });
        scheduler.ensure_registered(gate.clone(), Duration::from_secs(3600));

        let background = scheduler.clone();
        let first = tokio::spawn(async move { background.run_now("gate").await });
        gate.started.notified().await;

        let replacement = CountingJob::new("gate", true);
        assert!(scheduler.ensure_registered(replacement.clone(), Duration::from_secs(3600)));

        assert_eq!(scheduler.run_now("gate").await, Some(TickOutcome::Skipped));
        assert_eq!(replacement.calls.load(Ordering::SeqCst), 0);

        gate.release.notify_one();
        assert_eq!(first.await.unwrap(), Some(TickOutcome::Succeeded));

        assert_eq!(scheduler.run_now("gate").await, Some(TickOutcome::Succeeded));
        assert_eq!(replacement.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            scheduler.stats("gate"),
            Some(JobStats {
                runs: 2,
                failures: 0,
                skipped: 1
            })
        );
    }

    #[tokio::test]
    async fn stats_survive_replacement() {
        let scheduler = Scheduler::init();
        scheduler.ensure_registered(CountingJob::new("fetch", false), Duration::from_secs(60));
        assert_eq!(scheduler.run_now("fetch").await, Some(TickOutcome::Failed));

        scheduler.ensure_registered(CountingJob::new("fetch", true), Duration::from_secs(30));
        assert_eq!(scheduler.run_now("fetch").await, Some(TickOutcome::Succeeded));

        let stats = scheduler.stats("fetch").unwrap();
        assert_eq!(stats.runs, 2);
        assert_eq!(stats.failures, 1);
    }

    #[tokio::test]
    async fn panicking_job_counts_as_failure_and_releases_the_slot() {
        let scheduler = Scheduler::init();
        scheduler.ensure_registered(Arc::new(PanickingJob), Duration::from_secs(60));

        assert_eq!(scheduler.run_now("panics").await, Some(TickOutcome::Failed));
        assert_eq!(scheduler.run_now("panics").await, Some(TickOutcome::Failed));
        assert_eq!(scheduler.stats("panics").unwrap().skipped, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn timer_never_overlaps_runs() {
        let scheduler = Scheduler::init();
        let job = Arc::new(SlowJob {
            active: AtomicUsize::new(0),
            max_observed_concurrent: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        });
        scheduler.ensure_registered(job.clone(), Duration::from_millis(30));

        scheduler.start();
        tokio::time::sleep(Duration::from_millis(500)).await;
        scheduler.stop();
        tokio::time::sleep(Duration::from_millis(200)).await;

        let stats = scheduler.stats("slow").unwrap();
        assert!(job.completed.load(Ordering::SeqCst) >= 1);
        assert_eq!(job.max_observed_concurrent.load(Ordering::SeqCst), 1);
        assert!(stats.skipped >= 1, "expected skipped ticks, got {stats:?}");
        assert_eq!(job.active.load(Ordering::SeqCst), 0);
    }
}
