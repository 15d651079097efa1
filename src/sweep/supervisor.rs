//! Fault-tolerant worker-pool supervision.
//!
//! Trials are expensive, occasionally crash, and occasionally hang forever,
//! so the supervisor is written as an explicit state machine over the whole
//! run rather than a fire-and-forget parallel map:
//!
//! - RUNNING: a pool generation of W workers pulls tasks from an injector
//!   channel; the supervisor retires exactly one result per step, in
//!   submission order, waiting at most the per-task deadline.
//! - TIMED_OUT: the awaited task is recorded as a timeout and abandoned
//!   (never retried), and the whole generation is forcibly terminated.
//! - RESTARTING: dead generations' scratch space is reclaimed and a fresh
//!   generation takes over from the advanced index. If recreation itself
//!   fails, the failure
//!   goes to the persistent error log and the run stalls where it is.
//! - HALTED: too many back-to-back timeouts; logged persistently, remaining
//!   tasks are never attempted.
//! - DONE: the index reached the end; the pool is closed gracefully.
//!
//! Cancellation granularity is deliberately coarse: one hung worker costs
//! the whole generation, including any collateral in-flight work. Rust
//! threads cannot be killed from inside the process, so "forcible
//! termination" drops both channel ends and detaches the generation's
//! threads; live workers exit at their next channel operation and a truly
//! hung one is leaked to the OS along with its generation.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::domain::{Outcome, ResultRecord, Task};
use crate::io::ErrorLog;

/// Why a trial failed, other than the deadline. The message ends up in the
/// task's `Outcome::Error` verbatim.
#[derive(Debug, Clone)]
pub struct TrialError(pub String);

impl std::fmt::Display for TrialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TrialError {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

impl From<&str> for TrialError {
    fn from(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

/// The trial callback contract: pure task in, record or classifiable error
/// out, safe to run concurrently with other trials given the task's unique
/// iteration id. The second argument is the pool generation running the
/// attempt: a detached worker from a terminated generation can still be
/// mid-trial when the replacement re-runs the same iteration, so any
/// per-attempt scratch resource must be namespaced by generation as well as
/// iteration. Panics inside the callback are caught at the task boundary
/// and classified as errors.
pub type TrialFn = dyn Fn(&Task, u64) -> Result<ResultRecord, TrialError> + Send + Sync;

/// Run-wide supervision settings.
///
/// Deadline and threshold have no defaults on purpose: the right values
/// depend on the instrument response and the host, and both must come from
/// the operator.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Worker threads per pool generation.
    pub workers: usize,
    /// Bounded wait for each in-order result.
    pub task_deadline: Duration,
    /// Back-to-back timeouts beyond which the run hard-stops.
    pub max_consecutive_timeouts: u32,
}

impl SupervisorConfig {
    /// Half the available cores minus one, leaving headroom for the
    /// supervisor thread and the OS. Never below 1.
    pub fn default_workers() -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(2);
        (cores / 2).saturating_sub(1).max(1)
    }
}

/// Everything the run produced, in submission order.
///
/// `outcomes` holds exactly one entry per *attempted* task; `timed_out` and
/// `errored` are the post-mortem views of the failure subsets. Tasks beyond
/// a hard stop or stall were never attempted and appear nowhere.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<Outcome>,
    pub timed_out: Vec<Task>,
    pub errored: Vec<(Task, String)>,
    /// The consecutive-timeout threshold was exceeded.
    pub halted: bool,
    /// A pool generation could not be (re)created; the run stopped at the
    /// current index and must be re-invoked by an operator.
    pub stalled: bool,
}

impl RunReport {
    /// Successful records, in submission order.
    pub fn successes(&self) -> impl Iterator<Item = &ResultRecord> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Success(r) => Some(r),
            _ => None,
        })
    }

    /// (successes, timeouts, errors).
    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.outcomes.len() - self.timed_out.len() - self.errored.len(),
            self.timed_out.len(),
            self.errored.len(),
        )
    }
}

/// Owns pool generations and the run's execution state. The state (next
/// index, outcome lists, timeout counter) is mutated only by [`Self::run`]'s
/// control loop; workers never see it.
pub struct Supervisor {
    config: SupervisorConfig,
    trial: Arc<TrialFn>,
    error_log: ErrorLog,
    reclaim: Option<Box<dyn FnMut(u64)>>,
    #[cfg(test)]
    fail_respawns: bool,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig, trial: Arc<TrialFn>, error_log: ErrorLog) -> Self {
        Self {
            config,
            trial,
            error_log,
            reclaim: None,
            #[cfg(test)]
            fail_respawns: false,
        }
    }

    /// Install a reclamation pass that runs between terminating a generation
    /// and spawning its replacement. It receives the replacement's
    /// generation number; every generation below it is dead, so the pass
    /// may release their resources (e.g. abandoned scratch files) without
    /// touching anything the replacement will own.
    pub fn with_reclaimer(mut self, reclaim: impl FnMut(u64) + 'static) -> Self {
        self.reclaim = Some(Box::new(reclaim));
        self
    }

    /// Refuse every pool recreation, forcing the stall path.
    #[cfg(test)]
    fn with_failing_respawns(mut self) -> Self {
        self.fail_respawns = true;
        self
    }

    fn spawn_generation(
        &self,
        tasks: &[Task],
        start: usize,
        generation: u64,
    ) -> std::io::Result<PoolGeneration> {
        #[cfg(test)]
        if self.fail_respawns && generation > 0 {
            return Err(std::io::Error::other("respawn refused"));
        }
        PoolGeneration::spawn(
            self.config.workers,
            Arc::clone(&self.trial),
            tasks,
            start,
            generation,
        )
    }

    /// Execute the task list to completion, hard stop, or stall.
    ///
    /// `on_outcome` fires once per attempted task, in submission order,
    /// whether it succeeded, timed out, or errored, so callers can drive a
    /// progress display that shows liveness even through failures.
    pub fn run(&mut self, tasks: &[Task], mut on_outcome: impl FnMut(&Outcome)) -> RunReport {
        let mut report = RunReport::default();
        let mut next: usize = 0;
        let mut consecutive_timeouts: u32 = 0;
        let mut generation: u64 = 0;
        // Results delivered ahead of the in-order cursor wait here.
        let mut buffer: HashMap<usize, Result<ResultRecord, TrialError>> = HashMap::new();

        let mut pool = match self.spawn_generation(tasks, next, generation) {
            Ok(g) => g,
            Err(e) => {
                self.error_log
                    .append_best_effort(&format!("pool recreation failed: {e}"));
                report.stalled = true;
                return report;
            }
        };

        while next < tasks.len() {
            let task = tasks[next];
            match pool.retire(next, self.config.task_deadline, &mut buffer) {
                Retire::Done(Ok(record)) => {
                    consecutive_timeouts = 0;
                    let outcome = Outcome::Success(record);
                    on_outcome(&outcome);
                    report.outcomes.push(outcome);
                    next += 1;
                }
                Retire::Done(Err(err)) => {
                    // A computational failure is not evidence of a stuck
                    // worker; the counter resets and the pool lives on.
                    consecutive_timeouts = 0;
                    report.errored.push((task, err.0.clone()));
                    let outcome = Outcome::Error(task, err.0);
                    on_outcome(&outcome);
                    report.outcomes.push(outcome);
                    next += 1;
                }
                Retire::TimedOut => {
                    consecutive_timeouts += 1;
                    report.timed_out.push(task);
                    let outcome = Outcome::Timeout(task);
                    on_outcome(&outcome);
                    report.outcomes.push(outcome);
                    next += 1;

                    pool.terminate();
                    buffer.clear();

                    if consecutive_timeouts > self.config.max_consecutive_timeouts {
                        self.error_log
                            .append_best_effort("maximum consecutive timeouts exceeded");
                        report.halted = true;
                        return report;
                    }

                    generation += 1;
                    if let Some(reclaim) = self.reclaim.as_mut() {
                        reclaim(generation);
                    }

                    pool = match self.spawn_generation(tasks, next, generation) {
                        Ok(g) => g,
                        Err(e) => {
                            self.error_log
                                .append_best_effort(&format!("pool recreation failed: {e}"));
                            report.stalled = true;
                            return report;
                        }
                    };
                }
                Retire::PoolLost => {
                    // All workers vanished while work was outstanding. Not a
                    // timeout, so the counter is untouched, but the
                    // generation is unusable and gets replaced.
                    report
                        .errored
                        .push((task, "worker pool disconnected unexpectedly".to_string()));
                    let outcome =
                        Outcome::Error(task, "worker pool disconnected unexpectedly".to_string());
                    on_outcome(&outcome);
                    report.outcomes.push(outcome);
                    next += 1;

                    pool.terminate();
                    buffer.clear();
                    generation += 1;
                    pool = match self.spawn_generation(tasks, next, generation) {
                        Ok(g) => g,
                        Err(e) => {
                            self.error_log
                                .append_best_effort(&format!("pool recreation failed: {e}"));
                            report.stalled = true;
                            return report;
                        }
                    };
                }
            }
        }

        pool.close();
        report
    }
}

enum Retire {
    Done(Result<ResultRecord, TrialError>),
    TimedOut,
    PoolLost,
}

/// One instantiation of the worker pool. Replaced wholesale on timeout,
/// never partially repaired.
struct PoolGeneration {
    task_tx: Option<mpsc::Sender<(usize, Task)>>,
    result_rx: mpsc::Receiver<(usize, Result<ResultRecord, TrialError>)>,
    handles: Vec<JoinHandle<()>>,
}

impl PoolGeneration {
    /// Spawn `workers` threads and enqueue every task from `start` onward.
    /// Workers pull from a shared injector, run the trial behind a panic
    /// boundary, and report `(index, result)` pairs back. Each worker tells
    /// the trial which generation it belongs to, so per-attempt scratch
    /// resources never collide with a detached predecessor's.
    fn spawn(
        workers: usize,
        trial: Arc<TrialFn>,
        tasks: &[Task],
        start: usize,
        generation: u64,
    ) -> std::io::Result<Self> {
        let (task_tx, task_rx) = mpsc::channel::<(usize, Task)>();
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, result_rx) = mpsc::channel();

        let mut handles = Vec::with_capacity(workers);
        for w in 0..workers.max(1) {
            let task_rx = Arc::clone(&task_rx);
            let result_tx = result_tx.clone();
            let trial = Arc::clone(&trial);
            let handle = std::thread::Builder::new()
                .name(format!("sweep-g{generation}-w{w}"))
                .spawn(move || {
                    loop {
                        // Hold the lock only for the receive itself.
                        let msg = match task_rx.lock() {
                            Ok(rx) => rx.recv(),
                            Err(_) => break,
                        };
                        let Ok((index, task)) = msg else { break };
                        let result = catch_unwind(AssertUnwindSafe(|| trial(&task, generation)))
                            .unwrap_or_else(|payload| Err(TrialError(panic_message(payload))));
                        if result_tx.send((index, result)).is_err() {
                            // Generation was terminated under us.
                            break;
                        }
                    }
                })?;
            handles.push(handle);
        }

        for (index, task) in tasks.iter().enumerate().skip(start) {
            // Send only fails if every worker already died, which surfaces
            // as PoolLost at retire time.
            let _ = task_tx.send((index, *task));
        }

        Ok(Self {
            task_tx: Some(task_tx),
            result_rx,
            handles,
        })
    }

    /// Retire the result for `expected`, waiting at most `deadline`.
    ///
    /// Results for later indices that arrive while waiting are buffered so
    /// recorded outcomes keep submission order regardless of completion
    /// order inside the pool.
    fn retire(
        &self,
        expected: usize,
        deadline: Duration,
        buffer: &mut HashMap<usize, Result<ResultRecord, TrialError>>,
    ) -> Retire {
        if let Some(result) = buffer.remove(&expected) {
            return Retire::Done(result);
        }

        let start = Instant::now();
        loop {
            let Some(remaining) = deadline.checked_sub(start.elapsed()) else {
                return Retire::TimedOut;
            };
            match self.result_rx.recv_timeout(remaining) {
                Ok((index, result)) if index == expected => return Retire::Done(result),
                Ok((index, result)) => {
                    buffer.insert(index, result);
                }
                Err(RecvTimeoutError::Timeout) => return Retire::TimedOut,
                Err(RecvTimeoutError::Disconnected) => return Retire::PoolLost,
            }
        }
    }

    /// Forcible termination: no graceful join, since a hung worker may
    /// never return. Dropping the channel ends unblocks live workers;
    /// dropping the join handles detaches the threads.
    fn terminate(&mut self) {
        self.task_tx = None;
        self.handles.clear();
    }

    /// Graceful close for the DONE path: stop dispatch, let in-flight work
    /// finish, and join every worker.
    fn close(mut self) {
        self.task_tx = None;
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("trial panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("trial panicked: {s}")
    } else {
        "trial panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GroupKey;
    use crate::sweep::generate;

    fn test_log(name: &str) -> (ErrorLog, std::path::PathBuf) {
        let path = std::env::temp_dir().join(format!(
            "xrbsweep_supervisor_{name}_{}.log",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();
        (ErrorLog::with_command(&path, "xrbsweep test"), path)
    }

    /// Stub record tagged with the producing task's iteration id so tests
    /// can check outcome ordering.
    fn stub_record(task: &Task) -> ResultRecord {
        let mut r = ResultRecord::unfitted(task.key, 1.0, 100.0);
        r.red_chi_squared = Some(task.iteration as f64);
        r.d_fit = Some(task.key.d);
        r
    }

    fn config(workers: usize, deadline_ms: u64, max_timeouts: u32) -> SupervisorConfig {
        SupervisorConfig {
            workers,
            task_deadline: Duration::from_millis(deadline_ms),
            max_consecutive_timeouts: max_timeouts,
        }
    }

    #[test]
    fn all_successes_yield_one_outcome_per_task_in_order() {
        let tasks = generate(&[0.1, 1.0], &[2.0, 8.0], 3).unwrap();
        let (log, path) = test_log("all_success");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| Ok(stub_record(task)));

        let mut ticks = 0usize;
        let report = Supervisor::new(config(4, 5_000, 2), trial, log).run(&tasks, |_| ticks += 1);

        assert_eq!(report.outcomes.len(), tasks.len());
        assert_eq!(ticks, tasks.len());
        assert!(!report.halted && !report.stalled);
        assert!(report.timed_out.is_empty() && report.errored.is_empty());
        // Outcomes carry the submission order even though four workers
        // raced on the queue.
        for (i, outcome) in report.outcomes.iter().enumerate() {
            match outcome {
                Outcome::Success(r) => assert_eq!(r.red_chi_squared, Some(i as f64)),
                other => panic!("expected success at {i}, got {other:?}"),
            }
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn hanging_trials_halt_once_the_threshold_is_exceeded() {
        let tasks = generate(&[0.1], &[1.0], 10).unwrap();
        let (log, path) = test_log("hang");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(stub_record(task))
        });

        let report = Supervisor::new(config(2, 20, 2), trial, log).run(&tasks, |_| {});

        // Timeouts on tasks 0, 1, 2; the third pushes the counter past the
        // threshold of 2 and the run halts. Later tasks are never attempted.
        assert!(report.halted);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.timed_out.len(), 3);
        assert!(report.outcomes.iter().all(|o| matches!(o, Outcome::Timeout(_))));
        assert_eq!(report.timed_out[0].iteration, 0);
        assert_eq!(report.timed_out[2].iteration, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("maximum consecutive timeouts exceeded"));
        assert!(text.contains("cmd: xrbsweep test"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_deterministic_failure_is_recorded_without_touching_the_timeout_counter() {
        let tasks = generate(&[0.1], &[1.0, 2.0], 3).unwrap();
        let (log, path) = test_log("one_error");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| {
            if task.iteration == 3 {
                Err(TrialError::from("fit did not converge"))
            } else {
                Ok(stub_record(task))
            }
        });

        let report = Supervisor::new(config(2, 5_000, 0), trial, log).run(&tasks, |_| {});

        // Threshold 0 means a single timeout would halt; an error must not.
        assert!(!report.halted);
        assert_eq!(report.outcomes.len(), tasks.len());
        assert_eq!(report.errored.len(), 1);
        assert_eq!(report.errored[0].0.iteration, 3);
        assert_eq!(report.errored[0].1, "fit did not converge");
        match &report.outcomes[3] {
            Outcome::Error(task, msg) => {
                assert_eq!(task.iteration, 3);
                assert_eq!(msg, "fit did not converge");
            }
            other => panic!("expected error outcome, got {other:?}"),
        }
        assert_eq!(report.counts(), (5, 0, 1));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_panicking_trial_becomes_an_error_outcome() {
        let tasks = generate(&[0.5], &[4.0], 2).unwrap();
        let (log, path) = test_log("panic");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| {
            if task.iteration == 0 {
                panic!("bad parameter");
            }
            Ok(stub_record(task))
        });

        let report = Supervisor::new(config(1, 5_000, 2), trial, log).run(&tasks, |_| {});

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.errored.len(), 1);
        assert!(report.errored[0].1.contains("bad parameter"));
        assert!(report.outcomes[1].is_success());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn the_run_recovers_after_an_isolated_hang() {
        let tasks = generate(&[0.1], &[1.0], 6).unwrap();
        let (log, path) = test_log("recover");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| {
            if task.iteration == 2 {
                std::thread::sleep(Duration::from_millis(60_000));
            }
            Ok(stub_record(task))
        });

        let reclaims = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&reclaims);
        let report = Supervisor::new(config(2, 200, 5), trial, log)
            .with_reclaimer(move |dead_before| {
                assert_eq!(dead_before, 1);
                counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            })
            .run(&tasks, |_| {});

        // One timeout, then a fresh generation finishes the rest.
        assert!(!report.halted && !report.stalled);
        assert_eq!(report.outcomes.len(), 6);
        assert_eq!(report.timed_out.len(), 1);
        assert_eq!(report.timed_out[0].iteration, 2);
        assert_eq!(reclaims.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert!(matches!(report.outcomes[2], Outcome::Timeout(_)));
        for i in [0usize, 1, 3, 4, 5] {
            assert!(report.outcomes[i].is_success(), "task {i} should succeed");
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_redispatched_task_runs_in_a_distinct_generation_from_its_abandoned_attempt() {
        // Task 0 hangs past the deadline; task 1's first attempt is slow
        // enough to still be running, detached, when the replacement
        // generation re-runs it. The overlapping attempts must see
        // different generation numbers, so their scratch paths differ.
        let tasks = generate(&[0.1], &[1.0], 4).unwrap();
        let (log, path) = test_log("redispatch");
        let seen: Arc<Mutex<Vec<(u64, u64)>>> = Arc::new(Mutex::new(Vec::new()));
        let attempts = Arc::clone(&seen);
        let trial: Arc<TrialFn> = Arc::new(move |task: &Task, generation: u64| {
            attempts.lock().unwrap().push((task.iteration, generation));
            if task.iteration == 0 {
                std::thread::sleep(Duration::from_millis(60_000));
            }
            if task.iteration == 1 && generation == 0 {
                std::thread::sleep(Duration::from_millis(1_200));
            }
            Ok(stub_record(task))
        });

        let report = Supervisor::new(config(2, 400, 5), trial, log).run(&tasks, |_| {});

        assert_eq!(report.timed_out.len(), 1);
        assert_eq!(report.timed_out[0].iteration, 0);
        assert!(report.outcomes[1..].iter().all(Outcome::is_success));

        let seen = seen.lock().unwrap();
        let gens: Vec<u64> = seen.iter().filter(|(i, _)| *i == 1).map(|&(_, g)| g).collect();
        assert_eq!(gens, vec![0, 1]);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn a_failed_pool_recreation_stalls_the_run_and_keeps_collected_outcomes() {
        let tasks = generate(&[0.1], &[1.0], 4).unwrap();
        let (log, path) = test_log("stall");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| {
            if task.iteration == 2 {
                std::thread::sleep(Duration::from_millis(60_000));
            }
            Ok(stub_record(task))
        });

        let report = Supervisor::new(config(1, 200, 5), trial, log)
            .with_failing_respawns()
            .run(&tasks, |_| {});

        // The run stops where the replacement could not be created, but
        // nothing already collected is lost: two successes, the timeout,
        // and no attempt at task 3.
        assert!(report.stalled);
        assert!(!report.halted);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.counts(), (2, 1, 0));
        assert!(matches!(report.outcomes[2], Outcome::Timeout(_)));

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("pool recreation failed"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn stub_outcomes_aggregate_to_the_repeated_deterministic_value() {
        // Two distances, one column, three iterations each: six successes,
        // two group summaries, and since the stub always fits d_fit to the
        // true distance, each group's median is exactly that value.
        let tasks = generate(&[0.1], &[2.0, 8.0], 3).unwrap();
        let (log, path) = test_log("aggregate");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| Ok(stub_record(task)));

        let report = Supervisor::new(config(2, 5_000, 2), trial, log).run(&tasks, |_| {});
        assert_eq!(report.outcomes.len(), 6);
        assert!(report.outcomes.iter().all(Outcome::is_success));

        let summaries = crate::sweep::aggregate(&report.outcomes, &[0.1], &[2.0, 8.0]);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].d_fit, Some(2.0));
        assert_eq!(summaries[1].d_fit, Some(8.0));
        assert!(summaries.iter().all(|s| s.n_success == 3));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn successes_iterator_and_group_keys_survive_the_round_trip() {
        let key = GroupKey { nh: 0.1, d: 8.0 };
        let tasks = vec![Task { key, iteration: 0 }, Task { key, iteration: 1 }];
        let (log, path) = test_log("successes");
        let trial: Arc<TrialFn> = Arc::new(|task: &Task, _: u64| Ok(stub_record(task)));

        let report = Supervisor::new(config(1, 5_000, 1), trial, log).run(&tasks, |_| {});

        let records: Vec<_> = report.successes().collect();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.group_key() == key));
        std::fs::remove_file(&path).ok();
    }
}
