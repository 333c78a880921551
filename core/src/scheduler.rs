//! Fixed-rate background scheduler for the dictionary sync tasks.
//!
//! A timer thread keeps a min-heap of due times and dispatches due tasks to
//! a small fixed-size worker pool over a channel. A task is re-queued only
//! after its run returns, with `next = max(scheduled + period, now)`: a slow
//! run delays its own next run but can never overlap it, and independent
//! tasks block each other only through pool capacity.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

type Job = Arc<dyn Fn() + Send + Sync + 'static>;

struct ScheduledTask {
    due: Instant,
    period: Duration,
    job: Job,
}

// Min-heap ordering on the due time.
impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due
    }
}
impl Eq for ScheduledTask {}
impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other.due.cmp(&self.due)
    }
}

struct SchedulerShared {
    queue: Mutex<BinaryHeap<ScheduledTask>>,
    wakeup: Condvar,
    shutdown: AtomicBool,
}

/// Fixed-rate task scheduler backed by a small worker pool.
pub struct Scheduler {
    shared: Arc<SchedulerShared>,
    dispatch_tx: Option<Sender<ScheduledTask>>,
    timer: Option<thread::JoinHandle<()>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler with `workers` pool threads (at least one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let shared = Arc::new(SchedulerShared {
            queue: Mutex::new(BinaryHeap::new()),
            wakeup: Condvar::new(),
            shutdown: AtomicBool::new(false),
        });
        let (dispatch_tx, dispatch_rx) = crossbeam_channel::unbounded::<ScheduledTask>();

        let worker_handles = (0..workers)
            .map(|index| {
                let shared = Arc::clone(&shared);
                let rx: Receiver<ScheduledTask> = dispatch_rx.clone();
                thread::Builder::new()
                    .name(format!("dict-sync-worker-{index}"))
                    .spawn(move || worker_loop(shared, rx))
                    .expect("spawn scheduler worker")
            })
            .collect();

        let timer = {
            let shared = Arc::clone(&shared);
            let tx = dispatch_tx.clone();
            thread::Builder::new()
                .name("dict-sync-timer".to_string())
                .spawn(move || timer_loop(shared, tx))
                .expect("spawn scheduler timer")
        };

        Self {
            shared,
            dispatch_tx: Some(dispatch_tx),
            timer: Some(timer),
            workers: worker_handles,
        }
    }

    /// Schedule `job` to first run after `initial_delay`, then at fixed
    /// `period`.
    pub fn schedule_at_fixed_rate<F>(&self, initial_delay: Duration, period: Duration, job: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = ScheduledTask {
            due: Instant::now() + initial_delay,
            period,
            job: Arc::new(job),
        };
        self.shared.queue.lock().push(task);
        self.shared.wakeup.notify_one();
    }

    /// Stop dispatching, let in-flight runs finish, and join all threads.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.shared.shutdown.swap(true, AtomicOrdering::SeqCst) {
            return;
        }
        self.shared.wakeup.notify_all();
        // Dropping the sender ends the workers' receive loops.
        self.dispatch_tx.take();
        if let Some(timer) = self.timer.take() {
            let _ = timer.join();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        debug!("dictionary sync scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn timer_loop(shared: Arc<SchedulerShared>, tx: Sender<ScheduledTask>) {
    let mut queue = shared.queue.lock();
    loop {
        if shared.shutdown.load(AtomicOrdering::SeqCst) {
            return;
        }
        let now = Instant::now();
        while queue.peek().is_some_and(|task| task.due <= now) {
            let task = match queue.pop() {
                Some(task) => task,
                None => break,
            };
            if tx.send(task).is_err() {
                return;
            }
        }
        let wait = queue
            .peek()
            .map(|task| task.due.saturating_duration_since(now))
            .unwrap_or(Duration::from_secs(1));
        let _ = shared.wakeup.wait_for(&mut queue, wait);
    }
}

fn worker_loop(shared: Arc<SchedulerShared>, rx: Receiver<ScheduledTask>) {
    while let Ok(task) = rx.recv() {
        (task.job)();
        if shared.shutdown.load(AtomicOrdering::SeqCst) {
            return;
        }
        // Fixed-rate, non-overlapping: a run that overshot its period goes
        // straight back to the front of the queue.
        let next = ScheduledTask {
            due: (task.due + task.period).max(Instant::now()),
            period: task.period,
            job: task.job,
        };
        shared.queue.lock().push(next);
        shared.wakeup.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_after_initial_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(1);
        let seen = Arc::clone(&counter);
        scheduler.schedule_at_fixed_rate(
            Duration::from_millis(20),
            Duration::from_secs(60),
            move || {
                seen.fetch_add(1, AtomicOrdering::SeqCst);
            },
        );
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 0);
        thread::sleep(Duration::from_millis(200));
        assert_eq!(counter.load(AtomicOrdering::SeqCst), 1);
        scheduler.shutdown();
    }

    #[test]
    fn repeats_at_fixed_period() {
        let counter = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(1);
        let seen = Arc::clone(&counter);
        scheduler.schedule_at_fixed_rate(
            Duration::from_millis(5),
            Duration::from_millis(30),
            move || {
                seen.fetch_add(1, AtomicOrdering::SeqCst);
            },
        );
        thread::sleep(Duration::from_millis(300));
        let runs = counter.load(AtomicOrdering::SeqCst);
        assert!(runs >= 3, "expected repeated runs, got {runs}");
        scheduler.shutdown();
    }

    #[test]
    fn slow_task_never_overlaps_itself() {
        let active = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));
        let scheduler = Scheduler::new(2);
        let active_ref = Arc::clone(&active);
        let overlapped_ref = Arc::clone(&overlapped);
        scheduler.schedule_at_fixed_rate(
            Duration::from_millis(5),
            Duration::from_millis(10),
            move || {
                if active_ref.fetch_add(1, AtomicOrdering::SeqCst) > 0 {
                    overlapped_ref.store(true, AtomicOrdering::SeqCst);
                }
                // Runs longer than its own period.
                thread::sleep(Duration::from_millis(40));
                active_ref.fetch_sub(1, AtomicOrdering::SeqCst);
            },
        );
        thread::sleep(Duration::from_millis(300));
        scheduler.shutdown();
        assert!(!overlapped.load(AtomicOrdering::SeqCst));
    }

    #[test]
    fn independent_tasks_share_the_pool() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(2);
        let first_ref = Arc::clone(&first);
        scheduler.schedule_at_fixed_rate(
            Duration::from_millis(5),
            Duration::from_millis(25),
            move || {
                first_ref.fetch_add(1, AtomicOrdering::SeqCst);
            },
        );
        let second_ref = Arc::clone(&second);
        scheduler.schedule_at_fixed_rate(
            Duration::from_millis(5),
            Duration::from_millis(25),
            move || {
                second_ref.fetch_add(1, AtomicOrdering::SeqCst);
            },
        );
        thread::sleep(Duration::from_millis(200));
        scheduler.shutdown();
        assert!(first.load(AtomicOrdering::SeqCst) >= 2);
        assert!(second.load(AtomicOrdering::SeqCst) >= 2);
    }

    #[test]
    fn shutdown_joins_cleanly_with_no_tasks() {
        let scheduler = Scheduler::new(1);
        scheduler.shutdown();
    }
}
