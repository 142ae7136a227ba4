//! Work-stealing task scheduler.
//!
//! Worker threads are grouped into nodes; each node owns one
//! [`TaskQueue`]. A worker pulls from its own node's queue first and,
//! when that runs dry, steals from the other nodes' queues (nearest
//! node first). Chunk-parallel operators schedule one task per chunk
//! and block on [`TaskScheduler::wait_for_tasks`] — the only suspension
//! point; a task that has started always runs to completion.

pub mod queue;
pub mod task;

pub use queue::TaskQueue;
pub use task::{NodeId, SchedulePriority, Task, NUM_PRIORITY_LEVELS};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// How workers map onto nodes.
///
/// On uniform-memory machines everything lives on one node. Larger
/// machines approximate locality by splitting workers into groups that
/// prefer their own queue before stealing across.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Number of nodes (one task queue each).
    pub num_nodes: usize,
    /// Workers assigned to each node.
    pub workers_per_node: usize,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            num_nodes: 1,
            workers_per_node: usize::MAX,
        }
    }
}

impl Topology {
    /// Creates an explicit topology.
    #[must_use]
    pub fn with_nodes(num_nodes: usize, workers_per_node: usize) -> Self {
        Self {
            num_nodes,
            workers_per_node,
        }
    }

    /// Picks a topology for a worker count.
    ///
    /// Heuristic: two nodes above 8 workers, one otherwise.
    #[must_use]
    pub fn auto_detect(num_workers: usize) -> Self {
        if num_workers > 8 {
            Self {
                num_nodes: 2,
                workers_per_node: num_workers.div_ceil(2),
            }
        } else {
            Self::default()
        }
    }

    /// The node a worker belongs to.
    #[must_use]
    pub fn worker_node(&self, worker_id: usize) -> NodeId {
        if self.workers_per_node == usize::MAX {
            0
        } else {
            (worker_id / self.workers_per_node) % self.num_nodes
        }
    }
}

struct SchedulerShared {
    queues: Vec<Arc<TaskQueue>>,
    shutdown: AtomicBool,
    idle_lock: Mutex<()>,
    idle_signal: Condvar,
}

impl SchedulerShared {
    fn all_queues_empty(&self) -> bool {
        self.queues.iter().all(|q| q.is_empty())
    }
}

/// The engine's worker pool and its per-node queues.
///
/// Dropping the scheduler drains the queues and joins all workers.
pub struct TaskScheduler {
    shared: Arc<SchedulerShared>,
    topology: Topology,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl TaskScheduler {
    /// Spawns a scheduler with an auto-detected topology.
    #[must_use]
    pub fn new(num_workers: usize) -> Self {
        Self::with_topology(num_workers, Topology::auto_detect(num_workers))
    }

    /// Spawns a scheduler with an explicit topology.
    ///
    /// # Panics
    /// Panics on zero workers or zero nodes.
    #[must_use]
    pub fn with_topology(num_workers: usize, topology: Topology) -> Self {
        assert!(num_workers > 0, "the scheduler needs at least one worker");
        assert!(topology.num_nodes > 0, "the scheduler needs at least one node");

        let shared = Arc::new(SchedulerShared {
            queues: (0..topology.num_nodes)
                .map(|node| Arc::new(TaskQueue::new(node)))
                .collect(),
            shutdown: AtomicBool::new(false),
            idle_lock: Mutex::new(()),
            idle_signal: Condvar::new(),
        });

        let workers = (0..num_workers)
            .map(|worker_id| {
                let shared = Arc::clone(&shared);
                let node = topology.worker_node(worker_id);
                std::thread::Builder::new()
                    .name(format!("tessera-worker-{worker_id}"))
                    .spawn(move || worker_loop(&shared, node))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        tracing::debug!(num_workers, num_nodes = topology.num_nodes, "scheduler started");

        Self {
            shared,
            topology,
            workers: Mutex::new(workers),
            stopped: AtomicBool::new(false),
        }
    }

    /// Number of nodes (and queues).
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.topology.num_nodes
    }

    /// Enqueues a task on the preferred node's queue.
    ///
    /// Double-scheduling the same task is a no-op; the preferred node is
    /// a locality hint, not a placement guarantee (idle workers steal).
    ///
    /// # Panics
    /// Panics if the scheduler is already shut down.
    pub fn schedule(&self, task: Arc<Task>, preferred_node: NodeId, priority: SchedulePriority) {
        assert!(
            !self.shared.shutdown.load(Ordering::Acquire),
            "cannot schedule on a shut-down scheduler"
        );
        let queue = &self.shared.queues[preferred_node % self.shared.queues.len()];
        queue.push(task, priority);

        let _guard = self.shared.idle_lock.lock();
        self.shared.idle_signal.notify_all();
    }

    /// Blocks until every given task has completed.
    ///
    /// This is the synchronization point of chunk-parallel operators.
    /// Must not be called from a worker thread — the waiter would occupy
    /// the worker its tasks may need.
    pub fn wait_for_tasks(&self, tasks: &[Arc<Task>]) {
        for task in tasks {
            task.wait();
        }
    }

    /// Drains remaining tasks and joins all workers. Idempotent.
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.shutdown.store(true, Ordering::Release);
        {
            let _guard = self.shared.idle_lock.lock();
            self.shared.idle_signal.notify_all();
        }
        for worker in self.workers.lock().drain(..) {
            let _ = worker.join();
        }
        tracing::debug!("scheduler stopped");
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("num_nodes", &self.topology.num_nodes)
            .field("shutdown", &self.shared.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn worker_loop(shared: &SchedulerShared, my_node: NodeId) {
    let num_nodes = shared.queues.len();
    loop {
        // Local queue first.
        if let Some(task) = shared.queues[my_node].pull(SchedulePriority::Normal) {
            task.execute();
            continue;
        }

        // Then steal, nearest node first.
        let mut stole = false;
        for distance in 1..num_nodes {
            let victim = (my_node + distance) % num_nodes;
            if let Some(task) = shared.queues[victim].steal() {
                task.execute();
                stole = true;
                break;
            }
        }
        if stole {
            continue;
        }

        if shared.shutdown.load(Ordering::Acquire) && shared.all_queues_empty() {
            return;
        }

        // Nothing to do: park briefly, re-checking for shutdown.
        let mut guard = shared.idle_lock.lock();
        let _ = shared
            .idle_signal
            .wait_for(&mut guard, Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_topology_auto_detect() {
        let small = Topology::auto_detect(4);
        assert_eq!(small.num_nodes, 1);
        assert_eq!(small.worker_node(3), 0);

        let large = Topology::auto_detect(16);
        assert_eq!(large.num_nodes, 2);
        assert_eq!(large.workers_per_node, 8);
        assert_eq!(large.worker_node(0), 0);
        assert_eq!(large.worker_node(8), 1);
    }

    #[test]
    fn test_scheduler_runs_tasks() {
        let scheduler = TaskScheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<Arc<Task>> = (0..64)
            .map(|i| {
                let counter = Arc::clone(&counter);
                let task = Arc::new(Task::job(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }));
                scheduler.schedule(Arc::clone(&task), i % 2, SchedulePriority::JobTask);
                task
            })
            .collect();

        scheduler.wait_for_tasks(&tasks);
        assert_eq!(counter.load(Ordering::Relaxed), 64);
        assert!(tasks.iter().all(|t| t.is_done()));
    }

    #[test]
    fn test_cross_node_stealing_completes_all_work() {
        // Two nodes but all work lands on node 1's queue; node 0's
        // workers must steal it.
        let scheduler = TaskScheduler::with_topology(4, Topology::with_nodes(2, 2));
        let counter = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<Arc<Task>> = (0..32)
            .map(|_| {
                let counter = Arc::clone(&counter);
                let task = Arc::new(Task::job(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }));
                scheduler.schedule(Arc::clone(&task), 1, SchedulePriority::JobTask);
                task
            })
            .collect();

        scheduler.wait_for_tasks(&tasks);
        assert_eq!(counter.load(Ordering::Relaxed), 32);
    }

    #[test]
    fn test_double_schedule_executes_once() {
        let scheduler = TaskScheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let task = {
            let counter = Arc::clone(&counter);
            Arc::new(Task::job(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }))
        };

        // Concurrently scheduled from two paths: enqueued exactly once.
        scheduler.schedule(Arc::clone(&task), 0, SchedulePriority::JobTask);
        scheduler.schedule(Arc::clone(&task), 0, SchedulePriority::JobTask);
        scheduler.wait_for_tasks(std::slice::from_ref(&task));

        assert_eq!(counter.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_shutdown_drains_pending_tasks() {
        let scheduler = TaskScheduler::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..16 {
            let counter = Arc::clone(&counter);
            scheduler.schedule(
                Arc::new(Task::job(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })),
                0,
                SchedulePriority::JobTask,
            );
        }
        scheduler.shutdown();
        assert_eq!(counter.load(Ordering::Relaxed), 16);
    }
}
