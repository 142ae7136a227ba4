//! Schedulable units of work.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

/// Scheduler node a task or queue is affine to.
pub type NodeId = usize;

/// Priority classes, most urgent first.
///
/// Pulling scans classes from most to least urgent; there is no
/// starvation protection beyond that strict order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum SchedulePriority {
    /// Sub-tasks spawned by running operators; always served first.
    JobTask = 0,
    /// Latency-sensitive work.
    High = 1,
    /// Everything else.
    Normal = 2,
}

/// Number of priority classes.
pub const NUM_PRIORITY_LEVELS: usize = 3;

impl SchedulePriority {
    /// All classes, most urgent first.
    pub const ALL: [Self; NUM_PRIORITY_LEVELS] = [Self::JobTask, Self::High, Self::Normal];

    /// The class's sub-queue slot.
    #[must_use]
    pub const fn as_index(self) -> usize {
        self as usize
    }
}

/// A schedulable unit of work.
///
/// A task runs exactly once and to completion — there is no cancellation
/// at this layer; higher layers make abandoned work invisible instead of
/// stopping it. The `enqueued` guard makes double-scheduling from
/// concurrent paths a no-op.
pub struct Task {
    job: Mutex<Option<Box<dyn FnOnce() + Send + 'static>>>,
    priority: SchedulePriority,
    stealable: bool,
    enqueued: AtomicBool,
    done: AtomicBool,
    node_id: AtomicUsize,
    done_lock: Mutex<bool>,
    done_signal: Condvar,
}

impl Task {
    /// Creates a task with an explicit priority and stealability.
    #[must_use]
    pub fn new(
        priority: SchedulePriority,
        stealable: bool,
        job: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            job: Mutex::new(Some(Box::new(job))),
            priority,
            stealable,
            enqueued: AtomicBool::new(false),
            done: AtomicBool::new(false),
            node_id: AtomicUsize::new(0),
            done_lock: Mutex::new(false),
            done_signal: Condvar::new(),
        }
    }

    /// Creates a stealable operator sub-task (the shape chunk-parallel
    /// operators schedule).
    #[must_use]
    pub fn job(job: impl FnOnce() + Send + 'static) -> Self {
        Self::new(SchedulePriority::JobTask, true, job)
    }

    /// The task's priority class.
    #[must_use]
    pub fn priority(&self) -> SchedulePriority {
        self.priority
    }

    /// Whether idle workers may steal this task across nodes.
    #[must_use]
    pub fn is_stealable(&self) -> bool {
        self.stealable
    }

    /// Marks the task as enqueued. Returns `false` if another path
    /// already enqueued it — that push must become a no-op.
    pub fn try_mark_enqueued(&self) -> bool {
        !self.enqueued.swap(true, Ordering::AcqRel)
    }

    /// Sets the node the task was enqueued on (allocation locality hint).
    pub fn set_node_id(&self, node_id: NodeId) {
        self.node_id.store(node_id, Ordering::Release);
    }

    /// The node the task was enqueued on.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id.load(Ordering::Acquire)
    }

    /// Runs the task and signals completion.
    ///
    /// # Panics
    /// Panics if the task has already been executed — queues hand a task
    /// out at most once.
    pub fn execute(&self) {
        let job = self
            .job
            .lock()
            .take()
            .expect("task executed more than once");
        job();

        self.done.store(true, Ordering::Release);
        let mut done = self.done_lock.lock();
        *done = true;
        self.done_signal.notify_all();
    }

    /// Whether the task has finished executing.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Blocks until the task has finished executing.
    pub fn wait(&self) {
        let mut done = self.done_lock.lock();
        while !*done {
            self.done_signal.wait(&mut done);
        }
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("priority", &self.priority)
            .field("stealable", &self.stealable)
            .field("enqueued", &self.enqueued.load(Ordering::Relaxed))
            .field("done", &self.done.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
