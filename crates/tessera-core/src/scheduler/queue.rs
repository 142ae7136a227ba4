//! Per-node task queues with priority classes and stealing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::queue::SegQueue;

use super::task::{NodeId, SchedulePriority, Task, NUM_PRIORITY_LEVELS};

/// A worker node's queue: one lock-free sub-queue per priority class.
///
/// Push and pop are safe from any number of threads without an external
/// lock; the task counter gives a cheap `is_empty` answer for idle
/// checks (exact counts are racy by nature and only advisory).
pub struct TaskQueue {
    node_id: NodeId,
    queues: [SegQueue<Arc<Task>>; NUM_PRIORITY_LEVELS],
    num_tasks: AtomicUsize,
}

impl TaskQueue {
    /// Creates the queue for one node.
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            queues: [SegQueue::new(), SegQueue::new(), SegQueue::new()],
            num_tasks: AtomicUsize::new(0),
        }
    }

    /// The node this queue belongs to.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Returns `true` if no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_tasks.load(Ordering::Acquire) == 0
    }

    /// Enqueues a task into the priority's sub-queue.
    ///
    /// A task that was already enqueued elsewhere is left alone — the
    /// push is a no-op. The task picks up this queue's node affinity.
    pub fn push(&self, task: Arc<Task>, priority: SchedulePriority) {
        // Someone else was first to enqueue this task? No problem.
        if !task.try_mark_enqueued() {
            return;
        }

        task.set_node_id(self.node_id);
        self.queues[priority.as_index()].push(task);
        self.num_tasks.fetch_add(1, Ordering::AcqRel);
    }

    /// Pops the most urgent task whose priority is at least as urgent as
    /// `min_priority`, or `None` if none qualifies.
    #[must_use]
    pub fn pull(&self, min_priority: SchedulePriority) -> Option<Arc<Task>> {
        for priority in SchedulePriority::ALL {
            if priority > min_priority {
                break;
            }
            if let Some(task) = self.queues[priority.as_index()].pop() {
                self.num_tasks.fetch_sub(1, Ordering::AcqRel);
                return Some(task);
            }
        }
        None
    }

    /// Pops the most urgent stealable task.
    ///
    /// A non-stealable task removed for inspection is requeued in place
    /// and the scan moves on to the next priority class.
    #[must_use]
    pub fn steal(&self) -> Option<Arc<Task>> {
        for priority in SchedulePriority::ALL {
            if let Some(task) = self.queues[priority.as_index()].pop() {
                if task.is_stealable() {
                    self.num_tasks.fetch_sub(1, Ordering::AcqRel);
                    return Some(task);
                }
                self.queues[priority.as_index()].push(task);
            }
        }
        None
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("node_id", &self.node_id)
            .field("num_tasks", &self.num_tasks.load(Ordering::Relaxed))
            .finish()
    }
}
