//! Priority queue of admitted tasks.
//!
//! [`TaskHeap`] is an array-backed binary max-heap keyed on task priority. It
//! keeps every task's `queue_index` equal to its slot and does no locking of
//! its own. [`ExecTaskQueue`] wraps it in a mutex, so one queue can be shared
//! by submitters and dispatcher threads.
//!
//! Tasks of equal priority come out in an unspecified order. Tests and
//! callers must not depend on it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::task::ExecTask;

/// Binary max-heap over tasks. Not synchronized.
#[derive(Debug)]
pub(crate) struct TaskHeap<P> {
    items: Vec<ExecTask<P>>,
}

impl<P> TaskHeap<P> {
    pub(crate) fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn push(&mut self, mut task: ExecTask<P>) {
        let slot = self.items.len();
        task.queue_index = Some(slot);
        self.items.push(task);
        self.sift_up(slot);
    }

    pub(crate) fn pop(&mut self) -> Option<ExecTask<P>> {
        if self.items.is_empty() {
            return None;
        }
        let last = self.items.len() - 1;
        self.swap(0, last);
        let mut top = self.items.pop()?;
        top.queue_index = None;
        if !self.items.is_empty() {
            self.sift_down(0);
        }
        Some(top)
    }

    // `i` is above `j` when it should be dispatched first.
    fn above(&self, i: usize, j: usize) -> bool {
        self.items[i].priority() > self.items[j].priority()
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.items.swap(i, j);
        self.items[i].queue_index = Some(i);
        self.items[j].queue_index = Some(j);
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if !self.above(child, parent) {
                break;
            }
            self.swap(child, parent);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut parent: usize) {
        let n = self.items.len();
        loop {
            let left = 2 * parent + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let mut best = left;
            if right < n && self.above(right, left) {
                best = right;
            }
            if !self.above(best, parent) {
                break;
            }
            self.swap(parent, best);
            parent = best;
        }
    }

    #[cfg(test)]
    fn check_invariants(&self) {
        for (i, task) in self.items.iter().enumerate() {
            assert_eq!(task.queue_index, Some(i), "stale queue index at slot {i}");
            if i > 0 {
                let parent = (i - 1) / 2;
                assert!(
                    task.priority() <= self.items[parent].priority(),
                    "heap order violated at slot {i}"
                );
            }
        }
    }
}

/// Mutex-guarded scheduler queue yielding tasks in descending priority.
///
/// `len` is advisory under concurrent pushers: it may be stale by the time
/// the caller looks at it.
#[derive(Debug)]
pub struct ExecTaskQueue<P> {
    heap: Mutex<TaskHeap<P>>,
}

impl<P> Default for ExecTaskQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ExecTaskQueue<P> {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(TaskHeap::new()),
        }
    }

    // Heap operations don't panic midway, so a poisoned lock still guards a
    // valid heap.
    fn heap(&self) -> MutexGuard<'_, TaskHeap<P>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a task. O(log n).
    pub fn push(&self, task: ExecTask<P>) {
        self.heap().push(task);
    }

    /// Remove the highest-priority task, or `None` if nothing is queued.
    pub fn pop(&self) -> Option<ExecTask<P>> {
        self.heap().pop()
    }

    pub fn len(&self) -> usize {
        self.heap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every queued task, highest priority first.
    pub fn drain(&self) -> Vec<ExecTask<P>> {
        let mut heap = self.heap();
        let mut drained = Vec::with_capacity(heap.len());
        while let Some(task) = heap.pop() {
            drained.push(task);
        }
        drained
    }
}
