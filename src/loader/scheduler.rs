//! Cooperative scheduling primitives.
//!
//! Work is split into tasks that each run to completion. A task is queued
//! with a [`Priority`] saying *when* it should run; the [`Pacer`] decides
//! *how* the host waits before running it. Keeping the two apart lets the
//! burst-then-idle policy run unchanged over a real frame clock, a plain
//! sleep, or nothing at all in tests.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// When a queued task should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// On the next frame; keeps first paint latency bounded.
    Frame,
    /// When the host is otherwise idle.
    Idle,
}

/// Two-level FIFO of pending tasks. Frame tasks always drain first.
#[derive(Debug)]
pub struct TaskQueue<T> {
    frame: VecDeque<T>,
    idle: VecDeque<T>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            frame: VecDeque::new(),
            idle: VecDeque::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a task.
    pub fn schedule(&mut self, priority: Priority, task: T) {
        match priority {
            Priority::Frame => self.frame.push_back(task),
            Priority::Idle => self.idle.push_back(task),
        }
    }

    /// Removes the next task to run.
    pub fn pop(&mut self) -> Option<(Priority, T)> {
        if let Some(task) = self.frame.pop_front() {
            return Some((Priority::Frame, task));
        }
        self.idle.pop_front().map(|task| (Priority::Idle, task))
    }

    /// Returns the priority of the next task without removing it.
    pub fn peek_priority(&self) -> Option<Priority> {
        if !self.frame.is_empty() {
            Some(Priority::Frame)
        } else if !self.idle.is_empty() {
            Some(Priority::Idle)
        } else {
            None
        }
    }

    /// Returns true if any queued task matches.
    pub fn contains(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.frame.iter().chain(self.idle.iter()).any(predicate)
    }

    /// Returns the number of queued tasks.
    pub fn len(&self) -> usize {
        self.frame.len() + self.idle.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty() && self.idle.is_empty()
    }

    /// Drops all queued tasks.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.idle.clear();
    }
}

/// Host mechanism for deferring work.
pub trait Pacer {
    /// Blocks until the host is ready for work of the given priority.
    fn wait(&mut self, priority: Priority);
}

/// Runs every task immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immediate;

impl Pacer for Immediate {
    fn wait(&mut self, _priority: Priority) {}
}

/// Sleeps the current thread between tasks.
///
/// A terminal host has no idle signal, so idle work always waits the
/// bounded fallback delay.
#[derive(Debug, Clone, Copy)]
pub struct ThreadPacer {
    /// Delay before frame-priority work.
    pub frame_interval: Duration,
    /// Delay before idle-priority work.
    pub idle_fallback: Duration,
}

impl Default for ThreadPacer {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
            idle_fallback: Duration::from_millis(100),
        }
    }
}

impl Pacer for ThreadPacer {
    fn wait(&mut self, priority: Priority) {
        let delay = match priority {
            Priority::Frame => self.frame_interval,
            Priority::Idle => self.idle_fallback,
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
