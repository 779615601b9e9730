//! Single-threaded timer queue driving the two listening tasks.
//!
//! Each task has at most one pending timer. Arming a task that is already
//! pending replaces its timer; timers due at the same instant fire in the
//! order they were armed.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

/// What the listening loop does when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Task {
    /// The current song is over: log it and start the next one.
    NextSong,
    /// Flush buffered playback logs to the server.
    FlushLog,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    at: Instant,
    order: u64,
    task: Task,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    timers: BinaryHeap<Reverse<Timer>>,
    armed: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `task` after `delay`.
    pub fn schedule(&mut self, task: Task, delay: Duration) {
        self.schedule_at(task, Instant::now() + delay);
    }

    /// Fire `task` at `at`, replacing any pending timer for it.
    pub fn schedule_at(&mut self, task: Task, at: Instant) {
        self.cancel(task);
        self.armed += 1;
        self.timers.push(Reverse(Timer {
            at,
            order: self.armed,
            task,
        }));
    }

    /// Drop the pending timer for `task`. Returns whether one existed.
    pub fn cancel(&mut self, task: Task) -> bool {
        let before = self.timers.len();
        self.timers.retain(|Reverse(t)| t.task != task);
        self.timers.len() != before
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<(Instant, Task)> {
        self.timers.peek().map(|Reverse(t)| (t.at, t.task))
    }

    /// Pop the earliest task if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Task> {
        if self.next_deadline()?.0 > now {
            return None;
        }
        self.timers.pop().map(|Reverse(t)| t.task)
    }

    /// Block until the earliest timer fires and return its task.
    ///
    /// Returns `None` once nothing is scheduled.
    pub fn wait(&mut self) -> Option<Task> {
        let (at, _) = self.next_deadline()?;
        let now = Instant::now();
        if at > now {
            std::thread::sleep(at - now);
        }
        self.pop_due(Instant::now().max(at))
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_deadline_order() {
        let start = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_at(Task::FlushLog, start + Duration::from_secs(600));
        s.schedule_at(Task::NextSong, start);

        assert_eq!(s.pop_due(start), Some(Task::NextSong));
        assert_eq!(s.pop_due(start), None);
        assert_eq!(s.pop_due(start + Duration::from_secs(600)), Some(Task::FlushLog));
        assert!(s.is_empty());
    }

    #[test]
    fn same_deadline_keeps_arming_order() {
        let at = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_at(Task::FlushLog, at);
        s.schedule_at(Task::NextSong, at);
        assert_eq!(s.pop_due(at), Some(Task::FlushLog));
        assert_eq!(s.pop_due(at), Some(Task::NextSong));
    }

    #[test]
    fn rearming_replaces_timer() {
        let start = Instant::now();
        let mut s = Scheduler::new();
        s.schedule_at(Task::NextSong, start + Duration::from_secs(10));
        s.schedule_at(Task::NextSong, start + Duration::from_secs(300));

        assert_eq!(
            s.next_deadline(),
            Some((start + Duration::from_secs(300), Task::NextSong))
        );
        assert_eq!(s.pop_due(start + Duration::from_secs(10)), None);
        assert_eq!(s.pop_due(start + Duration::from_secs(300)), Some(Task::NextSong));
        assert!(s.is_empty());
    }

    #[test]
    fn cancel_removes_pending_timer() {
        let mut s = Scheduler::new();
        s.schedule(Task::FlushLog, Duration::ZERO);
        assert!(s.cancel(Task::FlushLog));
        assert!(!s.cancel(Task::FlushLog));
        assert_eq!(s.wait(), None);
    }

    #[test]
    fn wait_returns_due_task() {
        let mut s = Scheduler::new();
        s.schedule(Task::NextSong, Duration::from_millis(5));
        assert_eq!(s.wait(), Some(Task::NextSong));
        assert_eq!(s.wait(), None);
    }
}
