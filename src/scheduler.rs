//! Deferred callbacks.
//!
//! Timers are fire-once tasks ordered by due time, driven by an explicit
//! millisecond clock rather than wall time. The runtime advances the clock
//! and drains whatever became due, so event/timer interleavings are fully
//! deterministic.

use crate::components::ComponentId;
use crate::dom::NodeId;

/// Handle used to cancel a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// What a timer does when it fires. Delivered to the owning component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    /// Remove a class from an element (a stale element makes this a no-op).
    RemoveClass { node: NodeId, class: String },
    /// Close the owner's panel.
    Deactivate,
}

/// A task that became due.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub handle: TaskHandle,
    pub due_ms: u64,
    pub owner: ComponentId,
    pub action: TimerAction,
}

/// Pending fire-once timers.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_handle: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub const fn new() -> Self {
        Self {
            now_ms: 0,
            next_handle: 0,
            tasks: Vec::new(),
        }
    }

    /// Current clock value.
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `action` for `owner`, `delay_ms` from now.
    pub fn schedule(&mut self, owner: ComponentId, delay_ms: u64, action: TimerAction) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(ScheduledTask {
            handle,
            due_ms: self.now_ms.saturating_add(delay_ms),
            owner,
            action,
        });
        handle
    }

    /// Cancel a pending task. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Drop every task owned by `owner`.
    pub fn cancel_owner(&mut self, owner: ComponentId) {
        self.tasks.retain(|t| t.owner != owner);
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Number of pending tasks.
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<u64> {
        self.tasks.iter().map(|t| t.due_ms).min()
    }

    /// Pop the earliest task due at or before `until_ms`.
    ///
    /// Ties fire in scheduling order. The clock moves to the task's due time,
    /// so tasks scheduled from inside a callback are timed relative to when
    /// the callback fired.
    pub fn take_due(&mut self, until_ms: u64) -> Option<ScheduledTask> {
        let (idx, _) = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .min_by_key(|(_, t)| (t.due_ms, t.handle))?;
        let task = self.tasks.remove(idx);
        self.now_ms = self.now_ms.max(task.due_ms);
        Some(task)
    }

    /// Move the clock forward once nothing else is due. Never moves backward.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: ComponentId = ComponentId(0);

    #[test]
    fn test_tasks_fire_in_due_order() {
        let mut sched = Scheduler::new();
        let late = sched.schedule(OWNER, 500, TimerAction::Deactivate);
        let early = sched.schedule(OWNER, 250, TimerAction::Deactivate);

        assert_eq!(sched.take_due(100), None);
        assert_eq!(sched.take_due(600).map(|t| t.handle), Some(early));
        assert_eq!(sched.now_ms(), 250);
        assert_eq!(sched.take_due(600).map(|t| t.handle), Some(late));
        assert_eq!(sched.take_due(600), None);
    }

    #[test]
    fn test_ties_fire_in_schedule_order() {
        let mut sched = Scheduler::new();
        let first = sched.schedule(OWNER, 100, TimerAction::Deactivate);
        let second = sched.schedule(ComponentId(1), 100, TimerAction::Deactivate);
        assert_eq!(sched.take_due(100).map(|t| t.handle), Some(first));
        assert_eq!(sched.take_due(100).map(|t| t.handle), Some(second));
    }

    #[test]
    fn test_delay_is_relative_to_clock() {
        let mut sched = Scheduler::new();
        sched.advance_to(1000);
        sched.schedule(OWNER, 250, TimerAction::Deactivate);
        assert_eq!(sched.next_due(), Some(1250));
        assert!(sched.take_due(1249).is_none());
        assert!(sched.take_due(1250).is_some());
    }

    #[test]
    fn test_cancel() {
        let mut sched = Scheduler::new();
        let handle = sched.schedule(OWNER, 10, TimerAction::Deactivate);
        assert!(sched.is_pending(handle));
        assert!(sched.cancel(handle));
        assert!(!sched.cancel(handle));
        assert!(sched.take_due(100).is_none());
    }

    #[test]
    fn test_cancel_owner_leaves_other_tasks() {
        let mut sched = Scheduler::new();
        sched.schedule(OWNER, 10, TimerAction::Deactivate);
        let other = sched.schedule(ComponentId(7), 10, TimerAction::Deactivate);
        sched.cancel_owner(OWNER);
        assert_eq!(sched.pending(), 1);
        assert!(sched.is_pending(other));
    }

    #[test]
    fn test_clock_never_moves_backward() {
        let mut sched = Scheduler::new();
        sched.advance_to(500);
        sched.advance_to(100);
        assert_eq!(sched.now_ms(), 500);
    }
}
