//! Cancellable timers
//!
//! The handful of genuinely scheduled callbacks (enemy spawn interval, health
//! regen, staggered star launches) are data, not closures: the tick loop
//! polls [`Scheduler::due`] and dispatches on [`TaskKind`]. Ending a run
//! calls [`Scheduler::cancel_all`] so nothing stale survives into the next.

use glam::Vec2;

use super::registry::EntityId;

/// Work to perform when a task comes due
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskKind {
    SpawnEnemy,
    Regen,
    /// Launch one star of a staggered volley
    LaunchStar { target: EntityId, target_pos: Vec2 },
}

#[derive(Debug, Clone)]
struct Task {
    /// Insertion order; breaks ties between equal deadlines
    seq: u32,
    due_ms: f64,
    /// `Some` for repeating tasks
    period_ms: Option<f64>,
    kind: TaskKind,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: Vec<Task>,
    next_seq: u32,
}

impl Scheduler {
    fn push(&mut self, due_ms: f64, period_ms: Option<f64>, kind: TaskKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.tasks.push(Task {
            seq,
            due_ms,
            period_ms,
            kind,
        });
    }

    /// Fire `kind` every `period_ms`, first at `now_ms + period_ms`
    pub fn every(&mut self, now_ms: f64, period_ms: f64, kind: TaskKind) {
        let period = period_ms.max(1.0);
        self.push(now_ms + period, Some(period), kind)
    }

    /// Fire `kind` once, `delay_ms` from now
    pub fn after(&mut self, now_ms: f64, delay_ms: f64, kind: TaskKind) {
        self.push(now_ms + delay_ms.max(0.0), None, kind)
    }

    /// Drop every pending task; returns how many were cancelled
    pub fn cancel_all(&mut self) -> usize {
        let n = self.tasks.len();
        self.tasks.clear();
        n
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks due at `now_ms`, earliest first
    ///
    /// One-shot tasks are consumed. A repeating task fires at most once per
    /// poll and re-arms one period after its due time, or one period after
    /// `now_ms` if it fell more than a period behind (e.g. after a pause).
    pub fn due(&mut self, now_ms: f64) -> Vec<TaskKind> {
        let mut fired: Vec<(f64, u32, TaskKind)> = Vec::new();
        self.tasks.retain_mut(|task| {
            if task.due_ms > now_ms {
                return true;
            }
            fired.push((task.due_ms, task.seq, task.kind));
            match task.period_ms {
                Some(period) => {
                    let next = task.due_ms + period;
                    task.due_ms = if next <= now_ms { now_ms + period } else { next };
                    true
                }
                None => false,
            }
        });
        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }

    /// Shift every pending deadline by `delta_ms` (used when resuming from a
    /// pause so frozen time does not count toward timers)
    pub fn shift(&mut self, delta_ms: f64) {
        for task in &mut self.tasks {
            task.due_ms += delta_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_periodic_rearms() {
        let mut s = Scheduler::default();
        s.every(0.0, 267.0, TaskKind::SpawnEnemy);
        assert!(s.due(266.0).is_empty());
        assert_eq!(s.due(267.0), vec![TaskKind::SpawnEnemy]);
        assert!(s.due(300.0).is_empty());
        assert_eq!(s.due(534.0), vec![TaskKind::SpawnEnemy]);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn test_overdue_periodic_fires_once() {
        let mut s = Scheduler::default();
        s.every(0.0, 100.0, TaskKind::Regen);
        assert_eq!(s.due(1000.0).len(), 1);
        assert!(s.due(1050.0).is_empty());
        assert_eq!(s.due(1100.0).len(), 1);
    }

    #[test]
    fn test_one_shot_consumed_in_order() {
        let mut s = Scheduler::default();
        let late = TaskKind::LaunchStar {
            target: EntityId(2),
            target_pos: Vec2::ONE,
        };
        let early = TaskKind::LaunchStar {
            target: EntityId(1),
            target_pos: Vec2::ZERO,
        };
        s.after(0.0, 220.0, late);
        s.after(0.0, 110.0, early);
        assert_eq!(s.due(500.0), vec![early, late]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn test_cancel_all_clears_pending() {
        let mut s = Scheduler::default();
        s.every(0.0, 267.0, TaskKind::SpawnEnemy);
        s.every(0.0, 2000.0, TaskKind::Regen);
        s.after(0.0, 50.0, TaskKind::Regen);
        assert_eq!(s.cancel_all(), 3);
        assert_eq!(s.pending(), 0);
        assert!(s.due(10_000.0).is_empty());
    }

    #[test]
    fn test_shift_delays_deadlines() {
        let mut s = Scheduler::default();
        s.every(0.0, 100.0, TaskKind::SpawnEnemy);
        s.shift(500.0);
        assert!(s.due(550.0).is_empty());
        assert_eq!(s.due(600.0).len(), 1);
    }
}
