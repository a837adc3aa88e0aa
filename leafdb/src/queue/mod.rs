//! Per-store-handle FIFO serialization of operations.
//!
//! Every operation submitted through the public surface runs strictly
//! one-at-a-time, in submission order, for a given handle. Operations that
//! are already running inside the queue call the `*_direct` variants instead
//! of re-submitting; a strict single-slot queue would deadlock on re-entry.

use std::fmt;
use std::sync::{Condvar, Mutex};

use crate::error::Result;

#[derive(Default)]
struct Turns {
    next_ticket: u64,
    now_serving: u64,
}

/// FIFO ticket queue. `submit` blocks until the caller's turn, runs the task,
/// and hands back that task's own result. A failing task is logged and does
/// not block the tasks queued behind it.
pub struct TaskQueue {
    turns: Mutex<Turns>,
    wake: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue {
            turns: Mutex::new(Turns::default()),
            wake: Condvar::new(),
        }
    }

    pub fn submit<T>(&self, task: impl FnOnce() -> Result<T>) -> Result<T> {
        let mut turns = self.turns.lock().unwrap();
        let ticket = turns.next_ticket;
        turns.next_ticket += 1;
        while turns.now_serving != ticket {
            turns = self.wake.wait(turns).unwrap();
        }
        drop(turns);

        let result = task();
        if let Err(error) = &result {
            log::warn!("queued task failed: {error}");
        }

        let mut turns = self.turns.lock().unwrap();
        turns.now_serving += 1;
        self.wake.notify_all();

        result
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let turns = self.turns.lock().unwrap();
        f.debug_struct("TaskQueue")
            .field("now_serving", &turns.now_serving)
            .field("pending", &(turns.next_ticket - turns.now_serving))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LeafDbError;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_submit_returns_result() {
        let queue = TaskQueue::new();
        assert_eq!(queue.submit(|| Ok(41 + 1)).unwrap(), 42);
    }

    #[test]
    fn test_failure_is_returned_and_does_not_block() {
        let queue = TaskQueue::new();
        let failed: Result<()> = queue.submit(|| Err(LeafDbError::Other("boom".into())));
        assert!(failed.is_err());

        // The queue keeps draining after a failed task.
        assert_eq!(queue.submit(|| Ok(1)).unwrap(), 1);
    }

    #[test]
    fn test_operations_complete_in_submission_order() {
        let queue = Arc::new(TaskQueue::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, work) in [("A", 60u64), ("B", 30), ("C", 5)] {
            let queue = Arc::clone(&queue);
            let order = Arc::clone(&order);
            handles.push(thread::spawn(move || {
                queue
                    .submit(|| {
                        // B and C dispatch faster than A finishes.
                        thread::sleep(Duration::from_millis(work));
                        order.lock().unwrap().push(label);
                        Ok(())
                    })
                    .unwrap();
            }));
            // Stagger submission so tickets are taken in A, B, C order.
            thread::sleep(Duration::from_millis(10));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_one_task_at_a_time() {
        let queue = Arc::new(TaskQueue::new());
        let running = Arc::new(Mutex::new(0u32));
        let peak = Arc::new(Mutex::new(0u32));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                thread::spawn(move || {
                    queue
                        .submit(|| {
                            let now = {
                                let mut r = running.lock().unwrap();
                                *r += 1;
                                *r
                            };
                            let mut p = peak.lock().unwrap();
                            *p = (*p).max(now);
                            drop(p);
                            thread::sleep(Duration::from_millis(5));
                            *running.lock().unwrap() -= 1;
                            Ok(())
                        })
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*peak.lock().unwrap(), 1);
    }
}
