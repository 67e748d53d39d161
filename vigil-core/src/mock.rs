//! Deterministic Test Doubles
//!
//! Stand-ins for the injected id/time dependencies so tests (and the
//! conformance suite) can pin down service-assigned values.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::check::Check;
use crate::errors::{Error, Result};
use crate::id::{Id, IdGenerator};
use crate::service::{Task, TaskService, TimeSource};

/// Always hands out the same id. Useful for single-create scenarios.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdGenerator(Id);

impl StaticIdGenerator {
    pub fn new(id: Id) -> Self {
        Self(id)
    }
}

impl IdGenerator for StaticIdGenerator {
    fn id(&self) -> Id {
        self.0
    }
}

/// Hands out consecutive ids starting from a base value.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    next: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(start: Id) -> Self {
        Self {
            next: AtomicU64::new(start.raw()),
        }
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn id(&self) -> Id {
        Id::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A task-subsystem call observed by [`RecordingTaskService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCall {
    /// `create_task` for the given check id.
    Created(Id),
    /// `regenerate_task` for the given check id.
    Regenerated(Id),
    /// `delete_task` for the given task id.
    Deleted(Id),
}

/// Records every task-subsystem trigger; can be set up to fail instead.
pub struct RecordingTaskService {
    next_task_id: AtomicU64,
    calls: Mutex<Vec<TaskCall>>,
    fail: bool,
}

impl RecordingTaskService {
    pub fn new(first_task_id: Id) -> Self {
        Self {
            next_task_id: AtomicU64::new(first_task_id.raw()),
            calls: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A service whose every call fails with an internal error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Id::new(1))
        }
    }

    /// The calls observed so far, in order.
    pub fn calls(&self) -> Vec<TaskCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: TaskCall) -> Result<()> {
        if self.fail {
            return Err(Error::internal("task service unavailable"));
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

#[async_trait]
impl TaskService for RecordingTaskService {
    async fn create_task(&self, check: &Check) -> Result<Task> {
        self.record(TaskCall::Created(check.id))?;
        Ok(Task {
            id: Id::new(self.next_task_id.fetch_add(1, Ordering::Relaxed)),
            query: check.query.clone(),
        })
    }

    async fn regenerate_task(&self, check: &Check) -> Result<Task> {
        self.record(TaskCall::Regenerated(check.id))?;
        Ok(Task {
            id: check.task_id,
            query: check.query.clone(),
        })
    }

    async fn delete_task(&self, id: Id) -> Result<()> {
        self.record(TaskCall::Deleted(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_generator_counts_up() {
        let generator = SequenceIdGenerator::new(Id::new(10));
        assert_eq!(generator.id(), Id::new(10));
        assert_eq!(generator.id(), Id::new(11));
    }
}
