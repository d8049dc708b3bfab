//! Shared fixtures for task unit tests.

use crate::task::domain::{
    ActivePhases, DueSchedule, NewTaskData, OrgId, PhaseCatalog, PhaseId, Task, TaskDetails,
    UserId,
};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use std::sync::RwLock;

/// Clock frozen at a settable instant.
#[derive(Debug)]
pub(crate) struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    pub(crate) fn set(&self, now: DateTime<Utc>) {
        match self.now.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.set(self.utc() + by);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
                .single()
                .unwrap_or(DateTime::UNIX_EPOCH),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        match self.now.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Identities used across a test.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cast {
    pub(crate) org: OrgId,
    pub(crate) assignee: UserId,
    pub(crate) reviewer: UserId,
}

impl Cast {
    pub(crate) fn new() -> Self {
        Self {
            org: OrgId::new(),
            assignee: UserId::new(),
            reviewer: UserId::new(),
        }
    }
}

/// Builds a task over `phases` assigned to `cast.assignee`.
pub(crate) fn task_over(
    cast: Cast,
    phases: &[PhaseId],
    schedule: DueSchedule,
    clock: &FixedClock,
) -> eyre::Result<Task> {
    let active = ActivePhases::new(phases.to_vec(), &PhaseCatalog::canonical())?;
    let task = Task::new(
        NewTaskData {
            org_id: cast.org,
            project_id: None,
            assigned_to: Some(cast.assignee),
            assigned_by: cast.reviewer,
            details: TaskDetails::titled("Ship the release"),
            active_phases: active,
            schedule,
        },
        clock,
    )?;
    Ok(task)
}
