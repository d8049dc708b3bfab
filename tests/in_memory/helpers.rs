//! Shared harness for in-memory workflow integration tests.

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use phasegate::config::EngineConfig;
use phasegate::task::{
    adapters::memory::{
        InMemoryArtifactStorage, InMemoryMembershipDirectory, InMemorySubmissionRepository,
        InMemoryTaskRepository, InMemoryTaskStepRepository, RecordingNotificationSink,
    },
    domain::{
        ArtifactUpload, DueSchedule, Effort, OrgId, PhaseId, ProjectId, Role, Task, TaskDetails,
        TaskId, UserId,
    },
    ports::TaskRepository,
    services::{
        AccessWorkflowService, CreateTaskRequest, PhaseReviewService, ProofOutcome,
        ProofSubmission, ProofSubmissionService, StepService, TaskLifecycleService,
        WorkflowResult,
    },
};
use rstest::fixture;
use std::sync::{Arc, RwLock};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Starts the clock at 2026-03-10 09:00 UTC.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
            .single()
            .unwrap_or(DateTime::UNIX_EPOCH);
        Self {
            now: RwLock::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.write() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .read()
            .map(|now| *now)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Lifecycle service over the in-memory adapters.
pub type Lifecycle = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryTaskStepRepository,
    InMemoryMembershipDirectory,
    RecordingNotificationSink,
    ManualClock,
>;

/// Step service over the in-memory adapters.
pub type Steps = StepService<
    InMemoryTaskRepository,
    InMemoryTaskStepRepository,
    InMemoryMembershipDirectory,
    ManualClock,
>;

/// Proof service over the in-memory adapters.
pub type Proofs = ProofSubmissionService<
    InMemoryTaskRepository,
    InMemoryTaskStepRepository,
    InMemorySubmissionRepository,
    InMemoryArtifactStorage,
    InMemoryMembershipDirectory,
    ManualClock,
>;

/// Review service over the in-memory adapters.
pub type Reviews =
    PhaseReviewService<InMemoryTaskRepository, InMemoryMembershipDirectory, ManualClock>;

/// Access service over the in-memory adapters.
pub type Access = AccessWorkflowService<
    InMemoryTaskRepository,
    InMemoryMembershipDirectory,
    RecordingNotificationSink,
    ManualClock,
>;

/// Every service wired to shared in-memory adapters, plus a cast of users.
pub struct Harness {
    /// Shared clock.
    pub clock: Arc<ManualClock>,
    /// Task store.
    pub tasks: Arc<InMemoryTaskRepository>,
    /// Step store.
    pub steps: Arc<InMemoryTaskStepRepository>,
    /// Effort submission store.
    pub submissions: Arc<InMemorySubmissionRepository>,
    /// Artifact store.
    pub storage: Arc<InMemoryArtifactStorage>,
    /// Membership directory.
    pub directory: Arc<InMemoryMembershipDirectory>,
    /// Recorded notifications.
    pub sink: Arc<RecordingNotificationSink>,
    /// Organisation every user belongs to.
    pub org: OrgId,
    /// Project tasks are created in.
    pub project: ProjectId,
    /// Employee the tasks are assigned to.
    pub assignee: UserId,
    /// Another employee.
    pub colleague: UserId,
    /// Manager who creates and reviews tasks.
    pub manager: UserId,
    /// Lifecycle service.
    pub lifecycle: Lifecycle,
    /// Step service.
    pub step_service: Steps,
    /// Proof service.
    pub proofs: Proofs,
    /// Review service.
    pub reviews: Reviews,
    /// Access service.
    pub access: Access,
}

impl Harness {
    /// Builds a harness with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(EngineConfig::default(), InMemorySubmissionRepository::new())
    }

    /// Builds a harness with `config` and a prepared submission store.
    #[must_use]
    pub fn with_parts(config: EngineConfig, submissions: InMemorySubmissionRepository) -> Self {
        let config = Arc::new(config);
        let clock = Arc::new(ManualClock::new());
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let steps = Arc::new(InMemoryTaskStepRepository::new());
        let submissions = Arc::new(submissions);
        let storage = Arc::new(InMemoryArtifactStorage::new());
        let directory = Arc::new(InMemoryMembershipDirectory::new());
        let sink = Arc::new(RecordingNotificationSink::new());

        let org = OrgId::new();
        let assignee = UserId::new();
        let colleague = UserId::new();
        let manager = UserId::new();
        directory.grant(org, assignee, Role::Employee);
        directory.grant(org, colleague, Role::Employee);
        directory.grant(org, manager, Role::Manager);

        Self {
            lifecycle: TaskLifecycleService::new(
                Arc::clone(&tasks),
                Arc::clone(&steps),
                Arc::clone(&directory),
                Arc::clone(&sink),
                Arc::clone(&clock),
                Arc::clone(&config),
            ),
            step_service: StepService::new(
                Arc::clone(&tasks),
                Arc::clone(&steps),
                Arc::clone(&directory),
                Arc::clone(&clock),
                Arc::clone(&config),
            ),
            proofs: ProofSubmissionService::new(
                Arc::clone(&tasks),
                Arc::clone(&steps),
                Arc::clone(&submissions),
                Arc::clone(&storage),
                Arc::clone(&directory),
                Arc::clone(&clock),
                Arc::clone(&config),
            ),
            reviews: PhaseReviewService::new(
                Arc::clone(&tasks),
                Arc::clone(&directory),
                Arc::clone(&clock),
                Arc::clone(&config),
            ),
            access: AccessWorkflowService::new(
                Arc::clone(&tasks),
                Arc::clone(&directory),
                Arc::clone(&sink),
                Arc::clone(&clock),
                Arc::clone(&config),
            ),
            clock,
            tasks,
            steps,
            submissions,
            storage,
            directory,
            sink,
            org,
            project: ProjectId::new(),
            assignee,
            colleague,
            manager,
        }
    }

    /// Returns a creation request for the assignee in the harness project.
    #[must_use]
    pub fn request(&self, phases: &[PhaseId], schedule: DueSchedule) -> CreateTaskRequest {
        let details = TaskDetails {
            title: "Launch billing page".to_owned(),
            description: "Customer-facing invoice history".to_owned(),
            allocated_hours: Effort::from_hours(12),
            skills: vec!["rust".to_owned(), "sql".to_owned()],
            priority: Some("high".to_owned()),
        };
        CreateTaskRequest::new(self.org, details)
            .with_project(self.project)
            .with_assignee(self.assignee)
            .with_phases(phases.iter().copied())
            .with_schedule(schedule)
    }

    /// Creates a task over `phases` without a deadline or steps.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails.
    pub async fn create(&self, phases: &[PhaseId]) -> eyre::Result<Task> {
        self.create_due(phases, DueSchedule::none()).await
    }

    /// Creates a task over `phases` with `schedule`.
    ///
    /// # Errors
    ///
    /// Returns an error when creation fails.
    pub async fn create_due(&self, phases: &[PhaseId], schedule: DueSchedule) -> eyre::Result<Task> {
        let created = self
            .lifecycle
            .create_task(self.manager, self.request(phases, schedule))
            .await?;
        Ok(created.task)
    }

    /// Submits `files` and `text` as the assignee.
    ///
    /// # Errors
    ///
    /// Returns the service error unchanged.
    pub async fn submit(
        &self,
        task_id: TaskId,
        files: &[&str],
        text: Option<&str>,
    ) -> WorkflowResult<ProofOutcome> {
        let mut request = ProofSubmission::new(task_id, self.assignee, Effort::from_hours(3));
        for name in files {
            let upload = ArtifactUpload::new(*name, name.as_bytes().to_vec())?;
            request = request.with_artifact(upload);
        }
        if let Some(body) = text {
            request = request.with_text(body);
        }
        self.proofs.submit_proof(request).await
    }

    /// Reloads a task from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the task is missing.
    pub async fn reload(&self, task_id: TaskId) -> eyre::Result<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| eyre::eyre!("task {task_id} missing"))
    }
}

/// Provides a fresh harness for each test.
#[fixture]
pub fn harness() -> Harness {
    Harness::new()
}
