//! Proof submission pipeline and artifact deletion.

use super::{
    WorkflowError, WorkflowResult,
    support::{load_task, resolve_actor},
};
use crate::config::EngineConfig;
use crate::task::{
    domain::{
        ArtifactKey, ArtifactRef, ArtifactUpload, Effort, PhaseAdvance, PhaseId, StepGate,
        Submission, Task, TaskDomainError, TaskId, UserId,
    },
    ports::{
        ArtifactStorage, MembershipDirectory, SubmissionRepository, TaskRepository,
        TaskStepRepository,
    },
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

/// Proof for the task's current phase plus the submitter's effort report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofSubmission {
    /// Task receiving the proof.
    pub task_id: TaskId,
    /// Authenticated submitter.
    pub submitter: UserId,
    /// Files to upload, in order.
    pub artifacts: Vec<ArtifactUpload>,
    /// Free-text proof.
    pub text: Option<String>,
    /// Hours the submitter reports for the whole task.
    pub actual_hours: Effort,
}

impl ProofSubmission {
    /// Creates a submission without artifacts or text.
    #[must_use]
    pub const fn new(task_id: TaskId, submitter: UserId, actual_hours: Effort) -> Self {
        Self {
            task_id,
            submitter,
            artifacts: Vec::new(),
            text: None,
            actual_hours,
        }
    }

    /// Adds an artifact.
    #[must_use]
    pub fn with_artifact(mut self, artifact: ArtifactUpload) -> Self {
        self.artifacts.push(artifact);
        self
    }

    /// Sets the free-text proof.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
            && self
                .text
                .as_deref()
                .is_none_or(|value| value.trim().is_empty())
    }
}

/// Outcome of a committed proof submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOutcome {
    /// The committed task.
    pub task: Task,
    /// Pointer movement.
    pub advance: PhaseAdvance,
    /// Stored effort report, or `None` when the upsert failed.
    pub submission: Option<Submission>,
}

/// Proof submission orchestration service.
#[derive(Clone)]
pub struct ProofSubmissionService<R, S, U, A, D, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    U: SubmissionRepository,
    A: ArtifactStorage,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    steps: Arc<S>,
    submissions: Arc<U>,
    storage: Arc<A>,
    directory: Arc<D>,
    clock: Arc<C>,
    config: Arc<EngineConfig>,
}

impl<R, S, U, A, D, C> ProofSubmissionService<R, S, U, A, D, C>
where
    R: TaskRepository,
    S: TaskStepRepository,
    U: SubmissionRepository,
    A: ArtifactStorage,
    D: MembershipDirectory,
    C: Clock + Send + Sync,
{
    /// Creates a new proof submission service.
    #[must_use]
    pub const fn new(
        tasks: Arc<R>,
        steps: Arc<S>,
        submissions: Arc<U>,
        storage: Arc<A>,
        directory: Arc<D>,
        clock: Arc<C>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            tasks,
            steps,
            submissions,
            storage,
            directory,
            clock,
            config,
        }
    }

    /// Records proof for the task's current phase.
    ///
    /// Every check runs before the first upload. A failed upload or task
    /// write removes the artifacts already stored and leaves the task
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the submitter is not the assignee,
    /// the task is closed or locked, the proof is empty, the current phase
    /// has pending steps, storage fails or another writer committed first.
    pub async fn submit_proof(&self, request: ProofSubmission) -> WorkflowResult<ProofOutcome> {
        let mut task = load_task(&*self.tasks, request.task_id).await?;
        let actor = resolve_actor(
            &*self.directory,
            task.org_id(),
            request.submitter,
            "submit proof",
        )
        .await?;
        actor.require_assignee(&task, "submit proof")?;
        task.ensure_open()?;
        task.ensure_unlocked(self.clock.utc(), &self.config.lock_policy())?;
        if request.is_empty() {
            return Err(TaskDomainError::EmptyProof(task.id()).into());
        }

        let phase = task.lifecycle_state();
        let steps = self.steps.list_for_phase(task.id(), phase).await?;
        if StepGate::has_pending_steps(&task, &steps) {
            return Err(TaskDomainError::PendingSteps {
                task_id: task.id(),
                phase,
            }
            .into());
        }

        let uploaded = self.upload_all(&task, &request).await?;
        let advance = match task.record_proof(uploaded.clone(), request.text.as_deref(), &*self.clock)
        {
            Ok(advance) => advance,
            Err(err) => {
                self.discard(task.id(), &uploaded).await;
                return Err(err.into());
            }
        };
        let committed = match self.tasks.update(&task).await {
            Ok(committed) => committed,
            Err(err) => {
                self.discard(task.id(), &uploaded).await;
                return Err(err.into());
            }
        };
        info!(
            task_id = %committed.id(),
            phase = %advance.submitted_phase,
            next_phase = %advance.next_phase,
            artifacts = uploaded.len(),
            revision = %committed.revision(),
            "proof recorded"
        );

        let report = Submission::new(
            committed.id(),
            request.submitter,
            request.actual_hours,
            self.clock.utc(),
        );
        let submission = match self.submissions.upsert(&report).await {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!(task_id = %committed.id(), error = %err, "effort submission not stored");
                None
            }
        };

        Ok(ProofOutcome {
            task: committed,
            advance,
            submission,
        })
    }

    /// Deletes one artifact from a phase's proof.
    ///
    /// The stored object is removed only after the task write commits; a
    /// failed removal is logged and leaves an orphaned object. A phase left
    /// without proof loses its validation record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not the assignee, the
    /// artifact is not attached or the write conflicts.
    pub async fn delete_artifact(
        &self,
        user: UserId,
        task_id: TaskId,
        phase: PhaseId,
        artifact: &ArtifactRef,
    ) -> WorkflowResult<Task> {
        let mut task = load_task(&*self.tasks, task_id).await?;
        let actor =
            resolve_actor(&*self.directory, task.org_id(), user, "delete proof artifacts").await?;
        actor.require_assignee(&task, "delete proof artifacts")?;

        task.remove_artifact(phase, artifact, &*self.clock)?;
        let committed = self.tasks.update(&task).await?;
        self.discard(task_id, std::slice::from_ref(artifact)).await;
        info!(
            task_id = %task_id,
            %phase,
            %artifact,
            lifecycle_state = %committed.lifecycle_state(),
            "proof artifact deleted"
        );
        Ok(committed)
    }

    async fn upload_all(
        &self,
        task: &Task,
        request: &ProofSubmission,
    ) -> WorkflowResult<Vec<ArtifactRef>> {
        let mut uploaded = Vec::with_capacity(request.artifacts.len());
        for upload in &request.artifacts {
            let key = ArtifactKey::derive(request.submitter, task.id(), self.clock.utc(), upload);
            match self
                .storage
                .put(&key, upload.bytes(), upload.content_type())
                .await
            {
                Ok(reference) => uploaded.push(reference),
                Err(err) => {
                    self.discard(task.id(), &uploaded).await;
                    return Err(WorkflowError::Storage(err));
                }
            }
        }
        Ok(uploaded)
    }

    async fn discard(&self, task_id: TaskId, uploaded: &[ArtifactRef]) {
        for artifact in uploaded {
            if let Err(err) = self.storage.delete(artifact).await {
                warn!(task_id = %task_id, %artifact, error = %err, "orphaned artifact not removed");
            }
        }
    }
}
