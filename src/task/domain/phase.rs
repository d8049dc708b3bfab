//! Phase identifiers, the ordered phase catalog and per-task active phases.

use super::{ParseEnumError, TaskDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one review phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    /// Requirements are refined and confirmed.
    #[serde(rename = "requirement_refiner")]
    RequirementRefinement,
    /// Design guidance is produced and reviewed.
    DesignGuidance,
    /// The build is guided and reviewed.
    BuildGuidance,
    /// Acceptance criteria are demonstrated.
    AcceptanceCriteria,
    /// The work is deployed.
    Deployment,
}

impl PhaseId {
    /// All known phases in canonical order.
    pub const ALL: [Self; 5] = [
        Self::RequirementRefinement,
        Self::DesignGuidance,
        Self::BuildGuidance,
        Self::AcceptanceCriteria,
        Self::Deployment,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RequirementRefinement => "requirement_refiner",
            Self::DesignGuidance => "design_guidance",
            Self::BuildGuidance => "build_guidance",
            Self::AcceptanceCriteria => "acceptance_criteria",
            Self::Deployment => "deployment",
        }
    }

    /// Returns a short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RequirementRefinement => "Requirements",
            Self::DesignGuidance => "Design",
            Self::BuildGuidance => "Build",
            Self::AcceptanceCriteria => "Acceptance",
            Self::Deployment => "Deployment",
        }
    }
}

impl TryFrom<&str> for PhaseId {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|phase| phase.as_str() == normalized)
            .ok_or_else(|| ParseEnumError::new("phase", value))
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free list of phases a deployment works with.
///
/// The catalog defines the canonical ordering; every task's active phases
/// must be a subsequence of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PhaseId>", into = "Vec<PhaseId>")]
pub struct PhaseCatalog(Vec<PhaseId>);

impl PhaseCatalog {
    /// Creates a validated catalog.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPhaseList`] when the list is empty
    /// or repeats a phase.
    pub fn new(phases: Vec<PhaseId>) -> Result<Self, TaskDomainError> {
        if phases.is_empty() {
            return Err(TaskDomainError::InvalidPhaseList(
                "phase catalog must not be empty".to_owned(),
            ));
        }
        if let Some(repeated) = first_duplicate(&phases) {
            return Err(TaskDomainError::InvalidPhaseList(format!(
                "phase {repeated} appears more than once"
            )));
        }
        Ok(Self(phases))
    }

    /// Returns the canonical five-phase catalog.
    #[must_use]
    pub fn canonical() -> Self {
        Self(PhaseId::ALL.to_vec())
    }

    /// Returns the position of `phase` in the catalog.
    #[must_use]
    pub fn index_of(&self, phase: PhaseId) -> Option<usize> {
        self.0.iter().position(|candidate| *candidate == phase)
    }

    /// Returns `true` when `phase` is the final entry of `active`.
    #[must_use]
    pub fn is_last(&self, phase: PhaseId, active: &ActivePhases) -> bool {
        self.index_of(phase).is_some() && active.is_last(phase)
    }

    /// Returns the catalog phases in order.
    #[must_use]
    pub fn phases(&self) -> &[PhaseId] {
        &self.0
    }

    /// Returns every catalog phase as an active phase list.
    #[must_use]
    pub fn all_active(&self) -> ActivePhases {
        ActivePhases(self.0.clone())
    }
}

impl Default for PhaseCatalog {
    fn default() -> Self {
        Self::canonical()
    }
}

impl TryFrom<Vec<PhaseId>> for PhaseCatalog {
    type Error = TaskDomainError;

    fn try_from(value: Vec<PhaseId>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PhaseCatalog> for Vec<PhaseId> {
    fn from(value: PhaseCatalog) -> Self {
        value.0
    }
}

/// Non-empty ordered subsequence of the catalog that a task must pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivePhases(Vec<PhaseId>);

impl ActivePhases {
    /// Validates `phases` against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPhaseList`] when the list is empty,
    /// names a phase outside the catalog, repeats a phase or breaks the
    /// catalog ordering.
    pub fn new(phases: Vec<PhaseId>, catalog: &PhaseCatalog) -> Result<Self, TaskDomainError> {
        if phases.is_empty() {
            return Err(TaskDomainError::InvalidPhaseList(
                "a task needs at least one active phase".to_owned(),
            ));
        }

        let mut previous_index: Option<usize> = None;
        for phase in &phases {
            let index = catalog.index_of(*phase).ok_or_else(|| {
                TaskDomainError::InvalidPhaseList(format!("phase {phase} is not in the catalog"))
            })?;
            if previous_index.is_some_and(|previous| index <= previous) {
                return Err(TaskDomainError::InvalidPhaseList(format!(
                    "phase {phase} is out of catalog order or repeated"
                )));
            }
            previous_index = Some(index);
        }

        Ok(Self(phases))
    }

    /// Reconstructs an active phase list from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPhaseList`] when the persisted list
    /// is empty.
    pub fn from_persisted(phases: Vec<PhaseId>) -> Result<Self, TaskDomainError> {
        if phases.is_empty() {
            return Err(TaskDomainError::InvalidPhaseList(
                "persisted active phases are empty".to_owned(),
            ));
        }
        Ok(Self(phases))
    }

    /// Returns the first active phase.
    #[must_use]
    pub fn first(&self) -> PhaseId {
        self.0
            .first()
            .copied()
            .unwrap_or(PhaseId::RequirementRefinement)
    }

    /// Returns the last active phase.
    #[must_use]
    pub fn last(&self) -> PhaseId {
        self.0.last().copied().unwrap_or(PhaseId::Deployment)
    }

    /// Returns the position of `phase` within the active list.
    #[must_use]
    pub fn index_of(&self, phase: PhaseId) -> Option<usize> {
        self.0.iter().position(|candidate| *candidate == phase)
    }

    /// Returns `true` when `phase` is active.
    #[must_use]
    pub fn contains(&self, phase: PhaseId) -> bool {
        self.0.contains(&phase)
    }

    /// Returns `true` when `phase` is the final active phase.
    #[must_use]
    pub fn is_last(&self, phase: PhaseId) -> bool {
        self.0.last() == Some(&phase)
    }

    /// Returns the phase following `phase`, if any.
    #[must_use]
    pub fn next_after(&self, phase: PhaseId) -> Option<PhaseId> {
        let index = self.index_of(phase)?;
        self.0.get(index.saturating_add(1)).copied()
    }

    /// Returns the active phases in order.
    #[must_use]
    pub fn as_slice(&self) -> &[PhaseId] {
        &self.0
    }

    /// Returns an iterator over the active phases in order.
    pub fn iter(&self) -> impl Iterator<Item = PhaseId> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of active phases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; the list is validated to be non-empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn first_duplicate(phases: &[PhaseId]) -> Option<PhaseId> {
    phases.iter().enumerate().find_map(|(index, phase)| {
        phases
            .iter()
            .skip(index.saturating_add(1))
            .any(|other| other == phase)
            .then_some(*phase)
    })
}
