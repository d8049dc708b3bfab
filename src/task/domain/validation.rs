//! Per-phase proof and review records.

use super::{ArtifactRef, ParseEnumError, PhaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Separator inserted between successive proof texts for one phase.
pub const PROOF_TEXT_SEPARATOR: &str = "\n---\n";

/// Review state of one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// No proof has been reviewed yet.
    #[default]
    None,
    /// Proof is awaiting a reviewer decision.
    Pending,
    /// A reviewer approved the proof.
    Approved,
    /// A reviewer rejected the proof; the submitter must resubmit.
    Rejected,
}

impl PhaseStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for PhaseStatus {
    type Error = ParseEnumError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseEnumError::new("phase status", value)),
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proof and review state attached to one phase of one task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseValidation {
    status: PhaseStatus,
    #[serde(default)]
    proof_urls: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proof_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    approved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejected_at: Option<DateTime<Utc>>,
}

impl PhaseValidation {
    /// Returns the review status.
    #[must_use]
    pub const fn status(&self) -> PhaseStatus {
        self.status
    }

    /// Returns the accumulated artifact references, oldest first.
    #[must_use]
    pub fn proof_urls(&self) -> &[ArtifactRef] {
        &self.proof_urls
    }

    /// Returns the accumulated proof text.
    #[must_use]
    pub fn proof_text(&self) -> Option<&str> {
        self.proof_text.as_deref()
    }

    /// Returns when proof was last submitted.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    /// Returns when the phase was last approved.
    #[must_use]
    pub const fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Returns when the phase was last rejected.
    #[must_use]
    pub const fn rejected_at(&self) -> Option<DateTime<Utc>> {
        self.rejected_at
    }

    /// Returns `true` when any artifact or text is attached.
    #[must_use]
    pub fn has_proof(&self) -> bool {
        !self.proof_urls.is_empty() || self.proof_text.as_deref().is_some_and(|t| !t.is_empty())
    }

    fn append_proof(&mut self, artifacts: Vec<ArtifactRef>, text: Option<&str>) {
        self.proof_urls.extend(artifacts);
        if let Some(new_text) = text.map(str::trim).filter(|t| !t.is_empty()) {
            self.proof_text = Some(match self.proof_text.take() {
                Some(existing) if !existing.is_empty() => {
                    format!("{existing}{PROOF_TEXT_SEPARATOR}{new_text}")
                }
                _ => new_text.to_owned(),
            });
        }
    }
}

/// Validation records of a task keyed by phase.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseValidations(BTreeMap<PhaseId, PhaseValidation>);

impl PhaseValidations {
    /// Creates an empty set of validation records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `phase`, if proof was ever submitted.
    #[must_use]
    pub fn get(&self, phase: PhaseId) -> Option<&PhaseValidation> {
        self.0.get(&phase)
    }

    /// Returns the status of `phase`, `None` when no record exists.
    #[must_use]
    pub fn status_of(&self, phase: PhaseId) -> PhaseStatus {
        self.get(phase)
            .map_or(PhaseStatus::None, PhaseValidation::status)
    }

    /// Returns `true` when `phase` has artifacts or text attached.
    #[must_use]
    pub fn has_proof(&self, phase: PhaseId) -> bool {
        self.get(phase).is_some_and(PhaseValidation::has_proof)
    }

    /// Returns `true` when any phase other than `excluded` awaits review.
    #[must_use]
    pub fn any_pending_except<'a>(
        &self,
        phases: impl IntoIterator<Item = &'a PhaseId>,
        excluded: PhaseId,
    ) -> bool {
        phases
            .into_iter()
            .filter(|phase| **phase != excluded)
            .any(|phase| self.status_of(*phase) == PhaseStatus::Pending)
    }

    /// Returns the records ordered by phase identifier, which need not match
    /// a configured catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (PhaseId, &PhaseValidation)> {
        self.0.iter().map(|(phase, record)| (*phase, record))
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no proof has been submitted for any phase.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends proof to `phase`, creating the record lazily, and marks it
    /// pending.
    pub(crate) fn record_submission(
        &mut self,
        phase: PhaseId,
        artifacts: Vec<ArtifactRef>,
        text: Option<&str>,
        at: DateTime<Utc>,
    ) {
        let record = self.0.entry(phase).or_default();
        record.append_proof(artifacts, text);
        record.status = PhaseStatus::Pending;
        record.submitted_at = Some(at);
    }

    /// Marks an existing record approved. Returns `false` when absent.
    pub(crate) fn approve(&mut self, phase: PhaseId, at: DateTime<Utc>) -> bool {
        self.0.get_mut(&phase).is_some_and(|record| {
            record.status = PhaseStatus::Approved;
            record.approved_at = Some(at);
            true
        })
    }

    /// Marks an existing record rejected. Returns `false` when absent.
    pub(crate) fn reject(&mut self, phase: PhaseId, at: DateTime<Utc>) -> bool {
        self.0.get_mut(&phase).is_some_and(|record| {
            record.status = PhaseStatus::Rejected;
            record.rejected_at = Some(at);
            true
        })
    }

    /// Detaches `artifact` from `phase`.
    pub(crate) fn remove_artifact(
        &mut self,
        phase: PhaseId,
        artifact: &ArtifactRef,
    ) -> ArtifactRemoval {
        let Some(record) = self.0.get_mut(&phase) else {
            return ArtifactRemoval::NotAttached;
        };
        let before = record.proof_urls.len();
        record.proof_urls.retain(|existing| existing != artifact);
        if record.proof_urls.len() == before {
            return ArtifactRemoval::NotAttached;
        }
        if record.has_proof() {
            return ArtifactRemoval::Detached;
        }
        self.0.remove(&phase);
        ArtifactRemoval::RecordDropped
    }
}

/// Outcome of detaching an artifact from a phase record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArtifactRemoval {
    /// The artifact was not attached to the phase.
    NotAttached,
    /// The artifact was removed; other proof remains.
    Detached,
    /// The last proof was removed and the record dropped.
    RecordDropped,
}
