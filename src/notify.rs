//! Notification message templates.
//!
//! Each [`NotificationKind`] has a default `minijinja` template. Deployments
//! may override any of them from the `[notifications]` table of the engine
//! configuration. Templates see `title` and `reason` in their context.

use crate::task::ports::NotificationKind;
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised while rendering a notification template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to render {kind:?} notification: {reason}")]
pub struct TemplateRenderError {
    /// Kind whose template failed.
    pub kind: NotificationKind,
    /// Renderer diagnostic.
    pub reason: String,
}

/// Values interpolated into a notification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationContext<'a> {
    /// Task title.
    pub title: &'a str,
    /// Free-text reason, when the action carries one.
    pub reason: Option<&'a str>,
}

/// Notification templates keyed by kind, with per-kind overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationTemplates {
    overrides: BTreeMap<NotificationKind, String>,
}

impl NotificationTemplates {
    /// Returns the built-in template for `kind`.
    #[must_use]
    pub const fn default_template(kind: NotificationKind) -> &'static str {
        match kind {
            NotificationKind::TaskAssigned => "New task assigned: {{ title }}",
            NotificationKind::AccessRequested => "Access requested for task: {{ title }}",
            NotificationKind::AccessApproved => "Access approved for task: {{ title }}",
            NotificationKind::TaskClosed => {
                "Task closed by manager: {{ title }}. Reason: {{ reason }}"
            }
            NotificationKind::TaskReassigned => "You have been reassigned task: {{ title }}",
            NotificationKind::TaskReassignedAway => {
                "Task \"{{ title }}\" has been reassigned to another team member."
            }
        }
    }

    /// Replaces the template used for `kind`.
    #[must_use]
    pub fn with_override(mut self, kind: NotificationKind, template: impl Into<String>) -> Self {
        self.overrides.insert(kind, template.into());
        self
    }

    /// Returns the template in effect for `kind`.
    #[must_use]
    pub fn template_for(&self, kind: NotificationKind) -> &str {
        self.overrides
            .get(&kind)
            .map_or_else(|| Self::default_template(kind), String::as_str)
    }

    /// Renders the message for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateRenderError`] when the template is malformed.
    pub fn render(
        &self,
        kind: NotificationKind,
        values: NotificationContext<'_>,
    ) -> Result<String, TemplateRenderError> {
        let environment = Environment::new();
        environment
            .render_str(
                self.template_for(kind),
                context! {
                    title => values.title,
                    reason => values.reason.unwrap_or_default(),
                },
            )
            .map_err(|error| TemplateRenderError {
                kind,
                reason: error.to_string(),
            })
    }

    /// Renders every template once against placeholder values.
    ///
    /// # Errors
    ///
    /// Returns the first [`TemplateRenderError`] encountered.
    pub fn check(&self) -> Result<(), TemplateRenderError> {
        let sample = NotificationContext {
            title: "sample",
            reason: Some("sample"),
        };
        NotificationKind::ALL
            .into_iter()
            .try_for_each(|kind| self.render(kind, sample).map(drop))
    }
}
