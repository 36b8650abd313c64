//! Append-only audit trail recorded for every task mutation.

use super::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single recorded transition.
///
/// Fields are private so a recorded entry cannot be edited after the fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    actor: UserId,
    action: String,
    timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Reconstructs an entry from persisted storage.
    #[must_use]
    pub fn from_persisted(actor: UserId, action: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            actor,
            action: action.into(),
            timestamp,
        }
    }

    /// Returns the acting user.
    #[must_use]
    pub const fn actor(&self) -> &UserId {
        &self.actor
    }

    /// Returns the human-readable description of the change.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns when the change was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Ordered, append-only sequence of [`HistoryEntry`] values for one task.
///
/// The trail never summarises or compacts: there is no API to remove or
/// rewrite entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditTrail(Vec<HistoryEntry>);

impl AuditTrail {
    /// Creates an empty trail.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Reconstructs a trail from persisted entries, preserving their order.
    #[must_use]
    pub const fn from_persisted(entries: Vec<HistoryEntry>) -> Self {
        Self(entries)
    }

    /// Appends an entry stamped with the current clock time.
    pub fn record(&mut self, actor: UserId, action: impl Into<String>, clock: &impl Clock) {
        self.0.push(HistoryEntry {
            actor,
            action: action.into(),
            timestamp: clock.utc(),
        });
    }

    /// Returns the recorded entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.0
    }

    /// Returns the most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.0.last()
    }

    /// Returns the number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Collects field-level changes into a single audit action.
///
/// Rendered as `field: before → after` pairs joined by `, `, for example
/// `status: todo → in_progress, priority: low → high`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldChange {
    field: String,
    rendered: String,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    /// Records `field` when `before` and `after` differ.
    pub fn track<T>(&mut self, field: &str, before: &T, after: &T)
    where
        T: PartialEq + fmt::Display + ?Sized,
    {
        if before != after {
            self.changes.push(FieldChange {
                field: field.to_owned(),
                rendered: format!("{field}: {before} → {after}"),
            });
        }
    }

    /// Records a change to `field` described by free-form text.
    pub fn note(&mut self, field: &str, description: impl Into<String>) {
        self.changes.push(FieldChange {
            field: field.to_owned(),
            rendered: description.into(),
        });
    }

    /// Returns the names of the changed fields in recording order.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        self.changes.iter().map(|change| change.field.clone()).collect()
    }

    /// Returns `true` when nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Renders the audit action text.
    #[must_use]
    pub fn describe(&self) -> String {
        self.changes
            .iter()
            .map(|change| change.rendered.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Formats an optional timestamp for audit text.
#[must_use]
pub fn describe_optional_date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "none".to_owned(), |date| date.to_rfc3339())
}
