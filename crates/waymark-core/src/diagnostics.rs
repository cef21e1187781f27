//! Soft diagnostics channel
//!
//! Problems that must not stop execution (unresolved parents, ordering
//! warnings, detour audit findings) are collected here and mirrored to
//! `tracing`. Repeats of an identical diagnostic are kept once, so lazy
//! resolution retrying on every query does not flood the channel.

use indexmap::IndexSet;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use waymark_registry::ResolveReport;
use waymark_validate::Severity;

/// What a diagnostic is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Lazy resolution could not complete an entry
    UnresolvedParent,

    /// Step ordering issue within one parent
    StepOrdering,

    /// Journey detour audit finding
    DetourGraph,
}

/// One soft diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// Category
    pub kind: DiagnosticKind,

    /// Severity
    pub severity: Severity,

    /// Entry or scope it concerns
    pub subject: String,

    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create warning
    #[must_use]
    pub fn warning(
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create error
    #[must_use]
    pub fn error(
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Bounded, deduplicating diagnostics collector
#[derive(Debug)]
pub struct Diagnostics {
    entries: Mutex<IndexSet<Diagnostic>>,
    capacity: usize,
}

impl Diagnostics {
    /// Create collector keeping at most `capacity` diagnostics
    ///
    /// At least one diagnostic is always held, so a repeat of the latest one
    /// is still recognized.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(IndexSet::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record a diagnostic
    ///
    /// Returns `false` if an identical diagnostic is already held.
    pub fn report(&self, diagnostic: Diagnostic) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains(&diagnostic) {
            return false;
        }

        tracing::warn!(
            kind = ?diagnostic.kind,
            severity = ?diagnostic.severity,
            subject = %diagnostic.subject,
            "{}",
            diagnostic.message
        );

        while entries.len() >= self.capacity {
            entries.shift_remove_index(0);
        }
        entries.insert(diagnostic);
        true
    }

    /// Record every entry a resolution pass left pending
    pub fn report_unresolved(&self, kind: &'static str, report: &ResolveReport) {
        for skipped in &report.skipped {
            self.report(Diagnostic::warning(
                DiagnosticKind::UnresolvedParent,
                &skipped.key,
                format!("{kind} parent '{}': {}", skipped.parent, skipped.reason),
            ));
        }
    }

    /// Held diagnostics, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Remove and return held diagnostics
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.lock()).into_iter().collect()
    }

    /// Number of held diagnostics
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if nothing is held
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything held
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(1024)
    }
}
