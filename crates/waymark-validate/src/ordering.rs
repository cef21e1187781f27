//! Step ordering validation
//!
//! Siblings under one parent scope register independently and out of order,
//! so ordering is checked when a caller asks for it:
//! - [`sort_by_order`] answers "can these be iterated" and only fails on
//!   missing orders.
//! - [`validate_ordering`] answers "are these well formed" and reports every
//!   issue without failing.

use crate::error::OrderingError;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// How serious a reported issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory, does not block anything
    Warning,

    /// The structure is broken
    Error,
}

/// Name and optional order of one sibling
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSlot {
    /// Entry name
    pub name: String,

    /// Declared order, if any
    pub order: Option<u32>,
}

impl OrderSlot {
    /// Create slot
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, order: Option<u32>) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

/// One ordering problem within a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderingIssue {
    /// Entries declared without an order
    MissingOrder {
        /// Names lacking an order
        names: Vec<String>,
    },

    /// Several entries share one order value
    DuplicateOrder {
        /// Shared value
        order: u32,
        /// Entries sharing it, in registration order
        names: Vec<String>,
    },

    /// Consecutive orders more than one apart
    OrderGap {
        /// Lower order
        after: u32,
        /// Next order present
        before: u32,
    },

    /// Lowest order is not 1
    StartNotAtOne {
        /// Lowest order present
        first: u32,
    },
}

impl OrderingIssue {
    /// Issue severity
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingOrder { .. } | Self::DuplicateOrder { .. } => Severity::Error,
            Self::OrderGap { .. } | Self::StartNotAtOne { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for OrderingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOrder { names } => write!(f, "missing order: {}", names.join(", ")),
            Self::DuplicateOrder { order, names } => {
                write!(f, "order {order} used by {}", names.join(", "))
            }
            Self::OrderGap { after, before } => write!(f, "gap between {after} and {before}"),
            Self::StartNotAtOne { first } => write!(f, "ordering starts at {first}, not 1"),
        }
    }
}

/// All ordering issues of one scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderingReport {
    /// Parent scope
    pub scope: String,

    /// Issues found, in detection order
    pub issues: Vec<OrderingIssue>,
}

impl OrderingReport {
    /// No error-severity issues
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    /// No issues at all
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Error-severity issues
    pub fn errors(&self) -> impl Iterator<Item = &OrderingIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Error)
    }

    /// Warning-severity issues
    pub fn warnings(&self) -> impl Iterator<Item = &OrderingIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity() == Severity::Warning)
    }

    /// Convert into a result
    ///
    /// Errors always fail; warnings fail only when `strict`.
    ///
    /// # Errors
    /// Returns [`OrderingError::IllFormed`] carrying the offending issues.
    pub fn into_result(self, strict: bool) -> Result<(), OrderingError> {
        let issues: Vec<OrderingIssue> = self
            .issues
            .into_iter()
            .filter(|i| strict || i.severity() == Severity::Error)
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            Err(OrderingError::IllFormed {
                scope: self.scope,
                issues,
            })
        }
    }
}

/// Check one scope's ordering
///
/// 1. Any slot without an order yields a single `MissingOrder` and stops.
/// 2. Otherwise: `DuplicateOrder` per repeated value, `OrderGap` between
///    consecutive unique values more than 1 apart, `StartNotAtOne` when the
///    minimum is not 1.
#[must_use]
pub fn validate_ordering(scope: &str, slots: &[OrderSlot]) -> OrderingReport {
    let mut issues = Vec::new();

    let missing: Vec<String> = slots
        .iter()
        .filter(|s| s.order.is_none())
        .map(|s| s.name.clone())
        .collect();
    if !missing.is_empty() {
        issues.push(OrderingIssue::MissingOrder { names: missing });
        return OrderingReport {
            scope: scope.to_string(),
            issues,
        };
    }

    let mut by_order: IndexMap<u32, Vec<String>> = IndexMap::new();
    for slot in slots {
        if let Some(order) = slot.order {
            by_order.entry(order).or_default().push(slot.name.clone());
        }
    }
    by_order.sort_keys();

    for (order, names) in &by_order {
        if names.len() > 1 {
            issues.push(OrderingIssue::DuplicateOrder {
                order: *order,
                names: names.clone(),
            });
        }
    }

    let unique: Vec<u32> = by_order.keys().copied().collect();
    for pair in unique.windows(2) {
        if pair[1] - pair[0] > 1 {
            issues.push(OrderingIssue::OrderGap {
                after: pair[0],
                before: pair[1],
            });
        }
    }

    if let Some(&first) = unique.first() {
        if first != 1 {
            issues.push(OrderingIssue::StartNotAtOne { first });
        }
    }

    if !issues.is_empty() {
        tracing::debug!(scope, issues = issues.len(), "ordering issues");
    }

    OrderingReport {
        scope: scope.to_string(),
        issues,
    }
}

/// Sort siblings by order, stable for equal orders
///
/// Duplicates and gaps do not fail here; see [`validate_ordering`].
///
/// # Errors
/// Returns [`OrderingError::MissingOrder`] naming every sibling without an
/// order.
pub fn sort_by_order<T, O, N>(
    scope: &str,
    mut items: Vec<T>,
    order_of: O,
    name_of: N,
) -> Result<Vec<T>, OrderingError>
where
    O: Fn(&T) -> Option<u32>,
    N: Fn(&T) -> String,
{
    let missing: Vec<String> = items
        .iter()
        .filter(|item| order_of(item).is_none())
        .map(&name_of)
        .collect();
    if !missing.is_empty() {
        return Err(OrderingError::MissingOrder {
            scope: scope.to_string(),
            names: missing,
        });
    }

    items.sort_by_key(|item| order_of(item).unwrap_or(u32::MAX));
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(orders: &[Option<u32>]) -> Vec<OrderSlot> {
        orders
            .iter()
            .enumerate()
            .map(|(i, o)| OrderSlot::new(format!("step{i}"), *o))
            .collect()
    }

    fn count(report: &OrderingReport, pred: fn(&OrderingIssue) -> bool) -> usize {
        report.issues.iter().filter(|i| pred(i)).count()
    }

    #[test]
    fn contiguous_ordering_is_clean() {
        let report = validate_ordering("m", &slots(&[Some(2), Some(1), Some(3)]));
        assert!(report.is_clean());
        assert!(report.is_valid());
    }

    #[test]
    fn duplicate_reported_once() {
        let report = validate_ordering("m", &slots(&[Some(1), Some(2), Some(2)]));

        assert_eq!(count(&report, |i| matches!(i, OrderingIssue::DuplicateOrder { .. })), 1);
        assert_eq!(count(&report, |i| matches!(i, OrderingIssue::MissingOrder { .. })), 0);
        assert!(!report.is_valid());
        assert_eq!(
            report.issues[0],
            OrderingIssue::DuplicateOrder {
                order: 2,
                names: vec!["step1".to_string(), "step2".to_string()],
            }
        );
    }

    #[test]
    fn gap_reported_once() {
        let report = validate_ordering("m", &slots(&[Some(1), Some(3)]));

        assert_eq!(report.issues, [OrderingIssue::OrderGap { after: 1, before: 3 }]);
        assert!(report.is_valid());
    }

    #[test]
    fn start_not_at_one() {
        let report = validate_ordering("m", &slots(&[Some(2), Some(3)]));
        assert_eq!(report.issues, [OrderingIssue::StartNotAtOne { first: 2 }]);
    }

    #[test]
    fn missing_order_short_circuits() {
        let report = validate_ordering("m", &slots(&[Some(1), None, Some(1)]));

        assert_eq!(
            report.issues,
            [OrderingIssue::MissingOrder {
                names: vec!["step1".to_string()]
            }]
        );
    }

    #[test]
    fn gaps_use_unique_values() {
        let report = validate_ordering("m", &slots(&[Some(1), Some(1), Some(2)]));
        assert_eq!(count(&report, |i| matches!(i, OrderingIssue::OrderGap { .. })), 0);
    }

    #[test]
    fn empty_scope_is_clean() {
        assert!(validate_ordering("m", &[]).is_clean());
    }

    #[test]
    fn into_result_strictness() {
        let gap = validate_ordering("m", &slots(&[Some(1), Some(3)]));
        assert!(gap.clone().into_result(false).is_ok());
        assert!(matches!(gap.into_result(true), Err(OrderingError::IllFormed { .. })));
    }

    #[test]
    fn sort_tolerates_duplicates_and_gaps() {
        let items = slots(&[Some(5), Some(2), Some(2)]);
        let sorted = sort_by_order("m", items, |s| s.order, |s| s.name.clone()).unwrap();

        let names: Vec<_> = sorted.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["step1", "step2", "step0"]);
    }

    #[test]
    fn sort_fails_on_missing_order() {
        let items = slots(&[Some(1), None]);
        let result = sort_by_order("m", items, |s| s.order, |s| s.name.clone());

        assert_eq!(
            result.unwrap_err(),
            OrderingError::MissingOrder {
                scope: "m".to_string(),
                names: vec!["step1".to_string()],
            }
        );
    }
}
